//! Shared display frame for anatomy, bundles and networks.
//!
//! A single parent entity carries the uniform scale and translation derived
//! from the anatomy bounds; everything composed for a pack is parented to it.

use crate::engine::assets::bounds::BoundsData;
use bevy::prelude::*;

/// Parent of all pack content.
#[derive(Component, Debug, Default)]
pub struct NormalizedRoot;

/// Uniform scale and centre derived from anatomy bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizationTransform {
    pub center: Vec3,
    pub scale: f32,
}

impl Default for NormalizationTransform {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            scale: 1.0,
        }
    }
}

impl NormalizationTransform {
    /// Write this transform onto a root, replacing whatever it held.
    ///
    /// The translation is pre-multiplied by the scale so the centre lands on
    /// the origin after scaling.
    pub fn apply(&self, root: &mut Transform) {
        *root = Transform::IDENTITY;
        root.scale = Vec3::splat(self.scale);
        root.translation = -self.center * self.scale;
    }

    /// Map a point from the normalized cube back into anatomy-local space.
    pub fn denormalize(&self, point: Vec3) -> Vec3 {
        point / self.scale + self.center
    }

    pub fn to_display(&self, local: Vec3) -> Vec3 {
        (local - self.center) * self.scale
    }
}

/// `scale = 1 / max dimension`, falling back to 1 for a degenerate box.
pub fn compute_normalization(bounds: &BoundsData) -> NormalizationTransform {
    let scale = if bounds.is_degenerate() {
        1.0
    } else {
        1.0 / bounds.max_dimension()
    };
    NormalizationTransform {
        center: bounds.center(),
        scale,
    }
}

/// Normalization of the current pack, `None` until anatomy bounds exist.
#[derive(Resource, Debug, Default, Clone)]
pub struct SceneNormalization {
    pub generation: u64,
    pub transform: Option<NormalizationTransform>,
    pub anatomy_bounds: Option<BoundsData>,
}

impl SceneNormalization {
    /// Drop the transform ahead of a new anatomy.
    pub fn reset(&mut self, generation: u64) {
        self.generation = generation;
        self.transform = None;
        self.anatomy_bounds = None;
    }

    pub fn set_from_bounds(&mut self, generation: u64, bounds: BoundsData) -> NormalizationTransform {
        let transform = compute_normalization(&bounds);
        self.generation = generation;
        self.transform = Some(transform);
        self.anatomy_bounds = Some(bounds);
        transform
    }

    /// Ready for composition at this generation.
    pub fn ready_for(&self, generation: u64) -> Option<NormalizationTransform> {
        (self.generation == generation).then_some(self.transform).flatten()
    }
}

pub fn spawn_normalized_root(mut commands: Commands) {
    commands.spawn((
        Name::new("Normalized root"),
        NormalizedRoot,
        Transform::IDENTITY,
        Visibility::Visible,
    ));
}

/// Apply the current normalization to the root whenever it changes.
///
/// While a new anatomy is being measured the root keeps the previous
/// transform, so content still on display stays in its frame.
pub fn apply_scene_normalization(
    normalization: Res<SceneNormalization>,
    mut roots: Query<&mut Transform, With<NormalizedRoot>>,
) {
    if !normalization.is_changed() {
        return;
    }
    let Some(transform) = normalization.transform else {
        return;
    };
    for mut root in &mut roots {
        transform.apply(&mut root);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bounds() -> BoundsData {
        BoundsData::new(Vec3::new(-10.0, -5.0, -20.0), Vec3::new(10.0, 5.0, 20.0))
    }

    #[test]
    fn scale_is_inverse_of_largest_dimension() {
        let transform = compute_normalization(&sample_bounds());
        assert!((transform.scale - 0.025).abs() < 1e-6);
        assert_eq!(transform.center, Vec3::ZERO);
    }

    #[test]
    fn off_centre_bounds_land_on_origin() {
        let bounds = BoundsData::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(4.0, 2.0, 2.0));
        let transform = compute_normalization(&bounds);
        assert_eq!(transform.center, Vec3::new(2.0, 1.0, 1.0));

        let mut root = Transform::IDENTITY;
        transform.apply(&mut root);
        let centre = root.transform_point(bounds.center());
        assert!(centre.length() < 1e-6);
        let far = root.transform_point(bounds.max);
        assert!((far.x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn degenerate_bounds_fall_back_to_unit_scale() {
        let point = Vec3::new(3.0, 3.0, 3.0);
        let transform = compute_normalization(&BoundsData::new(point, point));
        assert_eq!(transform.scale, 1.0);
        assert_eq!(transform.center, point);
    }

    #[test]
    fn applying_twice_matches_applying_once() {
        let transform = compute_normalization(&BoundsData::new(
            Vec3::new(-3.0, 1.0, 2.0),
            Vec3::new(7.0, 4.0, 9.0),
        ));

        let mut once = Transform::from_xyz(5.0, 5.0, 5.0).with_scale(Vec3::splat(2.0));
        transform.apply(&mut once);

        let mut twice = once;
        transform.apply(&mut twice);

        assert_eq!(once.compute_matrix(), twice.compute_matrix());
    }

    #[test]
    fn denormalize_inverts_display_mapping() {
        let transform = compute_normalization(&sample_bounds());
        let local = Vec3::new(4.0, -2.0, 8.0);
        let back = transform.denormalize(transform.to_display(local));
        assert!((back - local).length() < 1e-5);
    }

    #[test]
    fn stale_generation_is_not_ready() {
        let mut normalization = SceneNormalization::default();
        normalization.set_from_bounds(3, sample_bounds());
        assert!(normalization.ready_for(3).is_some());
        assert!(normalization.ready_for(4).is_none());
        normalization.reset(4);
        assert!(normalization.ready_for(4).is_none());
    }

    #[test]
    fn root_picks_up_new_normalization() {
        let mut app = App::new();
        app.init_resource::<SceneNormalization>()
            .add_systems(Startup, spawn_normalized_root)
            .add_systems(Update, apply_scene_normalization);
        app.update();

        app.world_mut()
            .resource_mut::<SceneNormalization>()
            .set_from_bounds(1, sample_bounds());
        app.update();

        let mut roots = app
            .world_mut()
            .query_filtered::<&Transform, With<NormalizedRoot>>();
        let root = roots.single(app.world()).unwrap();
        assert!((root.scale.x - 0.025).abs() < 1e-6);
        assert_eq!(root.translation, Vec3::ZERO);
    }

    #[test]
    fn reset_keeps_previous_frame_until_new_bounds() {
        let mut app = App::new();
        app.init_resource::<SceneNormalization>()
            .add_systems(Startup, spawn_normalized_root)
            .add_systems(Update, apply_scene_normalization);
        app.update();

        app.world_mut()
            .resource_mut::<SceneNormalization>()
            .set_from_bounds(1, sample_bounds());
        app.update();

        app.world_mut().resource_mut::<SceneNormalization>().reset(2);
        app.update();

        let mut roots = app
            .world_mut()
            .query_filtered::<&Transform, With<NormalizedRoot>>();
        let root = roots.single(app.world()).unwrap();
        assert!((root.scale.x - 0.025).abs() < 1e-6);

        let wider = BoundsData::new(Vec3::ZERO, Vec3::new(100.0, 10.0, 10.0));
        app.world_mut()
            .resource_mut::<SceneNormalization>()
            .set_from_bounds(2, wider);
        app.update();

        let root = roots.single(app.world()).unwrap();
        assert!((root.scale.x - 0.01).abs() < 1e-6);
    }
}
