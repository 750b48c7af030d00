//! Cheap style updates on existing primitives: opacity, stroke width, glow.

use crate::engine::core::config::ViewerConfig;
use crate::engine::core::params::{ParamImpact, ViewerParams};
use crate::engine::scene::lines::{LinePrimitive, LineRole, set_line_glow, wide_glow};
use crate::engine::scene::network_composer::{NodePrimitive, set_node_glow};
use crate::engine::scene::wide_line::WideLineMaterial;
use bevy::core_pipeline::bloom::Bloom;
use bevy::prelude::*;

fn line_opacity(params: &ViewerParams, role: LineRole) -> f32 {
    match role {
        LineRole::Bundle => params.bundle_opacity,
        LineRole::Network => params.functional_opacity,
    }
}

/// Push opacity, width and glow into line and node materials.
pub fn restyle_primitives(
    params: Res<ViewerParams>,
    config: Res<ViewerConfig>,
    mut previous: Local<Option<ViewerParams>>,
    hairlines: Query<(&LinePrimitive, &MeshMaterial3d<StandardMaterial>)>,
    wide_lines: Query<(&LinePrimitive, &MeshMaterial3d<WideLineMaterial>)>,
    nodes: Query<(&NodePrimitive, &MeshMaterial3d<StandardMaterial>)>,
    mut standard: ResMut<Assets<StandardMaterial>>,
    mut wide: ResMut<Assets<WideLineMaterial>>,
) {
    if !params.is_changed() {
        return;
    }
    let restyle = previous
        .as_ref()
        .is_some_and(|prev| ParamImpact::between(prev, &params, config.thin_line_threshold_px).restyle);
    *previous = Some(params.clone());
    if !restyle {
        return;
    }

    for (line, handle) in &hairlines {
        if let Some(material) = standard.get_mut(&handle.0) {
            material.base_color = line.color.with_alpha(line_opacity(&params, line.role));
            set_line_glow(material, line.color, params.glow);
        }
    }
    for (line, handle) in &wide_lines {
        if let Some(material) = wide.get_mut(&handle.0) {
            material.line.opacity = line_opacity(&params, line.role);
            material.line.width = params.line_width_px;
            material.line.glow = wide_glow(params.glow);
        }
    }
    for (node, handle) in &nodes {
        if let Some(material) = standard.get_mut(&handle.0) {
            material.base_color = node.color.with_alpha(params.functional_opacity);
            set_node_glow(material, node.color, params.glow);
        }
    }
}

/// Bloom on the camera follows the glow toggle.
pub fn apply_glow(
    params: Res<ViewerParams>,
    cameras: Query<(Entity, Has<Bloom>), With<Camera3d>>,
    mut commands: Commands,
) {
    if !params.is_changed() {
        return;
    }
    for (camera, has_bloom) in &cameras {
        match (params.glow, has_bloom) {
            (true, false) => {
                commands.entity(camera).insert(Bloom::NATURAL);
            }
            (false, true) => {
                commands.entity(camera).remove::<Bloom>();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scene::lines::{LineKind, hairline_material};
    use serde_json::json;

    #[test]
    fn opacity_change_reaches_bundle_lines_only() {
        let mut app = App::new();
        app.init_resource::<ViewerConfig>()
            .insert_resource(ViewerParams::default())
            .init_resource::<Assets<StandardMaterial>>()
            .init_resource::<Assets<WideLineMaterial>>()
            .add_systems(Update, restyle_primitives);

        let color = Color::srgb(1.0, 0.5, 0.0);
        let (bundle_handle, network_handle) = {
            let mut materials = app.world_mut().resource_mut::<Assets<StandardMaterial>>();
            (
                materials.add(hairline_material(color, 0.9, false)),
                materials.add(hairline_material(color, 0.85, false)),
            )
        };
        app.world_mut().spawn((
            LinePrimitive { kind: LineKind::Hairline, role: LineRole::Bundle, color },
            MeshMaterial3d(bundle_handle.clone()),
        ));
        app.world_mut().spawn((
            LinePrimitive { kind: LineKind::Hairline, role: LineRole::Network, color },
            MeshMaterial3d(network_handle.clone()),
        ));
        app.update();

        let next = app
            .world()
            .resource::<ViewerParams>()
            .with_parameter("bundleOpacity", &json!(0.3))
            .unwrap();
        app.insert_resource(next);
        app.update();

        let materials = app.world().resource::<Assets<StandardMaterial>>();
        assert!((materials.get(&bundle_handle).unwrap().base_color.alpha() - 0.3).abs() < 1e-6);
        assert!((materials.get(&network_handle).unwrap().base_color.alpha() - 0.85).abs() < 1e-6);
    }

    #[test]
    fn glow_toggles_bloom() {
        let mut app = App::new();
        app.insert_resource(ViewerParams::default())
            .add_systems(Update, apply_glow);
        let camera = app.world_mut().spawn(Camera3d::default()).id();
        app.update();
        assert!(app.world().get::<Bloom>(camera).is_none());

        let next = app.world().resource::<ViewerParams>().with_parameter("glow", &json!(true)).unwrap();
        app.insert_resource(next);
        app.update();
        assert!(app.world().get::<Bloom>(camera).is_some());
    }
}
