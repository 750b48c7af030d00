use crate::engine::core::config::ViewerConfig;
use crate::engine::core::params::{ParamImpact, ViewerParams};
use crate::engine::loading::pack_loader::LoadPack;
use crate::engine::scene::composer::CompositionDirty;
use bevy::prelude::*;

/// Diff the parameter snapshot against the last one seen and schedule work.
///
/// The first run requests the initial pack. Cheap changes (opacity, width
/// within the thick range, glow, mode, cutaway) are picked up by the
/// systems that watch `ViewerParams` directly.
pub fn apply_parameter_changes(
    params: Res<ViewerParams>,
    config: Res<ViewerConfig>,
    mut previous: Local<Option<ViewerParams>>,
    mut dirty: ResMut<CompositionDirty>,
    mut load_requests: EventWriter<LoadPack>,
) {
    if !params.is_changed() {
        return;
    }

    let Some(prev) = previous.as_ref() else {
        load_requests.write(LoadPack {
            tag: params.pack_tag.clone(),
        });
        *previous = Some(params.clone());
        return;
    };

    let impact = ParamImpact::between(prev, &params, config.thin_line_threshold_px);
    if impact.is_empty() {
        return;
    }
    debug!("Parameters changed: {:?}", impact);

    if impact.reload_pack {
        load_requests.write(LoadPack {
            tag: params.pack_tag.clone(),
        });
    }
    dirty.bundles |= impact.recompose_bundles;
    dirty.networks |= impact.recompose_networks;

    *previous = Some(params.clone());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn app() -> App {
        let mut app = App::new();
        app.add_event::<LoadPack>()
            .init_resource::<ViewerConfig>()
            .init_resource::<CompositionDirty>()
            .insert_resource(ViewerParams::for_pack("v0.1"))
            .add_systems(Update, apply_parameter_changes);
        app
    }

    fn drain_loads(app: &mut App) -> Vec<String> {
        app.world_mut()
            .resource_mut::<Events<LoadPack>>()
            .drain()
            .map(|e| e.tag)
            .collect()
    }

    fn set(app: &mut App, name: &str, value: serde_json::Value) {
        let next = app
            .world()
            .resource::<ViewerParams>()
            .with_parameter(name, &value)
            .unwrap();
        app.insert_resource(next);
    }

    #[test]
    fn first_run_requests_initial_pack() {
        let mut app = app();
        app.update();
        assert_eq!(drain_loads(&mut app), vec!["v0.1".to_string()]);
        app.update();
        assert!(drain_loads(&mut app).is_empty());
    }

    #[test]
    fn pack_change_requests_reload() {
        let mut app = app();
        app.update();
        drain_loads(&mut app);

        set(&mut app, "pack", json!("v0.2"));
        app.update();
        assert_eq!(drain_loads(&mut app), vec!["v0.2".to_string()]);
    }

    #[test]
    fn opacity_change_does_not_recompose() {
        let mut app = app();
        app.update();
        *app.world_mut().resource_mut::<CompositionDirty>() = CompositionDirty::default();

        set(&mut app, "bundleOpacity", json!(0.4));
        app.update();
        assert_eq!(*app.world().resource::<CompositionDirty>(), CompositionDirty::default());
    }

    #[test]
    fn thick_threshold_crossing_recomposes_both() {
        let mut app = app();
        app.update();
        *app.world_mut().resource_mut::<CompositionDirty>() = CompositionDirty::default();

        set(&mut app, "lineWidth", json!(4.0));
        app.update();
        let dirty = *app.world().resource::<CompositionDirty>();
        assert!(dirty.bundles && dirty.networks);
    }
}
