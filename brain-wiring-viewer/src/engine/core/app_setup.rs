// Standard library and external crates
use bevy::asset::AssetMetaCheck;
use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::prelude::*;
use bevy::render::view::VisibilitySystems;
use bevy::transform::TransformSystem;
use bevy_common_assets::json::JsonAssetPlugin;

// Crate engine modules
use crate::engine::{
    assets::networks::NetworkCatalog,
    camera::{
        framing::{FrameView, frame_on_normalization, frame_view},
        viewport_camera::{ViewportCamera, camera_controller},
    },
    core::{
        app_state::{AppState, transition_to_running},
        config::ViewerConfig,
        params::ViewerParams,
        window_config::create_window_config,
    },
    loading::{
        anatomy_loader::{handle_pack_events, watch_anatomy_failures},
        catalog_loader::{NetworkCatalogLoader, load_catalog_system, start_catalog_loading},
        fetcher::FetchMailbox,
        pack_loader::{LoadPack, PackEvent, receive_fetch_results, start_pack_load},
        pack_session::PackSession,
        web_source::WebAssetSourcePlugin,
    },
    scene::{
        anatomy::apply_shell_opacity,
        composer::{CompositionDirty, compose_bundles},
        cutaway::apply_cutaway,
        lighting::spawn_lighting,
        network_composer::compose_networks,
        normalization::{SceneNormalization, apply_scene_normalization, spawn_normalized_root},
        wide_line::WideLinePlugin,
    },
    systems::{
        parameters::apply_parameter_changes,
        render_mode::{apply_render_mode_visibility, render_mode_system},
        snapshot::{SnapshotCounter, SnapshotRequest, SnapshotSaved, take_snapshot},
        status_overlay::{spawn_status_overlay, update_status_overlay},
        style::{apply_glow, restyle_primitives},
    },
};

// Crate tools modules
use crate::tools::picking::{
    hit_test::{HoverState, update_hover},
    tooltip::{spawn_tooltip, update_tooltip},
};

// Web RPC
use crate::rpc::web_rpc::WebRpcPlugin;

#[cfg(not(target_arch = "wasm32"))]
use crate::engine::systems::keyboard::handle_keyboard_controls;

const BACKGROUND: Color = Color::srgb(0.02, 0.02, 0.035);

pub fn create_app() -> App {
    let config = ViewerConfig::from_environment();
    let params = ViewerParams::for_pack(&config.initial_pack);

    let mut app = App::new();

    // Asset sources have to exist before the asset server is built.
    app.add_plugins(WebAssetSourcePlugin)
        .add_plugins(create_default_plugins())
        .init_state::<AppState>()
        .add_plugins(WideLinePlugin)
        // Built-in functional network catalogue.
        .add_plugins(JsonAssetPlugin::<NetworkCatalog>::new(&["networks.json"]))
        .add_plugins(WebRpcPlugin)
        .insert_resource(ClearColor(BACKGROUND));

    // Initialise resources early
    app.insert_resource(config)
        .insert_resource(params)
        .init_resource::<PackSession>()
        .init_resource::<FetchMailbox>()
        .init_resource::<SceneNormalization>()
        .init_resource::<CompositionDirty>()
        .init_resource::<NetworkCatalogLoader>()
        .init_resource::<ViewportCamera>()
        .init_resource::<HoverState>()
        .init_resource::<SnapshotCounter>()
        .add_event::<LoadPack>()
        .add_event::<PackEvent>()
        .add_event::<FrameView>()
        .add_event::<SnapshotRequest>()
        .add_event::<SnapshotSaved>();

    app.add_systems(
        Startup,
        (
            setup,
            spawn_lighting,
            spawn_normalized_root,
            start_catalog_loading,
            spawn_status_overlay,
            spawn_tooltip,
        ),
    );

    // Input first, so parameter edits are diffed in the same frame.
    app.add_systems(
        Update,
        (render_mode_system, camera_controller).before(apply_parameter_changes),
    );

    #[cfg(not(target_arch = "wasm32"))]
    {
        app.add_systems(
            Update,
            handle_keyboard_controls.before(apply_parameter_changes),
        );
    }

    // Loading pipeline
    app.add_systems(
        Update,
        (
            apply_parameter_changes,
            start_pack_load,
            receive_fetch_results,
            handle_pack_events,
            watch_anatomy_failures,
            load_catalog_system,
        )
            .chain(),
    );

    // Scene composition and styling
    app.add_systems(
        Update,
        (
            apply_scene_normalization,
            compose_bundles,
            compose_networks,
            apply_render_mode_visibility,
            apply_shell_opacity,
            apply_cutaway,
            restyle_primitives,
            apply_glow,
            frame_on_normalization,
        )
            .chain()
            .after(load_catalog_system),
    );

    app.add_systems(
        Update,
        (take_snapshot, update_status_overlay).after(load_catalog_system),
    );

    app.add_systems(
        Update,
        transition_to_running.run_if(in_state(AppState::Loading)),
    );

    // Runtime interaction - only once a scene exists
    app.add_systems(
        Update,
        (update_hover, update_tooltip)
            .chain()
            .run_if(in_state(AppState::Running)),
    );

    // Framing measures world-space bounds after propagation.
    app.add_systems(
        PostUpdate,
        frame_view
            .after(TransformSystem::TransformPropagate)
            .after(VisibilitySystems::VisibilityPropagate),
    );

    app
}

fn spawn_camera(commands: &mut Commands, orbit: &ViewportCamera) {
    commands.spawn((
        Name::new("Viewport camera"),
        Camera3d::default(),
        Camera {
            hdr: true,
            ..default()
        },
        Tonemapping::TonyMcMapface,
        Projection::Perspective(PerspectiveProjection {
            near: 0.01,
            ..default()
        }),
        Transform::from_translation(orbit.eye()).with_rotation(orbit.rotation()),
    ));
}

// Startup system that only handles basic initialisation
fn setup(mut commands: Commands, orbit: Res<ViewportCamera>, config: Res<ViewerConfig>) {
    info!(
        "Brain wiring viewer starting with pack {} ({})",
        config.initial_pack, config.pack_root_template
    );
    spawn_camera(&mut commands, &orbit);
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    DefaultPlugins.set(window_config).set(asset_config)
}
