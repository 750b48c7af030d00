use crate::engine::scene::normalization::SceneNormalization;
use bevy::prelude::*;

/// `Loading` until the first normalization (real anatomy or placeholder)
/// is in place; interaction systems run only in `Running`.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum AppState {
    #[default]
    Loading,
    Running,
}

pub fn transition_to_running(
    normalization: Res<SceneNormalization>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    if normalization.transform.is_some() {
        info!("Scene normalized, transitioning to Running state");
        next_state.set(AppState::Running);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::assets::bounds::BoundsData;
    use bevy::state::app::StatesPlugin;

    #[test]
    fn stays_loading_until_normalized() {
        let mut app = App::new();
        app.add_plugins(StatesPlugin)
            .init_state::<AppState>()
            .init_resource::<SceneNormalization>()
            .add_systems(Update, transition_to_running.run_if(in_state(AppState::Loading)));

        app.update();
        app.update();
        assert_eq!(*app.world().resource::<State<AppState>>().get(), AppState::Loading);

        let bounds = BoundsData::new(Vec3::splat(-10.0), Vec3::splat(10.0));
        app.world_mut().resource_mut::<SceneNormalization>().set_from_bounds(1, bounds);
        app.update();
        app.update();
        assert_eq!(*app.world().resource::<State<AppState>>().get(), AppState::Running);
    }
}
