use super::hit_test::HoverState;
use bevy::prelude::*;
use constants::render_settings::TOOLTIP_OFFSET_PX;

#[derive(Component)]
pub struct Tooltip;

pub fn spawn_tooltip(mut commands: Commands) {
    commands.spawn((
        Name::new("Tooltip"),
        Tooltip,
        Text::new(""),
        TextFont {
            font_size: 14.0,
            ..default()
        },
        TextColor(Color::srgb(0.95, 0.95, 0.95)),
        BackgroundColor(Color::srgba(0.05, 0.05, 0.08, 0.85)),
        Node {
            position_type: PositionType::Absolute,
            padding: UiRect::axes(Val::Px(6.0), Val::Px(3.0)),
            display: Display::None,
            ..default()
        },
        GlobalZIndex(10),
    ));
}

/// Follow the pointer while a label is hovered; hide otherwise.
pub fn update_tooltip(
    hover: Res<HoverState>,
    mut tooltips: Query<(&mut Text, &mut Node), With<Tooltip>>,
) {
    if !hover.is_changed() {
        return;
    }
    for (mut text, mut node) in &mut tooltips {
        match (&hover.label, hover.pointer) {
            (Some(label), Some(pointer)) => {
                text.0.clone_from(label);
                node.left = Val::Px(pointer.x + TOOLTIP_OFFSET_PX);
                node.top = Val::Px(pointer.y + TOOLTIP_OFFSET_PX);
                node.display = Display::Flex;
            }
            _ => node.display = Display::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        let mut app = App::new();
        app.init_resource::<HoverState>()
            .add_systems(Startup, spawn_tooltip)
            .add_systems(Update, update_tooltip);
        app
    }

    fn tooltip(app: &mut App) -> (String, Node) {
        let mut query = app.world_mut().query_filtered::<(&Text, &Node), With<Tooltip>>();
        let (text, node) = query.single(app.world()).unwrap();
        (text.0.clone(), node.clone())
    }

    #[test]
    fn shows_label_offset_from_pointer() {
        let mut app = app();
        app.update();
        *app.world_mut().resource_mut::<HoverState>() = HoverState {
            label: Some("Arcuate fasciculus".into()),
            pointer: Some(Vec2::new(100.0, 50.0)),
        };
        app.update();

        let (text, node) = tooltip(&mut app);
        assert_eq!(text, "Arcuate fasciculus");
        assert_eq!(node.display, Display::Flex);
        assert_eq!(node.left, Val::Px(100.0 + TOOLTIP_OFFSET_PX));
        assert_eq!(node.top, Val::Px(50.0 + TOOLTIP_OFFSET_PX));
    }

    #[test]
    fn hides_without_label() {
        let mut app = app();
        app.update();
        *app.world_mut().resource_mut::<HoverState>() = HoverState {
            label: None,
            pointer: Some(Vec2::new(10.0, 10.0)),
        };
        app.update();
        assert_eq!(tooltip(&mut app).1.display, Display::None);
    }
}
