use crate::engine::loading::pack_session::PackSession;
use bevy::prelude::*;

#[derive(Component)]
pub struct StatusText;

/// Status line plus the pack's citation and notes, when present.
pub fn overlay_text(session: &PackSession) -> String {
    let mut lines = vec![session.status_text()];
    if let Some(manifest) = session.manifest() {
        lines.extend(manifest.citation.iter().map(|c| format!("Citation: {c}")));
        lines.extend(manifest.notes.iter().cloned());
    }
    lines.join("\n")
}

pub fn spawn_status_overlay(mut commands: Commands) {
    commands
        .spawn((
            Name::new("Status overlay"),
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                ..default()
            },
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("Loading..."),
                TextFont {
                    font_size: 14.0,
                    ..default()
                },
                TextColor(Color::srgb(0.85, 0.85, 0.85)),
                Node {
                    position_type: PositionType::Absolute,
                    bottom: Val::Px(12.0),
                    left: Val::Px(12.0),
                    max_width: Val::Percent(60.0),
                    ..default()
                },
                StatusText,
            ));
        });
}

pub fn update_status_overlay(
    session: Res<PackSession>,
    mut query: Query<&mut Text, With<StatusText>>,
) {
    if !session.is_changed() {
        return;
    }
    let text = overlay_text(&session);
    for mut status in &mut query {
        if status.0 != text {
            status.0.clone_from(&text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::assets::pack_manifest::decode_manifest;

    #[test]
    fn overlay_carries_citation_and_notes() {
        let mut session = PackSession::default();
        let (generation, _) = session.begin("v0.1", "packs/v0.1");
        let manifest = decode_manifest(
            r#"{"version":"2024.1","citation":"Example et al.","notes":"Demo only","assets":{}}"#,
            "packs/v0.1/manifest.json",
        )
        .unwrap();
        session.on_manifest(generation, Ok(manifest));

        let text = overlay_text(&session);
        assert!(text.starts_with(&session.status_text()));
        assert!(text.contains("Citation: Example et al."));
        assert!(text.ends_with("Demo only"));
    }
}
