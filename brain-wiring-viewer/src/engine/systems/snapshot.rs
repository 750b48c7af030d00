use crate::engine::core::params::ViewerParams;
use bevy::prelude::*;
use bevy::render::view::screenshot::{Screenshot, ScreenshotCaptured, save_to_disk};
use constants::path::SNAPSHOT_FILE_PREFIX;

/// Request a still image of the next rendered frame.
#[derive(Event, Debug, Default, Clone, Copy)]
pub struct SnapshotRequest;

/// Emitted once a captured frame has been written to `path`.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct SnapshotSaved {
    pub path: String,
}

#[derive(Resource, Debug, Default)]
pub struct SnapshotCounter(pub u32);

/// `wiring-<tag>-<n>.png`, with anything unsafe in a file name replaced.
pub fn snapshot_file_name(tag: &str, index: u32) -> String {
    let tag: String = tag
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    format!("{SNAPSHOT_FILE_PREFIX}-{tag}-{index}.png")
}

pub fn take_snapshot(
    mut requests: EventReader<SnapshotRequest>,
    mut counter: ResMut<SnapshotCounter>,
    params: Res<ViewerParams>,
    mut commands: Commands,
) {
    if requests.is_empty() {
        return;
    }
    requests.clear();

    counter.0 += 1;
    let path = snapshot_file_name(&params.pack_tag, counter.0);
    info!("Snapshot queued as {}", path);
    commands
        .spawn(Screenshot::primary_window())
        .observe(save_and_announce(path.clone(), save_to_disk(path)));
}

/// Observer that writes the captured frame with `save`, then reports it.
pub fn save_and_announce(
    path: String,
    mut save: impl FnMut(Trigger<ScreenshotCaptured>) + Send + Sync + 'static,
) -> impl FnMut(Trigger<ScreenshotCaptured>, EventWriter<SnapshotSaved>) + Send + Sync + 'static {
    move |trigger, mut saved| {
        save(trigger);
        info!("Snapshot saved to {}", path);
        saved.write(SnapshotSaved { path: path.clone() });
    }
}
