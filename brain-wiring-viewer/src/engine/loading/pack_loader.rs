//! ECS side of pack loading: issue requests, drain results, fan out events.

use super::fetcher::{FetchMailbox, FetchRequest, FetchedAsset, cache_nonce, request_url, spawn_fetch};
use super::pack_session::{ManifestOutcome, PackSession};
use crate::engine::assets::location::pack_root;
use crate::engine::core::config::ViewerConfig;
use crate::engine::core::params::ViewerParams;
use crate::engine::scene::composer::CompositionDirty;
use bevy::prelude::*;

/// Request to (re)load a pack by tag.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct LoadPack {
    pub tag: String,
}

/// Manifest outcome for the current generation.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub enum PackEvent {
    ManifestAccepted {
        generation: u64,
        tag: String,
        bundle_count: usize,
    },
    ManifestFailed {
        generation: u64,
        tag: String,
        reason: String,
    },
}

pub fn issue_request(
    mailbox: &FetchMailbox,
    config: &ViewerConfig,
    generation: u64,
    request: FetchRequest,
) {
    let path = match &request {
        FetchRequest::Manifest { path } | FetchRequest::BundlePayload { path, .. } => path.clone(),
    };
    let url = request_url(&path, config.cache_bust, cache_nonce(generation));
    debug!("Requesting {} (generation {})", url, generation);
    spawn_fetch(mailbox, generation, request, url);
}

/// Start the most recent load request; earlier ones in the same frame are superseded.
pub fn start_pack_load(
    mut requests: EventReader<LoadPack>,
    mut session: ResMut<PackSession>,
    config: Res<ViewerConfig>,
    mailbox: Res<FetchMailbox>,
) {
    let Some(request) = requests.read().last() else {
        return;
    };

    let root = pack_root(&config.pack_root_template, &request.tag);
    let (generation, manifest_request) = session.begin(&request.tag, &root);
    info!(
        "Loading pack {} from {} (generation {})",
        request.tag, root, generation
    );
    issue_request(&mailbox, &config, generation, manifest_request);
}

/// Apply finished requests to the session and schedule follow-up work.
pub fn receive_fetch_results(
    mailbox: Res<FetchMailbox>,
    config: Res<ViewerConfig>,
    mut session: ResMut<PackSession>,
    mut params: ResMut<ViewerParams>,
    mut dirty: ResMut<CompositionDirty>,
    mut pack_events: EventWriter<PackEvent>,
) {
    for outcome in mailbox.drain() {
        let generation = outcome.generation;
        match outcome.asset {
            FetchedAsset::Manifest(result) => match session.on_manifest(generation, result) {
                ManifestOutcome::Stale => {
                    info!(
                        "Discarding stale manifest {} (generation {}, current {})",
                        outcome.url,
                        generation,
                        session.generation()
                    );
                }
                ManifestOutcome::Accepted {
                    tag_changed,
                    requests,
                } => {
                    let tag = session.tag().to_string();
                    let Some(manifest) = session.manifest() else {
                        continue;
                    };
                    info!(
                        "Manifest for pack {} loaded: version {}, {} bundles",
                        tag,
                        manifest.version.as_deref().unwrap_or("unversioned"),
                        manifest.bundles.len()
                    );
                    if manifest.wiring_space_assumed {
                        warn!("Pack {} does not declare wiringSpace; assuming world_mm", tag);
                    }
                    for inconsistency in &manifest.inconsistencies {
                        warn!("Pack {}: {}", tag, inconsistency);
                    }

                    if tag_changed {
                        let next = params.with_enabled_bundles(manifest.bundle_ids());
                        if *params != next {
                            *params = next;
                        }
                    }

                    let bundle_count = manifest.bundles.len();
                    for request in requests {
                        issue_request(&mailbox, &config, generation, request);
                    }

                    dirty.bundles = true;
                    pack_events.write(PackEvent::ManifestAccepted {
                        generation,
                        tag,
                        bundle_count,
                    });
                }
                ManifestOutcome::Failed(err) => {
                    error!("Pack {} failed to load: {}", session.tag(), err);
                    pack_events.write(PackEvent::ManifestFailed {
                        generation,
                        tag: session.tag().to_string(),
                        reason: err.to_string(),
                    });
                }
            },
            FetchedAsset::BundlePayload { bundle_id, result } => {
                if let Err(err) = &result {
                    warn!("Wiring for bundle {} unavailable: {}", bundle_id, err);
                }
                if session.on_bundle_payload(generation, &bundle_id, result) {
                    dirty.bundles = true;
                } else {
                    info!(
                        "Discarding stale payload for {} (generation {})",
                        bundle_id, generation
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::assets::pack_manifest::decode_manifest;
    use crate::engine::error::PackError;
    use crate::engine::loading::fetcher::FetchOutcome;

    fn test_app() -> App {
        let mut app = App::new();
        app.add_event::<LoadPack>()
            .add_event::<PackEvent>()
            .init_resource::<PackSession>()
            .init_resource::<FetchMailbox>()
            .init_resource::<CompositionDirty>()
            .insert_resource(ViewerConfig::default())
            .insert_resource(ViewerParams::default())
            .add_systems(Update, receive_fetch_results);
        app
    }

    fn post_manifest(app: &mut App, generation: u64, text: &str) {
        let manifest = decode_manifest(text, "packs/v0.1/manifest.json").map_err(PackError::from);
        app.world()
            .resource::<FetchMailbox>()
            .post(FetchOutcome {
                generation,
                url: "packs/v0.1/manifest.json".to_string(),
                asset: FetchedAsset::Manifest(manifest),
            });
    }

    #[test]
    fn new_tag_enables_every_bundle() {
        let mut app = test_app();
        let (generation, _) = app
            .world_mut()
            .resource_mut::<PackSession>()
            .begin("v0.1", "packs/v0.1");

        post_manifest(
            &mut app,
            generation,
            r#"{"assets":{"wiringSpace":"world_mm","bundles":[
                {"id":"AF","name":"Arcuate fasciculus"},
                {"id":"CST","name":"Corticospinal tract"}]}}"#,
        );
        app.update();

        let params = app.world().resource::<ViewerParams>();
        assert_eq!(params.enabled_bundles.len(), 2);
        assert!(app.world().resource::<CompositionDirty>().bundles);

        let events = app.world().resource::<Events<PackEvent>>();
        let mut reader = events.get_cursor();
        let sent: Vec<_> = reader.read(events).cloned().collect();
        assert_eq!(
            sent,
            vec![PackEvent::ManifestAccepted {
                generation,
                tag: "v0.1".to_string(),
                bundle_count: 2,
            }]
        );
    }

    #[test]
    fn stale_manifest_changes_nothing() {
        let mut app = test_app();
        let (stale, _) = app
            .world_mut()
            .resource_mut::<PackSession>()
            .begin("v0.1", "packs/v0.1");
        app.world_mut()
            .resource_mut::<PackSession>()
            .begin("v0.2", "packs/v0.2");

        post_manifest(
            &mut app,
            stale,
            r#"{"assets":{"bundles":[{"id":"AF","name":"Arcuate fasciculus"}]}}"#,
        );
        app.update();

        assert!(app.world().resource::<PackSession>().manifest().is_none());
        assert!(app.world().resource::<ViewerParams>().enabled_bundles.is_empty());
        assert!(!app.world().resource::<CompositionDirty>().bundles);
    }
}
