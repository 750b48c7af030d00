//! Load token, per-asset degradation and status for the active pack.
//!
//! Every load bumps a generation. Results that come back tagged with an
//! older generation are dropped before they touch any state, so a newer
//! request always supersedes an older one.

use super::fetcher::FetchRequest;
use crate::engine::assets::bundle_payload::BundlePayload;
use crate::engine::assets::location::{manifest_path, resolve_asset_url};
use crate::engine::assets::pack_manifest::PackManifest;
use crate::engine::error::PackError;
use bevy::prelude::*;
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PackPhase {
    #[default]
    Idle,
    FetchingManifest,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AnatomyStatus {
    #[default]
    NotRequested,
    /// Manifest has no anatomy; the placeholder shell stands in
    Absent,
    Loading,
    Loaded,
    /// Load failed; the placeholder shell stands in
    Failed(String),
}

/// What happened to a manifest result.
#[derive(Debug)]
pub enum ManifestOutcome {
    Stale,
    Accepted {
        /// The pack tag differs from the one last loaded
        tag_changed: bool,
        requests: Vec<FetchRequest>,
    },
    Failed(PackError),
}

#[derive(Resource, Debug, Default)]
pub struct PackSession {
    generation: u64,
    tag: String,
    pack_root: String,
    phase: PackPhase,
    manifest: Option<PackManifest>,
    manifest_generation: u64,
    loaded_tag: Option<String>,
    loaded_root: Option<String>,
    payloads: BTreeMap<String, BundlePayload>,
    pending_payloads: BTreeSet<String>,
    failed_payloads: BTreeMap<String, String>,
    anatomy: AnatomyStatus,
}

impl PackSession {
    /// Start a load for `tag`; returns the new generation and the manifest request.
    pub fn begin(&mut self, tag: &str, pack_root: &str) -> (u64, FetchRequest) {
        self.generation += 1;
        self.tag = tag.to_string();
        self.pack_root = pack_root.to_string();
        self.phase = PackPhase::FetchingManifest;
        self.pending_payloads.clear();

        (
            self.generation,
            FetchRequest::Manifest {
                path: manifest_path(pack_root),
            },
        )
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn pack_root(&self) -> &str {
        &self.pack_root
    }

    /// Root of the manifest on display. Differs from `pack_root` while a
    /// newer load is in flight or after it failed.
    pub fn loaded_root(&self) -> &str {
        self.loaded_root.as_deref().unwrap_or(&self.pack_root)
    }

    pub fn phase(&self) -> &PackPhase {
        &self.phase
    }

    /// Manifest currently on display; survives a failed reload.
    pub fn manifest(&self) -> Option<&PackManifest> {
        self.manifest.as_ref()
    }

    /// Generation that produced the manifest on display.
    pub fn manifest_generation(&self) -> u64 {
        self.manifest_generation
    }

    pub fn payload(&self, bundle_id: &str) -> Option<&BundlePayload> {
        self.payloads.get(bundle_id)
    }

    pub fn payloads(&self) -> &BTreeMap<String, BundlePayload> {
        &self.payloads
    }

    pub fn anatomy(&self) -> &AnatomyStatus {
        &self.anatomy
    }

    pub fn on_manifest(
        &mut self,
        generation: u64,
        result: Result<PackManifest, PackError>,
    ) -> ManifestOutcome {
        if !self.is_current(generation) {
            return ManifestOutcome::Stale;
        }

        let manifest = match result {
            Ok(manifest) => manifest,
            Err(err) => {
                self.phase = PackPhase::Failed(err.to_string());
                return ManifestOutcome::Failed(err);
            }
        };

        let requests: Vec<FetchRequest> = manifest
            .bundles
            .iter()
            .filter_map(|bundle| {
                bundle.sources.wire_url().map(|wire| FetchRequest::BundlePayload {
                    bundle_id: bundle.id.clone(),
                    path: resolve_asset_url(&self.pack_root, wire),
                })
            })
            .collect();

        let tag_changed = self.loaded_tag.as_deref() != Some(self.tag.as_str());

        self.pending_payloads = requests
            .iter()
            .filter_map(|request| match request {
                FetchRequest::BundlePayload { bundle_id, .. } => Some(bundle_id.clone()),
                FetchRequest::Manifest { .. } => None,
            })
            .collect();
        self.payloads.clear();
        self.failed_payloads.clear();
        self.anatomy = if manifest.anatomy.is_some() {
            AnatomyStatus::Loading
        } else {
            AnatomyStatus::Absent
        };
        self.loaded_tag = Some(self.tag.clone());
        self.loaded_root = Some(self.pack_root.clone());
        self.manifest = Some(manifest);
        self.manifest_generation = generation;
        self.phase = PackPhase::Ready;

        ManifestOutcome::Accepted {
            tag_changed,
            requests,
        }
    }

    /// Record a payload result. Returns false for stale results.
    pub fn on_bundle_payload(
        &mut self,
        generation: u64,
        bundle_id: &str,
        result: Result<BundlePayload, PackError>,
    ) -> bool {
        if !self.is_current(generation) || generation != self.manifest_generation {
            return false;
        }
        self.pending_payloads.remove(bundle_id);
        match result {
            Ok(payload) => {
                self.payloads.insert(bundle_id.to_string(), payload);
            }
            Err(err) => {
                self.failed_payloads
                    .insert(bundle_id.to_string(), err.to_string());
            }
        }
        true
    }

    /// Record the anatomy outcome. Returns false for stale results.
    pub fn on_anatomy(&mut self, generation: u64, status: AnatomyStatus) -> bool {
        if generation != self.manifest_generation {
            return false;
        }
        self.anatomy = status;
        true
    }

    /// Mark the anatomy as replaced by the placeholder when no manifest ever arrived.
    pub fn on_placeholder_only(&mut self) {
        if self.manifest.is_none() {
            self.anatomy = AnatomyStatus::Absent;
        }
    }

    pub fn failed_payloads(&self) -> &BTreeMap<String, String> {
        &self.failed_payloads
    }

    pub fn status_text(&self) -> String {
        match &self.phase {
            PackPhase::Idle => "No pack loaded".to_string(),
            PackPhase::FetchingManifest => format!("Loading pack {}...", self.tag),
            PackPhase::Failed(reason) => match (&self.manifest, &self.loaded_tag) {
                (Some(_), Some(shown)) => {
                    format!("Pack {} failed: {reason}. Still showing {shown}", self.tag)
                }
                _ => format!(
                    "Pack {} failed: {reason}. {}",
                    self.tag,
                    self.anatomy_text()
                ),
            },
            PackPhase::Ready => self.ready_text(),
        }
    }

    fn ready_text(&self) -> String {
        let Some(manifest) = &self.manifest else {
            return format!("Pack {}", self.tag);
        };

        let version = manifest.version.as_deref().unwrap_or(self.tag.as_str());
        let count = manifest.bundles.len();
        let mut parts = vec![
            format!("Pack {} (version {version})", self.tag),
            format!("{count} bundle{}", if count == 1 { "" } else { "s" }),
            self.anatomy_text(),
        ];
        if !self.pending_payloads.is_empty() {
            parts.push(format!("loading {} wiring payloads", self.pending_payloads.len()));
        }
        if !self.failed_payloads.is_empty() {
            let ids: Vec<&str> = self.failed_payloads.keys().map(String::as_str).collect();
            parts.push(format!("wiring failed for {}", ids.join(", ")));
        }
        parts.join(" | ")
    }

    fn anatomy_text(&self) -> String {
        match &self.anatomy {
            AnatomyStatus::NotRequested | AnatomyStatus::Absent => {
                "no anatomy (placeholder shell)".to_string()
            }
            AnatomyStatus::Loading => "loading anatomy".to_string(),
            AnatomyStatus::Loaded => {
                let name = self
                    .manifest
                    .as_ref()
                    .and_then(|m| m.anatomy.as_ref())
                    .map(|a| a.name.clone().unwrap_or_else(|| a.url.clone()))
                    .unwrap_or_default();
                format!("anatomy: {name}")
            }
            AnatomyStatus::Failed(reason) => {
                format!("anatomy failed ({reason}), placeholder shell shown")
            }
        }
    }

    /// Summary served to embedding pages.
    pub fn pack_info(&self) -> Value {
        let manifest = self.manifest.as_ref();
        json!({
            "tag": self.tag,
            "loadedTag": self.loaded_tag,
            "packRoot": self.loaded_root(),
            "generation": self.generation,
            "status": self.status_text(),
            "version": manifest.and_then(|m| m.version.clone()),
            "citation": manifest.and_then(|m| m.citation.clone()),
            "notes": manifest.and_then(|m| m.notes.clone()),
            "wiringSpace": manifest.map(|m| m.wiring_space.as_str()),
            "anatomy": manifest.and_then(|m| m.anatomy.as_ref()).map(|a| a.url.clone()),
            "bundles": manifest
                .map(|m| {
                    m.bundles
                        .iter()
                        .map(|b| json!({ "id": b.id, "name": b.name }))
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default(),
        })
    }
}
