use crate::engine::error::{DataInconsistencyError, LoadError};
use bevy::prelude::*;
use serde::Deserialize;
use std::collections::HashSet;

/// Anatomy mesh reference from the manifest.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnatomyAsset {
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Coordinate convention of wiring payloads in a pack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WiringSpace {
    /// RAS millimetre world space, independent of anatomy mesh units
    #[default]
    WorldMm,
    /// Pre-normalized display cube, [-0.5, 0.5] on every axis
    Normalized,
}

impl WiringSpace {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "world_mm" => Some(Self::WorldMm),
            "normalized" => Some(Self::Normalized),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WorldMm => "world_mm",
            Self::Normalized => "normalized",
        }
    }
}

/// Representations a bundle provides, resolved once from current or legacy fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleSources {
    Surface { mesh_url: String },
    Wiring { wire_url: String },
    SurfaceAndWiring { mesh_url: String, wire_url: String },
    Empty,
}

impl BundleSources {
    pub fn mesh_url(&self) -> Option<&str> {
        match self {
            Self::Surface { mesh_url } | Self::SurfaceAndWiring { mesh_url, .. } => Some(mesh_url),
            _ => None,
        }
    }

    pub fn wire_url(&self) -> Option<&str> {
        match self {
            Self::Wiring { wire_url } | Self::SurfaceAndWiring { wire_url, .. } => Some(wire_url),
            _ => None,
        }
    }

    fn from_parts(mesh_url: Option<String>, wire_url: Option<String>) -> Self {
        match (mesh_url, wire_url) {
            (Some(mesh_url), Some(wire_url)) => Self::SurfaceAndWiring { mesh_url, wire_url },
            (Some(mesh_url), None) => Self::Surface { mesh_url },
            (None, Some(wire_url)) => Self::Wiring { wire_url },
            (None, None) => Self::Empty,
        }
    }
}

/// Canonical tract bundle definition.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleDefinition {
    /// Stable key for enable state and tooltip resolution
    pub id: String,
    /// Human-readable label attached to every derived primitive
    pub name: String,
    pub color: Color,
    pub sources: BundleSources,
}

/// Decoded pack manifest with all legacy shapes resolved.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PackManifest {
    pub version: Option<String>,
    pub citation: Option<String>,
    pub notes: Option<String>,
    pub anatomy: Option<AnatomyAsset>,
    pub bundles: Vec<BundleDefinition>,
    pub wiring_space: WiringSpace,
    /// True when `wiringSpace` was missing and `world_mm` was assumed
    pub wiring_space_assumed: bool,
    pub inconsistencies: Vec<DataInconsistencyError>,
}

impl PackManifest {
    pub fn bundle_ids(&self) -> impl Iterator<Item = &str> {
        self.bundles.iter().map(|b| b.id.as_str())
    }

    pub fn get_bundle(&self, id: &str) -> Option<&BundleDefinition> {
        self.bundles.iter().find(|b| b.id == id)
    }
}

#[derive(Deserialize)]
struct RawManifest {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    citation: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    assets: RawAssets,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawAssets {
    #[serde(default)]
    anatomy: Option<AnatomyAsset>,
    #[serde(default)]
    bundles: Option<Vec<RawBundleEntry>>,
    #[serde(default)]
    wiring_space: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBundleEntry {
    id: String,
    name: String,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    mesh_url: Option<String>,
    #[serde(default)]
    wire_url: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

/// Fallback colours for bundles without an explicit colour.
const BUNDLE_PALETTE: [(f32, f32, f32); 6] = [
    (0.95, 0.55, 0.20),
    (0.25, 0.65, 0.95),
    (0.40, 0.85, 0.45),
    (0.90, 0.35, 0.60),
    (0.85, 0.80, 0.30),
    (0.60, 0.45, 0.90),
];

fn palette_color(index: usize) -> Color {
    let (r, g, b) = BUNDLE_PALETTE[index % BUNDLE_PALETTE.len()];
    Color::srgb(r, g, b)
}

/// Parse a `#rrggbb` style colour. `None` for anything unparseable.
pub fn parse_color(value: &str) -> Option<Color> {
    Srgba::hex(value.trim()).ok().map(Color::from)
}

/// Decode manifest JSON fetched from `url`.
pub fn decode_manifest(text: &str, url: &str) -> Result<PackManifest, LoadError> {
    let raw: RawManifest = serde_json::from_str(text).map_err(|e| LoadError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let (wiring_space, wiring_space_assumed) = match raw.assets.wiring_space.as_deref() {
        None => (WiringSpace::WorldMm, true),
        Some(value) => {
            let space = WiringSpace::parse(value).ok_or_else(|| LoadError::Decode {
                url: url.to_string(),
                reason: format!("unknown wiringSpace '{value}'"),
            })?;
            (space, false)
        }
    };

    let mut seen = HashSet::new();
    let mut bundles = Vec::new();
    let mut inconsistencies = Vec::new();

    for (index, entry) in raw.assets.bundles.unwrap_or_default().into_iter().enumerate() {
        if !seen.insert(entry.id.clone()) {
            inconsistencies.push(DataInconsistencyError::DuplicateBundleId { id: entry.id });
            continue;
        }
        bundles.push(canonical_bundle(entry, index));
    }

    Ok(PackManifest {
        version: raw.version,
        citation: raw.citation,
        notes: raw.notes,
        anatomy: raw.assets.anatomy,
        bundles,
        wiring_space,
        wiring_space_assumed,
        inconsistencies,
    })
}

fn canonical_bundle(entry: RawBundleEntry, index: usize) -> BundleDefinition {
    let mut mesh_url = entry.mesh_url;
    let mut wire_url = entry.wire_url;

    // Legacy single url, only consulted when the typed fields are absent.
    if mesh_url.is_none() && wire_url.is_none() {
        if let Some(url) = entry.url {
            match legacy_kind(entry.kind.as_deref(), &url) {
                Some(LegacyKind::Mesh) => mesh_url = Some(url),
                Some(LegacyKind::Polyline) => wire_url = Some(url),
                None => warn!("Bundle {}: cannot tell what legacy url {} points at", entry.id, url),
            }
        }
    }

    let color = entry
        .color
        .as_deref()
        .and_then(parse_color)
        .unwrap_or_else(|| palette_color(index));

    BundleDefinition {
        id: entry.id,
        name: entry.name,
        color,
        sources: BundleSources::from_parts(mesh_url, wire_url),
    }
}

enum LegacyKind {
    Mesh,
    Polyline,
}

fn legacy_kind(kind: Option<&str>, url: &str) -> Option<LegacyKind> {
    match kind {
        Some("mesh") => return Some(LegacyKind::Mesh),
        Some("polyline") => return Some(LegacyKind::Polyline),
        _ => {}
    }
    let path = crate::engine::assets::location::strip_query(url).to_ascii_lowercase();
    if path.ends_with(".json") {
        Some(LegacyKind::Polyline)
    } else if path.ends_with(".glb") || path.ends_with(".gltf") {
        Some(LegacyKind::Mesh)
    } else {
        None
    }
}
