use crate::engine::error::{DataInconsistencyError, LoadError};
use constants::coordinate_system::{NORMALIZED_HALF_EXTENT, NORMALIZED_TOLERANCE};
use serde::Deserialize;

/// Centerline payload for one bundle, as served by the pack.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BundlePayload {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default = "default_payload_type")]
    pub kind: String,
    /// Polylines in the pack's wiring space
    #[serde(default)]
    pub lines: Vec<Vec<[f32; 3]>>,
}

fn default_payload_type() -> String {
    "polyline".to_string()
}

impl BundlePayload {
    /// Polylines with at least two points, plus one inconsistency per dropped line.
    pub fn renderable_lines(&self) -> (Vec<&[[f32; 3]]>, Vec<DataInconsistencyError>) {
        let mut lines = Vec::with_capacity(self.lines.len());
        let mut skipped = Vec::new();
        for (index, line) in self.lines.iter().enumerate() {
            if line.len() >= 2 {
                lines.push(line.as_slice());
            } else {
                skipped.push(DataInconsistencyError::DegeneratePolyline {
                    bundle: self.id.clone(),
                    index,
                    points: line.len(),
                });
            }
        }
        (lines, skipped)
    }

    /// True when every point sits inside the normalized authoring cube.
    pub fn within_normalized_cube(&self) -> bool {
        let limit = NORMALIZED_HALF_EXTENT + NORMALIZED_TOLERANCE;
        self.lines
            .iter()
            .flatten()
            .all(|p| p.iter().all(|c| c.abs() <= limit))
    }
}

/// Decode a wiring payload fetched from `url`.
pub fn decode_bundle_payload(text: &str, url: &str) -> Result<BundlePayload, LoadError> {
    let payload: BundlePayload = serde_json::from_str(text).map_err(|e| LoadError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    if payload.kind != "polyline" {
        return Err(LoadError::Decode {
            url: url.to_string(),
            reason: format!("unsupported payload type '{}'", payload.kind),
        });
    }

    if payload.lines.iter().flatten().flatten().any(|c| !c.is_finite()) {
        return Err(LoadError::Decode {
            url: url.to_string(),
            reason: "non-finite coordinate".to_string(),
        });
    }

    Ok(payload)
}
