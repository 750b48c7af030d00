//! Display parameters as immutable snapshots.
//!
//! Every change produces a new `ViewerParams`. Systems compare the previous
//! and next snapshot through `ParamImpact::between` to decide whether a cheap
//! style update is enough or composition must be rebuilt.

use crate::engine::error::ParamError;
use crate::engine::systems::render_mode::RenderMode;
use bevy::prelude::*;
use constants::path::DEFAULT_PACK_TAG;
use constants::render_settings::*;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

#[derive(Resource, Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerParams {
    #[serde(rename = "pack")]
    pub pack_tag: String,
    pub cutaway: f32,
    pub shell_opacity: f32,
    pub bundle_opacity: f32,
    pub functional_opacity: f32,
    #[serde(rename = "lineWidth")]
    pub line_width_px: f32,
    pub glow: bool,
    pub render_mode: RenderMode,
    pub dashed_edges: bool,
    pub enabled_bundles: BTreeSet<String>,
    pub selected_networks: BTreeSet<String>,
    #[serde(rename = "nodeSize")]
    pub node_size_mm: f32,
    pub dmn_boost: f32,
}

impl Default for ViewerParams {
    fn default() -> Self {
        Self {
            pack_tag: DEFAULT_PACK_TAG.to_string(),
            cutaway: 0.0,
            shell_opacity: DEFAULT_SHELL_OPACITY,
            bundle_opacity: DEFAULT_BUNDLE_OPACITY,
            functional_opacity: DEFAULT_FUNCTIONAL_OPACITY,
            line_width_px: DEFAULT_LINE_WIDTH_PX,
            glow: false,
            render_mode: RenderMode::Both,
            dashed_edges: true,
            enabled_bundles: BTreeSet::new(),
            selected_networks: [DEFAULT_MODE_NETWORK_ID.to_string()].into_iter().collect(),
            node_size_mm: NODE_BASE_SIZE_MM,
            dmn_boost: DEFAULT_MODE_BOOST,
        }
    }
}

impl ViewerParams {
    pub fn for_pack(tag: &str) -> Self {
        Self {
            pack_tag: tag.to_string(),
            ..default()
        }
    }

    pub fn with_render_mode(&self, render_mode: RenderMode) -> Self {
        Self {
            render_mode,
            ..self.clone()
        }
    }

    pub fn with_pack(&self, tag: &str) -> Self {
        Self {
            pack_tag: tag.to_string(),
            ..self.clone()
        }
    }

    pub fn with_enabled_bundles<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            enabled_bundles: ids.into_iter().map(str::to_string).collect(),
            ..self.clone()
        }
    }

    pub fn with_bundle_toggled(&self, id: &str) -> Self {
        let mut next = self.clone();
        if !next.enabled_bundles.remove(id) {
            next.enabled_bundles.insert(id.to_string());
        }
        next
    }

    pub fn with_network_toggled(&self, id: &str) -> Self {
        let mut next = self.clone();
        if !next.selected_networks.remove(id) {
            next.selected_networks.insert(id.to_string());
        }
        next
    }

    /// Thick lines are screen-space ribbons; thin ones are hairlines.
    pub fn uses_thick_lines(&self, threshold_px: f32) -> bool {
        self.line_width_px > threshold_px
    }

    /// New snapshot with one named parameter replaced, validated against its control.
    pub fn with_parameter(&self, name: &str, value: &Value) -> Result<Self, ParamError> {
        let mut next = self.clone();
        match name {
            "pack" => next.pack_tag = non_empty_string(name, value)?,
            "cutaway" => next.cutaway = ranged(name, value, 0.0, MAX_CUTAWAY)?,
            "shellOpacity" => next.shell_opacity = ranged(name, value, 0.0, 1.0)?,
            "bundleOpacity" => next.bundle_opacity = ranged(name, value, 0.0, 1.0)?,
            "functionalOpacity" => next.functional_opacity = ranged(name, value, 0.0, 1.0)?,
            "lineWidth" => {
                next.line_width_px = ranged(name, value, MIN_LINE_WIDTH_PX, MAX_LINE_WIDTH_PX)?
            }
            "glow" => next.glow = boolean(name, value)?,
            "dashedEdges" => next.dashed_edges = boolean(name, value)?,
            "renderMode" => {
                let text = value.as_str().ok_or_else(|| invalid(name, "expected a string"))?;
                next.render_mode = RenderMode::from_string(text)
                    .ok_or_else(|| invalid(name, &format!("unknown mode '{text}'")))?;
            }
            "enabledBundles" => next.enabled_bundles = string_set(name, value)?,
            "selectedNetworks" => next.selected_networks = string_set(name, value)?,
            "nodeSize" => {
                next.node_size_mm = ranged(name, value, MIN_NODE_SIZE_MM, MAX_NODE_SIZE_MM)?
            }
            "dmnBoost" => next.dmn_boost = ranged(name, value, 1.0, MAX_NODE_BOOST)?,
            _ => return Err(ParamError::Unknown(name.to_string())),
        }
        Ok(next)
    }
}

fn invalid(name: &str, reason: &str) -> ParamError {
    ParamError::InvalidValue {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

fn ranged(name: &str, value: &Value, min: f32, max: f32) -> Result<f32, ParamError> {
    let number = value
        .as_f64()
        .ok_or_else(|| invalid(name, "expected a number"))? as f32;
    if !(min..=max).contains(&number) {
        return Err(invalid(name, &format!("{number} is outside [{min}, {max}]")));
    }
    Ok(number)
}

fn boolean(name: &str, value: &Value) -> Result<bool, ParamError> {
    value.as_bool().ok_or_else(|| invalid(name, "expected a boolean"))
}

fn non_empty_string(name: &str, value: &Value) -> Result<String, ParamError> {
    match value.as_str() {
        Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        _ => Err(invalid(name, "expected a non-empty string")),
    }
}

fn string_set(name: &str, value: &Value) -> Result<BTreeSet<String>, ParamError> {
    let items = value
        .as_array()
        .ok_or_else(|| invalid(name, "expected an array of ids"))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| invalid(name, "ids must be strings"))
        })
        .collect()
}

/// What a parameter change requires from the scene.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParamImpact {
    pub reload_pack: bool,
    pub recompose_bundles: bool,
    pub recompose_networks: bool,
    /// Opacity, stroke width or emissive changes on existing materials
    pub restyle: bool,
    pub visibility: bool,
    pub cutaway: bool,
    pub glow: bool,
}

impl ParamImpact {
    pub fn between(prev: &ViewerParams, next: &ViewerParams, thin_threshold_px: f32) -> Self {
        let crosses_threshold =
            prev.uses_thick_lines(thin_threshold_px) != next.uses_thick_lines(thin_threshold_px);
        let width_changed = prev.line_width_px != next.line_width_px;

        Self {
            reload_pack: prev.pack_tag != next.pack_tag,
            recompose_bundles: crosses_threshold || prev.enabled_bundles != next.enabled_bundles,
            recompose_networks: crosses_threshold
                || prev.selected_networks != next.selected_networks
                || prev.node_size_mm != next.node_size_mm
                || prev.dmn_boost != next.dmn_boost
                || prev.dashed_edges != next.dashed_edges,
            restyle: (width_changed && !crosses_threshold)
                || prev.shell_opacity != next.shell_opacity
                || prev.bundle_opacity != next.bundle_opacity
                || prev.functional_opacity != next.functional_opacity
                || prev.glow != next.glow,
            visibility: prev.render_mode != next.render_mode,
            cutaway: prev.cutaway != next.cutaway,
            glow: prev.glow != next.glow,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Control kinds offered to a GUI front end.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ControlKind {
    Text,
    Range { min: f32, max: f32, step: f32 },
    Toggle,
    Choice { options: Vec<String> },
    Set { options: Vec<ControlOption> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlOption {
    pub id: String,
    pub label: String,
}

/// A labelled control bound to one named parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlSpec {
    pub name: &'static str,
    pub label: &'static str,
    #[serde(flatten)]
    pub kind: ControlKind,
}

/// Registry of every tunable parameter. Set controls list the current pack's
/// bundles and the catalogue's networks.
pub fn control_specs(bundles: Vec<ControlOption>, networks: Vec<ControlOption>) -> Vec<ControlSpec> {
    let range = |min, max, step| ControlKind::Range { min, max, step };
    vec![
        ControlSpec { name: "pack", label: "Data pack", kind: ControlKind::Text },
        ControlSpec {
            name: "renderMode",
            label: "Bundle display",
            kind: ControlKind::Choice {
                options: RenderMode::ALL.iter().map(|m| m.as_str().to_string()).collect(),
            },
        },
        ControlSpec { name: "cutaway", label: "Cutaway", kind: range(0.0, MAX_CUTAWAY, 0.01) },
        ControlSpec { name: "shellOpacity", label: "Shell opacity", kind: range(0.0, 1.0, 0.01) },
        ControlSpec { name: "bundleOpacity", label: "Bundle opacity", kind: range(0.0, 1.0, 0.01) },
        ControlSpec {
            name: "functionalOpacity",
            label: "Network opacity",
            kind: range(0.0, 1.0, 0.01),
        },
        ControlSpec {
            name: "lineWidth",
            label: "Line width (px)",
            kind: range(MIN_LINE_WIDTH_PX, MAX_LINE_WIDTH_PX, 0.1),
        },
        ControlSpec { name: "glow", label: "Glow", kind: ControlKind::Toggle },
        ControlSpec { name: "dashedEdges", label: "Dashed edges", kind: ControlKind::Toggle },
        ControlSpec {
            name: "nodeSize",
            label: "Node size (mm)",
            kind: range(MIN_NODE_SIZE_MM, MAX_NODE_SIZE_MM, 0.5),
        },
        ControlSpec {
            name: "dmnBoost",
            label: "Default-mode boost",
            kind: range(1.0, MAX_NODE_BOOST, 0.1),
        },
        ControlSpec {
            name: "enabledBundles",
            label: "Bundles",
            kind: ControlKind::Set { options: bundles },
        },
        ControlSpec {
            name: "selectedNetworks",
            label: "Networks",
            kind: ControlKind::Set { options: networks },
        },
    ]
}
