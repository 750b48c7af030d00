/// Line mesh construction for wiring polylines and network edges.
use bevy::asset::RenderAssetUsages;
use bevy::pbr::NotShadowCaster;
use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use bevy::render::view::NoFrustumCulling;
use constants::render_settings::GLOW_INTENSITY;

use super::wide_line::{ATTRIBUTE_SEGMENT_OTHER, ATTRIBUTE_SEGMENT_SIDE, WideLineMaterial};
use crate::tools::picking::hit_test::PickShape;

/// Which primitive a line is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// One pixel line list through the standard pipeline.
    Hairline,
    /// Screen-space ribbon of constant pixel width.
    Wide,
}

impl LineKind {
    pub fn for_width(width_px: f32, thin_threshold_px: f32) -> Self {
        if width_px <= thin_threshold_px {
            Self::Hairline
        } else {
            Self::Wide
        }
    }
}

/// Line list through consecutive points of one polyline.
pub fn hairline_mesh(points: &[Vec3]) -> Mesh {
    let vertices: Vec<[f32; 3]> = points.iter().map(|p| p.to_array()).collect();

    let mut indices = Vec::with_capacity(points.len().saturating_sub(1) * 2);
    for i in 1..points.len() {
        indices.extend_from_slice(&[(i - 1) as u32, i as u32]);
    }

    let mut mesh = Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, vertices);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}

/// Hairline built from disjoint segments (dashed edges).
pub fn segment_list_mesh(segments: &[[Vec3; 2]]) -> Mesh {
    let vertices: Vec<[f32; 3]> = segments
        .iter()
        .flat_map(|[a, b]| [a.to_array(), b.to_array()])
        .collect();
    let indices = (0..vertices.len() as u32).collect();

    let mut mesh = Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, vertices);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}

/// Ribbon geometry for the wide line material.
///
/// Every segment gets four vertices. The far end stores a point beyond the
/// segment so both ends see the same direction and `side` stays geometric.
pub fn wide_line_mesh(segments: &[[Vec3; 2]]) -> Mesh {
    let mut positions = Vec::with_capacity(segments.len() * 4);
    let mut others = Vec::with_capacity(segments.len() * 4);
    let mut sides = Vec::with_capacity(segments.len() * 4);
    let mut indices = Vec::with_capacity(segments.len() * 6);

    for (i, [a, b]) in segments.iter().enumerate() {
        let ahead = *b + (*b - *a);
        let base = (i * 4) as u32;

        positions.extend_from_slice(&[a.to_array(), a.to_array(), b.to_array(), b.to_array()]);
        others.extend_from_slice(&[
            b.to_array(),
            b.to_array(),
            ahead.to_array(),
            ahead.to_array(),
        ]);
        sides.extend_from_slice(&[1.0f32, -1.0, 1.0, -1.0]);
        indices.extend_from_slice(&[base, base + 1, base + 3, base, base + 3, base + 2]);
    }

    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(ATTRIBUTE_SEGMENT_OTHER, others);
    mesh.insert_attribute(ATTRIBUTE_SEGMENT_SIDE, sides);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}

/// Consecutive point pairs of a polyline.
pub fn polyline_segments(points: &[Vec3]) -> Vec<[Vec3; 2]> {
    points.windows(2).map(|w| [w[0], w[1]]).collect()
}

/// Split a straight edge into dashes of `dash` length separated by `gap`.
pub fn dash_segments(from: Vec3, to: Vec3, dash: f32, gap: f32) -> Vec<[Vec3; 2]> {
    let length = from.distance(to);
    if length <= f32::EPSILON || dash <= 0.0 {
        return vec![[from, to]];
    }

    let dir = (to - from) / length;
    let period = dash + gap.max(0.0);
    let mut segments = Vec::new();
    let mut start = 0.0;
    while start < length {
        let end = (start + dash).min(length);
        segments.push([from + dir * start, from + dir * end]);
        start += period;
    }
    segments
}

/// Owner category of a line, used when restyling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRole {
    Bundle,
    Network,
}

/// A spawned line entity and the style inputs it was built from.
#[derive(Component, Debug, Clone)]
pub struct LinePrimitive {
    pub kind: LineKind,
    pub role: LineRole,
    pub color: Color,
}

#[derive(Debug, Clone, Copy)]
pub struct LineStyle {
    pub kind: LineKind,
    pub role: LineRole,
    pub color: Color,
    pub opacity: f32,
    pub width_px: f32,
    pub glow: bool,
}

pub enum LineGeometry {
    Polyline(Vec<Vec3>),
    Segments(Vec<[Vec3; 2]>),
}

impl LineGeometry {
    fn segments(&self) -> Vec<[Vec3; 2]> {
        match self {
            Self::Polyline(points) => polyline_segments(points),
            Self::Segments(segments) => segments.clone(),
        }
    }
}

/// Unlit material for hairlines, emissive while glowing.
pub fn hairline_material(color: Color, opacity: f32, glow: bool) -> StandardMaterial {
    let mut material = StandardMaterial {
        base_color: color.with_alpha(opacity),
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        ..default()
    };
    set_line_glow(&mut material, color, glow);
    material
}

pub fn set_line_glow(material: &mut StandardMaterial, color: Color, glow: bool) {
    material.emissive = if glow {
        color.to_linear() * GLOW_INTENSITY
    } else {
        LinearRgba::BLACK
    };
}

pub fn wide_glow(glow: bool) -> f32 {
    if glow { GLOW_INTENSITY } else { 0.0 }
}

/// Asset stores needed to build line primitives.
pub struct LineAssets<'a> {
    pub meshes: &'a mut Assets<Mesh>,
    pub standard: &'a mut Assets<StandardMaterial>,
    pub wide: &'a mut Assets<WideLineMaterial>,
    pub resolution: Vec2,
}

impl LineAssets<'_> {
    /// Spawn one line primitive with its pick shape; `extra` carries label and parent.
    pub fn spawn_line(
        &mut self,
        commands: &mut Commands,
        geometry: LineGeometry,
        style: &LineStyle,
        extra: impl Bundle,
    ) -> Entity {
        let segments = geometry.segments();
        let primitive = LinePrimitive {
            kind: style.kind,
            role: style.role,
            color: style.color,
        };
        let common = (
            primitive,
            PickShape::Segments(segments.clone()),
            NoFrustumCulling,
            NotShadowCaster,
            Transform::IDENTITY,
            Visibility::Inherited,
        );

        match style.kind {
            LineKind::Hairline => {
                let mesh = match geometry {
                    LineGeometry::Polyline(points) => hairline_mesh(&points),
                    LineGeometry::Segments(segments) => segment_list_mesh(&segments),
                };
                let material = hairline_material(style.color, style.opacity, style.glow);
                commands
                    .spawn((
                        Mesh3d(self.meshes.add(mesh)),
                        MeshMaterial3d(self.standard.add(material)),
                        common,
                        extra,
                    ))
                    .id()
            }
            LineKind::Wide => {
                let material = WideLineMaterial::new(
                    style.color,
                    style.width_px,
                    style.opacity,
                    wide_glow(style.glow),
                    self.resolution,
                );
                commands
                    .spawn((
                        Mesh3d(self.meshes.add(wide_line_mesh(&segments))),
                        MeshMaterial3d(self.wide.add(material)),
                        common,
                        extra,
                    ))
                    .id()
            }
        }
    }
}
