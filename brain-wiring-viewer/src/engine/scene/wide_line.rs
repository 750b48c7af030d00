/// Screen-space constant width line material.
use bevy::pbr::{MaterialPipeline, MaterialPipelineKey};
use bevy::prelude::*;
use bevy::reflect::TypePath;
use bevy::render::mesh::{MeshVertexAttribute, MeshVertexBufferLayoutRef};
use bevy::render::render_resource::{
    AsBindGroup, RenderPipelineDescriptor, ShaderRef, ShaderType, SpecializedMeshPipelineError,
    VertexFormat,
};
use bevy::window::{PrimaryWindow, WindowResized};
use constants::path::WIDE_LINE_SHADER_PATH;

/// Opposite end of the segment a ribbon vertex belongs to.
pub const ATTRIBUTE_SEGMENT_OTHER: MeshVertexAttribute =
    MeshVertexAttribute::new("WideLine_Other", 988_540_917, VertexFormat::Float32x3);

/// Which edge of the ribbon (+1 or -1).
pub const ATTRIBUTE_SEGMENT_SIDE: MeshVertexAttribute =
    MeshVertexAttribute::new("WideLine_Side", 988_540_918, VertexFormat::Float32);

#[derive(Debug, Clone, Copy, ShaderType)]
pub struct WideLineUniform {
    pub color: LinearRgba,
    pub resolution: Vec2,
    pub width: f32,
    pub opacity: f32,
    pub glow: f32,
}

#[derive(Asset, TypePath, AsBindGroup, Debug, Clone)]
pub struct WideLineMaterial {
    #[uniform(0)]
    pub line: WideLineUniform,
}

impl WideLineMaterial {
    pub fn new(color: Color, width_px: f32, opacity: f32, glow: f32, resolution: Vec2) -> Self {
        Self {
            line: WideLineUniform {
                color: color.to_linear(),
                resolution: resolution.max(Vec2::ONE),
                width: width_px,
                opacity,
                glow,
            },
        }
    }
}

impl Material for WideLineMaterial {
    fn vertex_shader() -> ShaderRef {
        WIDE_LINE_SHADER_PATH.into()
    }

    fn fragment_shader() -> ShaderRef {
        WIDE_LINE_SHADER_PATH.into()
    }

    fn alpha_mode(&self) -> AlphaMode {
        AlphaMode::Blend
    }

    fn specialize(
        _pipeline: &MaterialPipeline<Self>,
        descriptor: &mut RenderPipelineDescriptor,
        layout: &MeshVertexBufferLayoutRef,
        _key: MaterialPipelineKey<Self>,
    ) -> Result<(), SpecializedMeshPipelineError> {
        let vertex_layout = layout.0.get_layout(&[
            Mesh::ATTRIBUTE_POSITION.at_shader_location(0),
            ATTRIBUTE_SEGMENT_OTHER.at_shader_location(1),
            ATTRIBUTE_SEGMENT_SIDE.at_shader_location(2),
        ])?;
        descriptor.vertex.buffers = vec![vertex_layout];
        descriptor.primitive.cull_mode = None;
        Ok(())
    }
}

/// Physical size of the primary viewport, tracked for line materials.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct ViewportResolution(pub Vec2);

impl Default for ViewportResolution {
    fn default() -> Self {
        Self(Vec2::new(1280.0, 720.0))
    }
}

pub struct WideLinePlugin;

impl Plugin for WideLinePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(MaterialPlugin::<WideLineMaterial> {
            prepass_enabled: false,
            shadows_enabled: false,
            ..default()
        })
        .init_resource::<ViewportResolution>()
        .add_systems(Update, refresh_line_resolution);
    }
}

/// Push the new viewport size into every wide line material after a resize.
pub fn refresh_line_resolution(
    mut resized: EventReader<WindowResized>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut resolution: ResMut<ViewportResolution>,
    mut materials: ResMut<Assets<WideLineMaterial>>,
) {
    if resized.read().last().is_none() {
        return;
    }
    let Ok(window) = windows.single() else {
        return;
    };

    let size = Vec2::new(
        window.resolution.physical_width() as f32,
        window.resolution.physical_height() as f32,
    )
    .max(Vec2::ONE);
    if resolution.0 == size {
        return;
    }
    resolution.0 = size;

    for (_, material) in materials.iter_mut() {
        material.line.resolution = size;
    }
    debug!("Wide line resolution set to {}x{}", size.x, size.y);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::window::WindowResolution;

    #[test]
    fn resize_updates_existing_materials() {
        let mut app = App::new();
        app.add_event::<WindowResized>()
            .init_resource::<ViewportResolution>()
            .init_resource::<Assets<WideLineMaterial>>()
            .add_systems(Update, refresh_line_resolution);

        let window = app
            .world_mut()
            .spawn((
                Window {
                    resolution: WindowResolution::new(800.0, 600.0),
                    ..default()
                },
                PrimaryWindow,
            ))
            .id();

        let handle = app
            .world_mut()
            .resource_mut::<Assets<WideLineMaterial>>()
            .add(WideLineMaterial::new(
                Color::WHITE,
                3.0,
                1.0,
                0.0,
                Vec2::new(1280.0, 720.0),
            ));

        app.world_mut().send_event(WindowResized {
            window,
            width: 800.0,
            height: 600.0,
        });
        app.update();

        let materials = app.world().resource::<Assets<WideLineMaterial>>();
        let material = materials.get(&handle).unwrap();
        assert_eq!(material.line.resolution, Vec2::new(800.0, 600.0));
        assert_eq!(
            app.world().resource::<ViewportResolution>().0,
            Vec2::new(800.0, 600.0)
        );
    }
}
