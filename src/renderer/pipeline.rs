//! Render passes for the terrain: uniform layouts, pipeline construction and
//! the GPU copies of the mesh.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

use super::{LightingConfig, RenderMode};
use crate::scene::Scene;
use crate::terrain::{TerrainMesh, Vertex};

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Grid line color (RGBA).
const WIREFRAME_COLOR: [f32; 4] = [0.15, 0.15, 0.15, 1.0];

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub(crate) struct WireframeUniforms {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    color: [f32; 4],
}

impl WireframeUniforms {
    pub(crate) fn from_scene(scene: &Scene, aspect: f32) -> Self {
        Self {
            view_proj: scene
                .camera
                .build_view_projection_matrix(aspect)
                .to_cols_array_2d(),
            model: scene.model.to_cols_array_2d(),
            color: WIREFRAME_COLOR,
        }
    }
}

/// Solid pass uniforms.
///
/// `min_z`/`max_z` are the mesh's elevation bounds; the shader normalizes each
/// fragment's elevation across them to pick a color from `color_scheme`.
/// Field order matches `Uniforms` in `terrain.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub(crate) struct SolidUniforms {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    light_dir: [f32; 3],
    ambient: f32,
    light_color: [f32; 3],
    min_z: f32,
    max_z: f32,
    color_scheme: u32,
    _pad: [f32; 2],
}

impl SolidUniforms {
    pub(crate) fn from_scene(scene: &Scene, aspect: f32, lighting: &LightingConfig) -> Self {
        let elevation = scene.elevation();
        Self {
            view_proj: scene
                .camera
                .build_view_projection_matrix(aspect)
                .to_cols_array_2d(),
            model: scene.model.to_cols_array_2d(),
            normal_matrix: Mat4::from_mat3(scene.normal_matrix()).to_cols_array_2d(),
            light_dir: lighting.direction.normalize_or_zero().to_array(),
            ambient: lighting.ambient,
            light_color: lighting.color.to_array(),
            min_z: elevation.min,
            max_z: elevation.max,
            color_scheme: scene.color_scheme.shader_index(),
            _pad: [0.0; 2],
        }
    }
}

/// What differs between the solid and wireframe passes.
pub(crate) struct PassSpec {
    pub label: &'static str,
    pub shader: &'static str,
    pub topology: wgpu::PrimitiveTopology,
    pub depth_compare: wgpu::CompareFunction,
    pub uniform_size: usize,
}

pub(crate) const SOLID_PASS: PassSpec = PassSpec {
    label: "Solid",
    shader: include_str!("../shaders/terrain.wgsl"),
    topology: wgpu::PrimitiveTopology::TriangleList,
    depth_compare: wgpu::CompareFunction::Less,
    uniform_size: std::mem::size_of::<SolidUniforms>(),
};

// Lines sit exactly on the surface, so they must win depth ties.
pub(crate) const WIREFRAME_PASS: PassSpec = PassSpec {
    label: "Wireframe",
    shader: include_str!("../shaders/wireframe.wgsl"),
    topology: wgpu::PrimitiveTopology::LineList,
    depth_compare: wgpu::CompareFunction::LessEqual,
    uniform_size: std::mem::size_of::<WireframeUniforms>(),
};

/// A pipeline with its single uniform buffer bound at group 0.
pub(crate) struct TerrainPass {
    pipeline: wgpu::RenderPipeline,
    uniforms: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl TerrainPass {
    pub(crate) fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        spec: &PassSpec,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(spec.label),
            source: wgpu::ShaderSource::Wgsl(spec.shader.into()),
        });

        let uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(spec.label),
            size: spec.uniform_size as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(spec.label),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(spec.label),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(spec.label),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(spec.label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            // No culling: the terrain is seen from both sides while flying
            primitive: wgpu::PrimitiveState {
                topology: spec.topology,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: spec.depth_compare,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            uniforms,
            bind_group,
        }
    }

    pub(crate) fn write<T: Pod>(&self, queue: &wgpu::Queue, data: &T) {
        queue.write_buffer(&self.uniforms, 0, bytemuck::bytes_of(data));
    }

    pub(crate) fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        vertices: &wgpu::Buffer,
        indices: &IndexBuffer,
    ) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, vertices.slice(..));
        pass.set_index_buffer(indices.buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..indices.count, 0, 0..1);
    }
}

pub(crate) struct IndexBuffer {
    buffer: wgpu::Buffer,
    count: u32,
}

impl IndexBuffer {
    /// Upload `indices`, or return `None` for an empty list since a
    /// zero-sized buffer cannot be sliced.
    fn upload(device: &wgpu::Device, label: &str, indices: &[u32]) -> Option<Self> {
        if indices.is_empty() {
            return None;
        }
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Some(Self {
            buffer,
            count: indices.len() as u32,
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.count as usize
    }
}

/// GPU copy of a [`TerrainMesh`].
pub(crate) struct MeshBuffers {
    pub vertices: wgpu::Buffer,
    pub triangles: Option<IndexBuffer>,
    pub lines: Option<IndexBuffer>,
}

impl MeshBuffers {
    /// Returns `None` for a mesh with no vertices.
    pub(crate) fn upload(device: &wgpu::Device, mesh: &TerrainMesh) -> Option<Self> {
        if mesh.vertices.is_empty() {
            return None;
        }
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Terrain Vertices"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Some(Self {
            vertices,
            triangles: IndexBuffer::upload(device, "Terrain Triangles", &mesh.triangle_indices),
            lines: IndexBuffer::upload(device, "Terrain Lines", &mesh.indices),
        })
    }
}

/// Which passes run for a render mode, given what the mesh can draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawPlan {
    pub solid: bool,
    pub wireframe: bool,
}

impl DrawPlan {
    pub fn new(mode: RenderMode, triangle_indices: usize, line_indices: usize) -> Self {
        Self {
            solid: triangle_indices > 0 && matches!(mode, RenderMode::Solid | RenderMode::Both),
            wireframe: line_indices > 0
                && matches!(mode, RenderMode::Wireframe | RenderMode::Both),
        }
    }

    pub fn for_mesh(mode: RenderMode, mesh: &TerrainMesh) -> Self {
        Self::new(mode, mesh.triangle_indices.len(), mesh.indices.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::{Heightmap, MeshOptions};

    fn mesh(width: u32, height: u32) -> TerrainMesh {
        let pixels = vec![7u8; (width * height * 4) as usize];
        let map = Heightmap::from_rgba(width, height, pixels).unwrap();
        TerrainMesh::from_heightmap(&map, &MeshOptions::default())
    }

    #[test]
    fn test_uniform_sizes_match_wgsl() {
        // WGSL struct sizes round up to 16 bytes
        assert_eq!(std::mem::size_of::<SolidUniforms>(), 240);
        assert_eq!(std::mem::size_of::<WireframeUniforms>(), 144);
        assert_eq!(SOLID_PASS.uniform_size % 16, 0);
        assert_eq!(WIREFRAME_PASS.uniform_size % 16, 0);
    }

    #[test]
    fn test_full_grid_draws_everything() {
        let grid = mesh(3, 3);
        let plan = DrawPlan::for_mesh(RenderMode::Both, &grid);
        assert_eq!(
            plan,
            DrawPlan {
                solid: true,
                wireframe: true
            }
        );

        assert!(!DrawPlan::for_mesh(RenderMode::Solid, &grid).wireframe);
        assert!(!DrawPlan::for_mesh(RenderMode::Wireframe, &grid).solid);
    }

    #[test]
    fn test_single_row_skips_solid_pass() {
        for grid in [mesh(4, 1), mesh(1, 4)] {
            assert_eq!(grid.triangle_indices.len(), 0);

            let plan = DrawPlan::for_mesh(RenderMode::Both, &grid);
            assert!(!plan.solid);
            assert!(plan.wireframe);
            assert!(!DrawPlan::for_mesh(RenderMode::Solid, &grid).solid);
        }
    }

    #[test]
    fn test_single_pixel_draws_nothing() {
        let dot = mesh(1, 1);
        assert_eq!(dot.vertex_count(), 1);

        for mode in [RenderMode::Solid, RenderMode::Wireframe, RenderMode::Both] {
            let plan = DrawPlan::for_mesh(mode, &dot);
            assert!(!plan.solid && !plan.wireframe, "{:?} should draw nothing", mode);
        }
    }
}
