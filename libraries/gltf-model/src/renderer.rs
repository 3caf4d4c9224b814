use std::borrow::Cow;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, UVec4, Vec3, Vec4};
use lib_geometry::{Camera, Projection};
use log::warn;
use wgpu::util::DeviceExt;

use crate::model::{ModelData, Vertex};

pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Default, Debug, PartialEq)]
pub struct DirectionalLight {
    /// normalized direction pointing towards the light
    pub direction: Vec4,
    /// linear RGB premultiplied with the intensity
    pub color: Vec4,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Default, Debug, PartialEq)]
pub struct SpotLight {
    pub position: Vec4,
    /// normalized direction from the target towards the light
    pub direction: Vec4,
    /// linear RGB premultiplied with the intensity
    pub color: Vec4,
    /// x: cosine of the cone angle, y: cosine of the inner (penumbra-free) cone,
    /// z: cutoff distance (0 = infinite), w: decay exponent
    pub cone: Vec4,
}

/// Uniform block describing all lights of the scene.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Default, Debug, PartialEq)]
pub struct Lighting {
    /// linear RGB premultiplied with the intensity
    pub ambient: Vec4,
    pub directional: [DirectionalLight; MAX_DIRECTIONAL_LIGHTS],
    /// x: number of used entries in `directional`
    pub directional_count: UVec4,
    pub spot: SpotLight,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct CameraUniform {
    view_projection: Mat4,
    eye: Vec4,
}

struct Mesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// GPU-resident copy of a [`ModelData`].
pub struct GpuModel {
    meshes: Vec<Mesh>,
}

impl GpuModel {
    #[must_use]
    pub fn upload(device: &wgpu::Device, model: &ModelData) -> Self {
        let meshes = model
            .meshes
            .iter()
            .filter_map(|mesh| {
                if mesh.indices.is_empty() {
                    return None;
                }
                let Ok(index_count) = u32::try_from(mesh.indices.len()) else {
                    warn!("{}: skipping mesh with too many indices", model.label);
                    return None;
                };

                let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} Vertex Buffer", model.label)),
                    contents: bytemuck::cast_slice(&mesh.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });

                let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} Index Buffer", model.label)),
                    contents: bytemuck::cast_slice(&mesh.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });

                Some(Mesh {
                    vertex_buffer,
                    index_buffer,
                    index_count,
                })
            })
            .collect();

        Self { meshes }
    }
}

/// Draws [`GpuModel`]s lit by a [`Lighting`] rig.
pub struct ModelRenderer {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    camera_buf: wgpu::Buffer,
    lighting_buf: wgpu::Buffer,
}

impl ModelRenderer {
    #[must_use]
    pub fn new(
        device: &wgpu::Device,
        view_format: wgpu::TextureFormat,
        shader_source: Cow<'_, str>,
        depth_stencil_state: wgpu::DepthStencilState,
    ) -> Self {
        let uniform_entry = |binding, size: usize| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(size as u64),
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("model bind group layout"),
            entries: &[
                uniform_entry(0, size_of::<CameraUniform>()),
                uniform_entry(1, size_of::<Lighting>()),
            ],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: None,
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let camera_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera uniform buffer"),
            contents: bytemuck::bytes_of(&CameraUniform::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let lighting_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lighting uniform buffer"),
            contents: bytemuck::bytes_of(&Lighting::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: lighting_buf.as_entire_binding(),
                },
            ],
            label: None,
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("model shader"),
            source: wgpu::ShaderSource::Wgsl(shader_source),
        });

        let pipeline = Self::create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            &[Vertex::buffer_layout()],
            view_format,
            depth_stencil_state,
        );

        Self {
            pipeline,
            bind_group,
            camera_buf,
            lighting_buf,
        }
    }

    pub fn update_camera(&self, queue: &wgpu::Queue, camera: &Camera, projection: &Projection) {
        let uniform = CameraUniform {
            view_projection: projection.matrix() * camera.matrix(),
            eye: (camera.position, 1.0).into(),
        };
        queue.write_buffer(&self.camera_buf, 0, bytemuck::bytes_of(&uniform));
    }

    pub fn update_lighting(&self, queue: &wgpu::Queue, lighting: &Lighting) {
        queue.write_buffer(&self.lighting_buf, 0, bytemuck::bytes_of(lighting));
    }

    pub fn render(&self, render_pass: &mut wgpu::RenderPass<'_>, model: &GpuModel) {
        render_pass.push_debug_group("Prepare data for draw.");
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.pop_debug_group();

        for mesh in &model.meshes {
            render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            render_pass.insert_debug_marker("Draw!");
            render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }

    fn create_pipeline(
        device: &wgpu::Device,
        pipeline_layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        vertex_buffers: &[wgpu::VertexBufferLayout<'_>; 1],
        view_format: wgpu::TextureFormat,
        depth_stencil_state: wgpu::DepthStencilState,
    ) -> wgpu::RenderPipeline {
        let vertex = wgpu::VertexState {
            module: shader,
            entry_point: "vs_main",
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: vertex_buffers,
        };

        let fragment_state = wgpu::FragmentState {
            module: shader,
            entry_point: "fs_main",
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(view_format.into())],
        };

        // models may contain mirrored nodes, so both faces are drawn and the shader flips back-facing normals
        let primitive = wgpu::PrimitiveState {
            cull_mode: None,
            ..Default::default()
        };

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("model pipeline"),
            layout: Some(pipeline_layout),
            vertex,
            fragment: Some(fragment_state),
            primitive,
            depth_stencil: Some(depth_stencil_state),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }
}

impl DirectionalLight {
    /// A light shining from `position` towards the origin.
    #[must_use]
    pub fn from_position(position: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            direction: (position.normalize_or_zero(), 0.0).into(),
            color: (color * intensity, 1.0).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_blocks_match_the_wgsl_layout() {
        // every member is a 16 byte vector, so the structs must not contain implicit padding
        assert_eq!(size_of::<DirectionalLight>(), 32);
        assert_eq!(size_of::<SpotLight>(), 64);
        assert_eq!(size_of::<Lighting>(), 16 + 4 * 32 + 16 + 64);
        assert_eq!(size_of::<CameraUniform>(), 64 + 16);
    }

    #[test]
    fn directional_light_points_towards_its_position() {
        let light = DirectionalLight::from_position(Vec3::new(0.0, 0.0, 8.0), Vec3::ONE, 3.0);
        assert_eq!(light.direction, Vec4::new(0.0, 0.0, 1.0, 0.0));
        assert_eq!(light.color, Vec4::new(3.0, 3.0, 3.0, 1.0));
    }
}
