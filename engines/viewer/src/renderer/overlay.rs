use std::{borrow::Cow, mem::offset_of};

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use crate::input::{ButtonBar, Intent, Rect};

const BUTTON_COLOR: [f32; 4] = [0.1, 0.1, 0.1, 0.6];
const ARROW_COLOR: [f32; 4] = [0.95, 0.95, 0.95, 1.0];

/// two triangles for the background and one for the arrow
const VERTICES_PER_BUTTON: usize = 9;
const VERTEX_COUNT: usize = 2 * VERTICES_PER_BUTTON;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(super) struct OverlayVertex {
    /// normalized device coordinates
    position: [f32; 2],
    color: [f32; 4],
}

/// Triangles of both navigation buttons for a surface of the given size.
pub(super) fn button_vertices(
    buttons: &ButtonBar,
    surface: PhysicalSize<u32>,
) -> [OverlayVertex; VERTEX_COUNT] {
    #[expect(clippy::cast_precision_loss, reason = "window sizes fit into f32")]
    let size = Vec2::new(surface.width.max(1) as f32, surface.height.max(1) as f32);
    let to_ndc = |pixel: Vec2| {
        let ndc = pixel / size * 2.0 - 1.0;
        [ndc.x, -ndc.y]
    };
    let vertex = |pixel: Vec2, color: [f32; 4]| OverlayVertex {
        position: to_ndc(pixel),
        color,
    };

    let mut vertices = [OverlayVertex::zeroed(); VERTEX_COUNT];
    for (chunk, (intent, Rect { min, max })) in vertices
        .chunks_exact_mut(VERTICES_PER_BUTTON)
        .zip(buttons.buttons(surface))
    {
        let center = (min + max) / 2.0;
        let half = (max - min) / 4.0;
        let (tip, base) = match intent {
            Intent::Previous => (center.x - half.x, center.x + half.x),
            Intent::Next => (center.x + half.x, center.x - half.x),
        };

        let corners = [
            vertex(min, BUTTON_COLOR),
            vertex(Vec2::new(max.x, min.y), BUTTON_COLOR),
            vertex(max, BUTTON_COLOR),
            vertex(min, BUTTON_COLOR),
            vertex(max, BUTTON_COLOR),
            vertex(Vec2::new(min.x, max.y), BUTTON_COLOR),
            vertex(Vec2::new(tip, center.y), ARROW_COLOR),
            vertex(Vec2::new(base, center.y - half.y), ARROW_COLOR),
            vertex(Vec2::new(base, center.y + half.y), ARROW_COLOR),
        ];
        chunk.copy_from_slice(&corners);
    }
    vertices
}

/// Draws the navigation buttons on top of the scene.
pub(super) struct OverlayRenderer {
    pipeline: wgpu::RenderPipeline,
    vertex_buf: wgpu::Buffer,
}

impl OverlayRenderer {
    pub(super) fn new(
        device: &wgpu::Device,
        view_format: wgpu::TextureFormat,
        buttons: &ButtonBar,
        surface: PhysicalSize<u32>,
    ) -> Self {
        let vertex_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("overlay vertex buffer"),
            contents: bytemuck::cast_slice(&button_vertices(buttons, surface)),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("overlay shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!(
                "../../shaders/overlay.wgsl"
            ))),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: None,
            bind_group_layouts: &[],
            push_constant_ranges: &[],
        });

        let vertex_buffers = [wgpu::VertexBufferLayout {
            array_stride: size_of::<OverlayVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: offset_of!(OverlayVertex, position) as wgpu::BufferAddress,
                    shader_location: 0,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x4,
                    offset: offset_of!(OverlayVertex, color) as wgpu::BufferAddress,
                    shader_location: 1,
                },
            ],
        }];

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("overlay pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                buffers: &vertex_buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: view_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            vertex_buf,
        }
    }

    pub(super) fn resize(
        &self,
        queue: &wgpu::Queue,
        buttons: &ButtonBar,
        surface: PhysicalSize<u32>,
    ) {
        queue.write_buffer(
            &self.vertex_buf,
            0,
            bytemuck::cast_slice(&button_vertices(buttons, surface)),
        );
    }

    pub(super) fn render(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_vertex_buffer(0, self.vertex_buf.slice(..));
        #[expect(clippy::cast_possible_truncation, reason = "the vertex count is tiny")]
        render_pass.draw(0..VERTEX_COUNT as u32, 0..1);
    }
}
