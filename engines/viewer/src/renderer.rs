mod overlay;

use std::{borrow::Cow, collections::HashMap};

use glam::Vec3;
use lib_geometry::{Camera, OrbitControls, Projection};
use lib_gltf_model::{GpuModel, ModelData, ModelRenderer};
use log::{debug, info};
use overlay::OverlayRenderer;
use showroom_framework::renderer;
use winit::{dpi::PhysicalSize, event::WindowEvent};

use crate::{
    config::{Color, ViewerConfig},
    input::{ButtonBar, InputAction, InputRouter, Intent},
    lighting::lighting_from_config,
    loader::{LoadCompletion, ModelLoader},
    notify::{report_completion, Notifier},
    session::ViewerSession,
};

pub struct RendererBuilder<Loader> {
    config: ViewerConfig,
    loader: Loader,
    notifier: Box<dyn Notifier>,
}

impl<Loader: ModelLoader> RendererBuilder<Loader> {
    #[must_use]
    pub fn new(config: ViewerConfig, loader: Loader, notifier: Box<dyn Notifier>) -> Self {
        Self {
            config,
            loader,
            notifier,
        }
    }
}

impl<Loader: ModelLoader> renderer::RendererBuilder for RendererBuilder<Loader> {
    type Renderer = Renderer<Loader>;

    fn build(
        self,
        _adapter: &wgpu::Adapter,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface: &wgpu::SurfaceConfiguration,
    ) -> Renderer<Loader> {
        let Self {
            config,
            loader,
            notifier,
        } = self;

        let mut session = ViewerSession::new(config.models_folder.clone(), config.catalog_size);
        let issued = session.preload_all(&loader);
        info!("Preloading {issued} models from {}", config.models_folder.display());

        let camera = Camera::new(
            Vec3::from(config.camera.position),
            Vec3::from(config.camera.target),
        );
        let projection = Projection::new_perspective(
            (surface.width, surface.height),
            config.camera.fov_degrees.to_radians(),
            config.camera.near..config.camera.far,
        );
        let controls = OrbitControls::new(&camera, config.controls.to_orbit_settings());

        let view_format = surface.view_formats.first().copied().unwrap_or(surface.format);
        let depth_map = DepthTexture::create_depth_texture(device, surface, "depth_map");
        let model_renderer = ModelRenderer::new(
            device,
            view_format,
            Cow::Borrowed(include_str!("../shaders/model.wgsl")),
            DepthTexture::depth_stencil_state(),
        );
        model_renderer.update_camera(queue, &camera, &projection);
        model_renderer.update_lighting(queue, &lighting_from_config(&config.lighting));

        let surface_size = PhysicalSize::new(surface.width, surface.height);
        let buttons = ButtonBar::default();
        let overlay = OverlayRenderer::new(device, view_format, &buttons, surface_size);

        Renderer {
            session,
            loader,
            notifier,
            input: InputRouter::new(buttons),
            surface_size,
            background: clear_color(config.background),
            camera,
            projection,
            controls,
            camera_dirty: false,
            depth_map,
            model_renderer,
            overlay,
            gpu_models: HashMap::new(),
        }
    }
}

pub struct Renderer<Loader> {
    session: ViewerSession<ModelData>,
    loader: Loader,
    notifier: Box<dyn Notifier>,
    input: InputRouter,
    surface_size: PhysicalSize<u32>,
    background: wgpu::Color,
    camera: Camera,
    projection: Projection,
    controls: OrbitControls,
    /// camera or projection changed since the last upload
    camera_dirty: bool,
    depth_map: DepthTexture,
    model_renderer: ModelRenderer,
    overlay: OverlayRenderer,
    /// uploaded on first display, keyed by catalog index
    gpu_models: HashMap<usize, GpuModel>,
}

impl<Loader: ModelLoader> Renderer<Loader> {
    fn navigate(&mut self, intent: Intent) {
        match intent {
            Intent::Next => info!("Switching to next model"),
            Intent::Previous => info!("Switching to previous model"),
        }
        let selection = self.session.advance(intent.direction(), &self.loader);
        debug!("{selection:?}");
    }

    #[expect(clippy::cast_precision_loss, reason = "window heights fit into f32")]
    fn apply(&mut self, action: InputAction) {
        match action {
            InputAction::Navigate(intent) => self.navigate(intent),
            InputAction::Orbit(delta_x, delta_y) => self
                .controls
                .rotate((delta_x, delta_y), self.surface_size.height as f32),
            InputAction::Zoom(steps) => self.controls.zoom(steps),
        }
    }

    fn render_model(
        &mut self,
        texture_view: &wgpu::TextureView,
        encoder: &mut wgpu::CommandEncoder,
        device: &wgpu::Device,
    ) {
        let model = self.session.active().map(|active| {
            self.gpu_models.entry(active.index).or_insert_with(|| {
                debug!("uploading {:?}", active.model);
                GpuModel::upload(device, &active.model)
            })
        });

        let render_pass_color_attachment = wgpu::RenderPassColorAttachment {
            view: texture_view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(self.background),
                store: wgpu::StoreOp::Store,
            },
        };
        let color_attachments = [Some(render_pass_color_attachment)];
        let render_pass_depth_stencil_attachment = wgpu::RenderPassDepthStencilAttachment {
            view: &self.depth_map.view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        };
        let render_pass_descriptor = wgpu::RenderPassDescriptor {
            label: Some("model pass"),
            color_attachments: &color_attachments,
            depth_stencil_attachment: Some(render_pass_depth_stencil_attachment),
            timestamp_writes: None,
            occlusion_query_set: None,
        };

        let mut render_pass = encoder.begin_render_pass(&render_pass_descriptor);
        if let Some(model) = model {
            self.model_renderer.render(&mut render_pass, model);
        }
    }

    fn render_overlay(&self, texture_view: &wgpu::TextureView, encoder: &mut wgpu::CommandEncoder) {
        let render_pass_color_attachment = wgpu::RenderPassColorAttachment {
            view: texture_view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Load,
                store: wgpu::StoreOp::Store,
            },
        };
        let color_attachments = [Some(render_pass_color_attachment)];
        let render_pass_descriptor = wgpu::RenderPassDescriptor {
            label: Some("overlay pass"),
            color_attachments: &color_attachments,
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        };

        let mut render_pass = encoder.begin_render_pass(&render_pass_descriptor);
        self.overlay.render(&mut render_pass);
    }
}

impl<Loader: ModelLoader> renderer::Renderer for Renderer<Loader> {
    type Event = LoadCompletion<ModelData>;

    fn window_event(&mut self, event: &WindowEvent) {
        if let Some(action) = self.input.handle(event, self.surface_size) {
            self.apply(action);
        }
    }

    fn custom_event(&mut self, event: LoadCompletion<ModelData>) {
        let completion = self.session.complete(event);
        report_completion(self.notifier.as_ref(), &completion);
    }

    fn update(&mut self) {
        if self.controls.update(&mut self.camera) {
            self.camera_dirty = true;
        }
    }

    fn resize(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface: &wgpu::SurfaceConfiguration,
    ) {
        self.surface_size = PhysicalSize::new(surface.width, surface.height);
        self.projection
            .set_surface_dimensions((surface.width, surface.height));
        self.depth_map = DepthTexture::create_depth_texture(device, surface, "depth_map");
        self.overlay
            .resize(queue, self.input.buttons(), self.surface_size);
        self.camera_dirty = true;
    }

    fn render(
        &mut self,
        texture_view: &wgpu::TextureView,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) {
        if self.camera_dirty {
            self.model_renderer
                .update_camera(queue, &self.camera, &self.projection);
            self.camera_dirty = false;
        }

        let mut encoder =
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });

        self.render_model(texture_view, &mut encoder, device);
        self.render_overlay(texture_view, &mut encoder);

        queue.submit(Some(encoder.finish()));
    }
}

fn clear_color(color: Color) -> wgpu::Color {
    let linear = color.to_linear();
    wgpu::Color {
        r: f64::from(linear.x),
        g: f64::from(linear.y),
        b: f64::from(linear.z),
        a: 1.0,
    }
}

struct DepthTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthTexture {
    const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    fn create_depth_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        };
        let desc = wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        };
        let texture = device.create_texture(&desc);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            _texture: texture,
            view,
        }
    }

    fn depth_stencil_state() -> wgpu::DepthStencilState {
        wgpu::DepthStencilState {
            format: Self::DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_is_cleared_in_linear_space() {
        let color = clear_color(Color::from_rgb(0x00_00_00));
        assert_eq!((color.r, color.g, color.b, color.a), (0.0, 0.0, 0.0, 1.0));

        let color = clear_color(Color::from_rgb(0x80_80_80));
        assert!(color.r > 0.2 && color.r < 0.25, "{}", color.r);
    }
}
