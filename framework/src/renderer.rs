use winit::event::WindowEvent;

/// Creates the [`Renderer`] once the GPU device is available.
pub trait RendererBuilder {
    type Renderer: Renderer;

    fn build(
        self,
        adapter: &wgpu::Adapter,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface: &wgpu::SurfaceConfiguration,
    ) -> Self::Renderer;
}

/// Everything the window event loop drives.
///
/// All methods are called from the event loop's thread and never overlap.
pub trait Renderer {
    /// Payload of [`crate::event::FrameworkEvent::Custom`].
    type Event: Send + 'static;

    /// Input that isn't consumed by the framework itself.
    fn window_event(&mut self, event: &WindowEvent);

    fn custom_event(&mut self, event: Self::Event);

    /// Called once per frame before [`Renderer::render`].
    fn update(&mut self);

    fn resize(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface: &wgpu::SurfaceConfiguration,
    );

    fn render(
        &mut self,
        texture_view: &wgpu::TextureView,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    );
}
