use crate::{
    event::{ApplicationEvent, FrameworkEvent},
    render_surface::{RenderSurface, RenderSurfaceError},
    renderer::{self, Renderer as _},
};
use log::{debug, error, info, trace, warn};
use std::time::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{Key, NamedKey},
    window::{WindowAttributes, WindowId},
};

type CustomEvent<RendererBuilder> =
    <<RendererBuilder as renderer::RendererBuilder>::Renderer as renderer::Renderer>::Event;

pub struct Application<RendererBuilder: renderer::RendererBuilder> {
    /// consumed when the window is created for the first time
    renderer_builder: Option<RendererBuilder>,
    surface: Option<RenderSurface<RendererBuilder::Renderer>>,
    title: String,
    frame_counter: u32,
    frame_time: Instant,
    error: Option<RenderSurfaceError>,
}

impl<RendererBuilder: renderer::RendererBuilder> Application<RendererBuilder> {
    #[must_use]
    pub fn new(title: String, renderer_builder: RendererBuilder) -> Self {
        Self {
            renderer_builder: Some(renderer_builder),
            surface: None,
            title,
            frame_counter: 0,
            frame_time: Instant::now(),
            error: None,
        }
    }

    /// The error that made the event loop exit early, if any.
    pub fn take_error(&mut self) -> Option<RenderSurfaceError> {
        self.error.take()
    }

    #[expect(
        clippy::cast_precision_loss,
        reason = "frame counts are small enough"
    )]
    fn update_fps(&mut self) {
        self.frame_counter += 1;
        let span = self.frame_time.elapsed();
        if span >= Duration::from_secs(1) {
            debug!(
                "{} fps",
                ((self.frame_counter as f32) / span.as_secs_f32()).round()
            );
            self.frame_counter = 0;
            self.frame_time += span;
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: RenderSurfaceError) {
        error!("{error}");
        self.error = Some(error);
        event_loop.exit();
    }
}

impl<RendererBuilder: renderer::RendererBuilder>
    ApplicationHandler<FrameworkEvent<CustomEvent<RendererBuilder>>>
    for Application<RendererBuilder>
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // the surface survives suspension on desktop platforms
        let Some(renderer_builder) = self.renderer_builder.take() else {
            return;
        };

        let attributes = WindowAttributes::default().with_title(&self.title);
        let window = match event_loop.create_window(attributes) {
            Ok(window) => window,
            Err(error) => return self.fail(event_loop, RenderSurfaceError::CreateWindow(error)),
        };

        // First-time init of the scene
        match pollster::block_on(RenderSurface::new(window, renderer_builder)) {
            Ok(surface) => self.surface = Some(surface),
            Err(error) => self.fail(event_loop, error),
        }
    }

    fn user_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        event: FrameworkEvent<CustomEvent<RendererBuilder>>,
    ) {
        match event {
            FrameworkEvent::Application {
                event: ApplicationEvent::Exit,
            } => {
                info!("Window event loop received an ExitEvent. Shutting down event loop.");
                event_loop.exit();
            }
            FrameworkEvent::Custom { event } => match self.surface.as_mut() {
                Some(surface) => surface.renderer_mut().custom_event(event),
                None => warn!("dropping event that arrived before the renderer was created"),
            },
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        // On MacOS, currently redraw requested comes in _before_ Init does.
        // If this happens, just drop the event on the floor.
        //
        // See https://github.com/rust-windowing/winit/issues/3235 for some discussion
        let Some(surface) = self.surface.as_mut() else {
            return;
        };

        match event {
            WindowEvent::Resized(size) => {
                trace!("WindowEvent::Resized({size:?})");
                surface.resize(size);
            }

            WindowEvent::CloseRequested => {
                trace!("WindowEvent::CloseRequested()");
                event_loop.exit();
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                debug!("Escape pressed, exiting");
                event_loop.exit();
            }

            WindowEvent::RedrawRequested => {
                surface.redraw();
                self.update_fps();
            }

            ref other => surface.renderer_mut().window_event(other),
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        trace!("window event loop is exiting");
    }
}
