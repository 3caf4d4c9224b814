#![allow(missing_docs, reason = "TODO remove before release")]

pub mod application;
pub mod event;
pub mod logging;
mod render_surface;
pub mod renderer;

pub use render_surface::RenderSurfaceError;

use event::{ApplicationEvent, FrameworkEvent};
use log::{debug, error};
use winit::event_loop::EventLoopProxy;

/// Turns Ctrl+C into a regular [`ApplicationEvent::Exit`].
///
/// # Errors
///
/// Fails if another handler has already been registered for this process.
pub fn register_ctrlc<Custom: Send + 'static>(
    proxy: EventLoopProxy<FrameworkEvent<Custom>>,
) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        debug!("received Ctrl+C");
        if proxy.send_event(ApplicationEvent::Exit.into()).is_err() {
            error!("window event loop is already gone");
        }
    })
}
