#![allow(missing_docs, reason = "TODO remove before release")]

mod catalog;
mod config;
mod input;
mod lighting;
mod loader;
mod notify;
mod renderer;
mod session;

pub use catalog::{model_path, normalize, ModelCatalog, Slot};
pub use config::{
    CameraConfig, Color, ColorError, ControlsConfig, LightConfig, LightingConfig, PositionedLightConfig,
    SpotLightConfig, ViewerConfig,
};
pub use input::{ButtonBar, InputAction, InputRouter, Intent, Rect};
pub use lighting::lighting_from_config;
pub use loader::{LoadCompletion, LoadRequest, LoadTicket, ModelLoader, ThreadedLoader};
pub use notify::{report_completion, DialogNotifier, Notifier};
pub use renderer::{Renderer, RendererBuilder};
pub use session::{ActiveModel, Completion, Direction, Selection, ViewerSession};
