#![allow(missing_docs, reason = "TODO add later")]

mod camera;
mod orbit;
mod projection;

pub use camera::Camera;
pub use orbit::{OrbitControls, OrbitSettings};
pub use projection::Projection;
