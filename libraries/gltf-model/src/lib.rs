//! Loading of binary glTF models and drawing them with `wgpu`.
#![allow(missing_docs, reason = "TODO add later")]

mod model;
mod renderer;

pub use model::{load_model, parse_model, MeshData, ModelData, Vertex};
pub use renderer::{
    DirectionalLight, GpuModel, Lighting, ModelRenderer, SpotLight, MAX_DIRECTIONAL_LIGHTS,
};
