use glam::{UVec4, Vec3};
use lib_gltf_model::{DirectionalLight, Lighting, SpotLight, MAX_DIRECTIONAL_LIGHTS};
use log::warn;

use crate::config::{LightingConfig, SpotLightConfig};

/// Keeps the smoothstep between the outer and inner cone well-defined.
const MIN_PENUMBRA_COS: f32 = 1e-4;

/// Converts the configured rig into the uniform block consumed by the model shader.
#[must_use]
pub fn lighting_from_config(config: &LightingConfig) -> Lighting {
    if config.directional.len() > MAX_DIRECTIONAL_LIGHTS {
        warn!(
            "only {MAX_DIRECTIONAL_LIGHTS} directional lights are supported, ignoring {} of them",
            config.directional.len() - MAX_DIRECTIONAL_LIGHTS
        );
    }

    let mut lighting = Lighting {
        ambient: (config.ambient.color.to_linear() * config.ambient.intensity, 1.0).into(),
        spot: config.spot.as_ref().map_or_else(disabled_spot, spot_light),
        ..Lighting::default()
    };

    let mut count = 0;
    for (slot, light) in lighting.directional.iter_mut().zip(&config.directional) {
        *slot = DirectionalLight::from_position(
            Vec3::from(light.position),
            light.color.to_linear(),
            light.intensity,
        );
        count += 1;
    }
    lighting.directional_count = UVec4::new(count, 0, 0, 0);

    lighting
}

fn spot_light(config: &SpotLightConfig) -> SpotLight {
    let position = Vec3::from(config.position);
    let angle = config.angle_degrees.to_radians();
    let outer_cos = angle.cos();
    let inner_cos = (angle * (1.0 - config.penumbra.clamp(0.0, 1.0)))
        .cos()
        .max(outer_cos + MIN_PENUMBRA_COS);

    SpotLight {
        position: (position, 1.0).into(),
        direction: ((position - Vec3::from(config.target)).normalize_or_zero(), 0.0).into(),
        color: (config.color.to_linear() * config.intensity, 1.0).into(),
        cone: (outer_cos, inner_cos, config.distance.max(0.0), config.decay).into(),
    }
}

/// A spot light whose cone never contains any direction.
fn disabled_spot() -> SpotLight {
    SpotLight {
        cone: (2.0, 3.0, 0.0, 0.0).into(),
        ..SpotLight::default()
    }
}
