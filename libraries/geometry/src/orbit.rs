use core::f32::consts::{PI, TAU};
use std::ops::RangeInclusive;

use glam::Vec3;

use crate::Camera;

/// Keeps the polar angle away from the poles where `look_at` degenerates.
const POLAR_EPSILON: f32 = 1e-6;

/// Deltas below this are treated as "at rest".
const REST_EPSILON: f32 = 1e-6;

/// Zoom factor of a single wheel step at `zoom_speed == 1.0`.
const ZOOM_STEP: f32 = 0.95;

#[derive(Clone, Debug)]
pub struct OrbitSettings {
    /// Fraction of the pending rotation applied per frame. `1.0` disables damping.
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub distance: RangeInclusive<f32>,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            distance: 0.0..=f32::INFINITY,
        }
    }
}

/// Orbits a camera around its target.
///
/// Input only records a pending change; [`OrbitControls::update`] must be
/// called once per frame to move the camera. With damping enabled the camera
/// keeps gliding for a few frames after the input stopped.
pub struct OrbitControls {
    settings: OrbitSettings,
    radius: f32,
    /// azimuth around the y-axis, measured from +z towards +x
    theta: f32,
    /// polar angle measured from +y
    phi: f32,
    theta_delta: f32,
    phi_delta: f32,
    scale: f32,
}

impl OrbitControls {
    /// Derives the orbit from the camera's current position relative to its target.
    #[must_use]
    pub fn new(camera: &Camera, settings: OrbitSettings) -> Self {
        let offset = camera.position - camera.look_at;
        let radius = offset.length();
        let (theta, phi) = if radius > 0.0 {
            (
                offset.x.atan2(offset.z),
                (offset.y / radius).clamp(-1.0, 1.0).acos(),
            )
        } else {
            (0.0, PI / 2.0)
        };

        Self {
            settings,
            radius,
            theta,
            phi,
            theta_delta: 0.0,
            phi_delta: 0.0,
            scale: 1.0,
        }
    }

    /// Records a pointer drag of `delta` physical pixels on a viewport of `viewport_height` pixels.
    ///
    /// Dragging across the full viewport height rotates by one full turn.
    pub fn rotate(&mut self, (delta_x, delta_y): (f32, f32), viewport_height: f32) {
        if viewport_height <= 0.0 {
            return;
        }
        let factor = TAU * self.settings.rotate_speed / viewport_height;
        self.theta_delta -= delta_x * factor;
        self.phi_delta -= delta_y * factor;
    }

    /// Records wheel input. Positive `steps` move the camera closer to the target.
    pub fn zoom(&mut self, steps: f32) {
        self.scale *= ZOOM_STEP.powf(self.settings.zoom_speed * steps);
    }

    #[must_use]
    pub fn distance(&self) -> f32 {
        self.radius
    }

    /// Applies the pending input to `camera`.
    ///
    /// Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let damping = self.settings.damping_factor.clamp(f32::EPSILON, 1.0);

        let theta_step = self.theta_delta * damping;
        let phi_step = self.phi_delta * damping;
        let moving = theta_step.abs() > REST_EPSILON
            || phi_step.abs() > REST_EPSILON
            || (self.scale - 1.0).abs() > REST_EPSILON;

        self.theta = (self.theta + theta_step) % TAU;
        self.phi = (self.phi + phi_step).clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        self.radius = (self.radius * self.scale).clamp(
            *self.settings.distance.start(),
            *self.settings.distance.end(),
        );

        self.theta_delta *= 1.0 - damping;
        self.phi_delta *= 1.0 - damping;
        self.scale = 1.0;

        camera.position = camera.look_at + self.offset();
        moving
    }

    fn offset(&self) -> Vec3 {
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_theta, cos_theta) = self.theta.sin_cos();
        Vec3::new(
            self.radius * sin_phi * sin_theta,
            self.radius * cos_phi,
            self.radius * sin_phi * cos_theta,
        )
    }
}
