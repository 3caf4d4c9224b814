use glam::Vec2;
use log::trace;
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    keyboard::Key,
};

use crate::session::Direction;

/// Pixels of trackpad scrolling that count as one wheel step.
const PIXELS_PER_LINE: f32 = 100.0;

/// A request to show a different model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Next,
    Previous,
}

impl Intent {
    #[must_use]
    pub fn direction(self) -> Direction {
        match self {
            Intent::Next => Direction::Forward,
            Intent::Previous => Direction::Backward,
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "n" => Some(Intent::Next),
            "p" => Some(Intent::Previous),
            _ => None,
        }
    }
}

/// Axis-aligned rectangle in physical pixels, origin at the top left corner of the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        (self.min.x..=self.max.x).contains(&point.x) && (self.min.y..=self.max.y).contains(&point.y)
    }
}

/// Layout of the "previous" and "next" buttons in the lower corners of the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ButtonBar {
    pub size: Vec2,
    pub margin: f32,
}

impl Default for ButtonBar {
    fn default() -> Self {
        Self {
            size: Vec2::new(96.0, 48.0),
            margin: 16.0,
        }
    }
}

impl ButtonBar {
    #[must_use]
    pub fn buttons(&self, surface: PhysicalSize<u32>) -> [(Intent, Rect); 2] {
        #[expect(clippy::cast_precision_loss, reason = "window sizes fit into f32")]
        let surface = Vec2::new(surface.width as f32, surface.height as f32);
        let bottom = surface.y - self.margin;

        let previous = Rect {
            min: Vec2::new(self.margin, bottom - self.size.y),
            max: Vec2::new(self.margin + self.size.x, bottom),
        };
        let next = Rect {
            min: Vec2::new(surface.x - self.margin - self.size.x, bottom - self.size.y),
            max: Vec2::new(surface.x - self.margin, bottom),
        };
        [(Intent::Previous, previous), (Intent::Next, next)]
    }

    #[must_use]
    pub fn hit_test(&self, surface: PhysicalSize<u32>, point: Vec2) -> Option<Intent> {
        self.buttons(surface)
            .into_iter()
            .find_map(|(intent, rect)| rect.contains(point).then_some(intent))
    }
}

/// What the renderer should do in response to an input event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputAction {
    Navigate(Intent),
    /// cursor movement in pixels while dragging
    Orbit(f32, f32),
    /// wheel steps, positive values zoom in
    Zoom(f32),
}

/// Turns raw window events into [`InputAction`]s.
#[derive(Debug, Default)]
pub struct InputRouter {
    buttons: ButtonBar,
    cursor: Option<Vec2>,
    dragging: bool,
}

impl InputRouter {
    #[must_use]
    pub fn new(buttons: ButtonBar) -> Self {
        Self {
            buttons,
            cursor: None,
            dragging: false,
        }
    }

    #[must_use]
    pub fn buttons(&self) -> &ButtonBar {
        &self.buttons
    }

    pub fn handle(
        &mut self,
        event: &WindowEvent,
        surface: PhysicalSize<u32>,
    ) -> Option<InputAction> {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Character(key),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => self.key_pressed(key),
            WindowEvent::MouseInput { state, button, .. } => {
                self.mouse_button(*button, *state, surface)
            }
            WindowEvent::CursorMoved { position, .. } => {
                #[expect(clippy::cast_possible_truncation, reason = "pixel positions fit into f32")]
                let position = Vec2::new(position.x as f32, position.y as f32);
                self.cursor_moved(position)
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                self.dragging = false;
                None
            }
            WindowEvent::MouseWheel { delta, .. } => {
                #[expect(clippy::cast_possible_truncation, reason = "scroll deltas are small")]
                let steps = match *delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32 / PIXELS_PER_LINE,
                };
                self.mouse_wheel(steps)
            }
            _ => None,
        }
    }

    pub fn key_pressed(&mut self, key: &str) -> Option<InputAction> {
        let intent = Intent::from_key(key)?;
        trace!("key {key:?} -> {intent:?}");
        Some(InputAction::Navigate(intent))
    }

    pub fn mouse_button(
        &mut self,
        button: MouseButton,
        state: ElementState,
        surface: PhysicalSize<u32>,
    ) -> Option<InputAction> {
        if button != MouseButton::Left {
            return None;
        }
        match state {
            ElementState::Pressed => {
                let intent = self
                    .cursor
                    .and_then(|cursor| self.buttons.hit_test(surface, cursor));
                match intent {
                    Some(intent) => {
                        trace!("button click -> {intent:?}");
                        Some(InputAction::Navigate(intent))
                    }
                    None => {
                        self.dragging = true;
                        None
                    }
                }
            }
            ElementState::Released => {
                self.dragging = false;
                None
            }
        }
    }

    pub fn cursor_moved(&mut self, position: Vec2) -> Option<InputAction> {
        let previous = self.cursor.replace(position)?;
        if !self.dragging {
            return None;
        }
        let delta = position - previous;
        Some(InputAction::Orbit(delta.x, delta.y))
    }

    pub fn mouse_wheel(&mut self, steps: f32) -> Option<InputAction> {
        (steps != 0.0).then_some(InputAction::Zoom(steps))
    }
}
