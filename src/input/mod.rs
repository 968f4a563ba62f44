//! # Camera Input
//!
//! Two mutually exclusive handlers mutate the camera orientation record and
//! position:
//!
//! - [`DesktopControls`] - pointer-lock mouse look plus WASD/Space/C movement
//! - [`TouchControls`] - single-finger rotate, two-finger pan and pinch
//!
//! The handler is chosen once at startup from [`InputModePreference`].

pub mod desktop;
pub mod touch;

use serde::{Deserialize, Serialize};

pub use desktop::{DesktopControls, DesktopSettings, EscapeAction, PointerLockRequest};
pub use touch::{TouchControls, TouchSettings};

/// Requested input mode as written in config or on the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InputModePreference {
    #[default]
    Auto,
    Desktop,
    Touch,
}

impl InputModePreference {
    pub fn resolve(self) -> InputMode {
        match self {
            InputModePreference::Auto => InputMode::platform_default(),
            InputModePreference::Desktop => InputMode::Desktop,
            InputModePreference::Touch => InputMode::Touch,
        }
    }
}

/// The input handler active for the lifetime of the app
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Desktop,
    Touch,
}

impl InputMode {
    /// Touch on touch-first platforms, desktop everywhere else
    pub fn platform_default() -> Self {
        if cfg!(any(target_os = "android", target_os = "ios")) {
            InputMode::Touch
        } else {
            InputMode::Desktop
        }
    }
}

pub enum Controls {
    Desktop(DesktopControls),
    Touch(TouchControls),
}

impl Controls {
    pub fn new(
        mode: InputMode,
        desktop: DesktopSettings,
        touch: TouchSettings,
        invert_mouse: bool,
    ) -> Self {
        match mode {
            InputMode::Desktop => Controls::Desktop(DesktopControls::new(desktop, invert_mouse)),
            InputMode::Touch => Controls::Touch(TouchControls::new(touch)),
        }
    }

    pub fn mode(&self) -> InputMode {
        match self {
            Controls::Desktop(_) => InputMode::Desktop,
            Controls::Touch(_) => InputMode::Touch,
        }
    }

    pub fn desktop(&self) -> Option<&DesktopControls> {
        match self {
            Controls::Desktop(desktop) => Some(desktop),
            Controls::Touch(_) => None,
        }
    }

    pub fn desktop_mut(&mut self) -> Option<&mut DesktopControls> {
        match self {
            Controls::Desktop(desktop) => Some(desktop),
            Controls::Touch(_) => None,
        }
    }
}
