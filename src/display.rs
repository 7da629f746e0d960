//! Presentation of controller state.
//!
//! The acquisition core knows nothing about colours; a display sink loads a
//! [`Theme`] (usually from JSON) and turns each
//! [`LocationSnapshot`](crate::location::LocationSnapshot) into a [`Panel`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::location::{LocationSnapshot, Reading};

/// An RGBA colour with an opacity between 0 and 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Opacity.
    pub a: f32,
}

impl Rgba {
    /// Creates a colour from its channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {:.1})", self.r, self.g, self.b, self.a)
    }
}

/// Colours used by a display sink.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    /// Application background.
    pub primary: Rgba,
    /// Background of the location panel.
    pub accent: Rgba,
    /// Background of the error panel.
    pub error: Rgba,
    /// Text colour on both panels.
    pub text: Rgba,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: Rgba::new(23, 80, 54, 1.0),
            accent: Rgba::new(193, 175, 108, 1.0),
            error: Rgba::new(255, 0, 0, 0.8),
            text: Rgba::new(255, 255, 255, 1.0),
        }
    }
}

impl Theme {
    /// Parses a theme from JSON; missing colours keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not a valid theme.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Which panel a snapshot renders to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    /// A failure message.
    Error,
    /// The latest reading, or nothing yet.
    Location,
}

/// A rendered view of one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    /// Which panel to show.
    pub kind: PanelKind,
    /// Background of the view the panel sits in.
    pub app_background: Rgba,
    /// Panel background.
    pub background: Rgba,
    /// Text colour.
    pub foreground: Rgba,
    /// Panel text.
    pub text: String,
}

impl Panel {
    /// Renders a snapshot. A failure takes precedence over any reading.
    #[must_use]
    pub fn render(snapshot: &LocationSnapshot, theme: &Theme) -> Self {
        if let Some(message) = snapshot.failure_message() {
            return Self {
                kind: PanelKind::Error,
                app_background: theme.primary,
                background: theme.error,
                foreground: theme.text,
                text: message,
            };
        }

        Self {
            kind: PanelKind::Location,
            app_background: theme.primary,
            background: theme.accent,
            foreground: theme.text,
            text: snapshot
                .reading
                .as_ref()
                .map(reading_json)
                .unwrap_or_default(),
        }
    }
}

fn reading_json(reading: &Reading) -> String {
    // Reading holds only numbers and options, which always serialize
    serde_json::to_string(reading).unwrap_or_default()
}
