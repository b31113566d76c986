//! Data model shared by the index, the drawing engine and the rule validator.
//!
//! Component and rule records deserialize from the JSON-shaped data the
//! trainer's lessons are written in (see [`crate::catalog`]).

use crate::error::DataError;
use serde::{Deserialize, Deserializer, Serialize};
use slint::Color;
use std::fmt;

/// A position in the trainer's 2D coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// Trait for anything the spatial index can hold.
///
/// The id is the identity: an index never holds two objects with the same id.
pub trait SpatialObject {
    fn id(&self) -> &str;
    fn position(&self) -> Point;
}

/// Electrical role of a terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerminalKind {
    /// Supply terminal (e.g. a phase conductor)
    Source,
    /// Terminal that receives a wire
    Input,
    /// Terminal that feeds a wire onwards
    Output,
}

impl TerminalKind {
    /// Whether a wire may start at a terminal of this kind.
    pub fn can_originate(self) -> bool {
        !matches!(self, TerminalKind::Input)
    }
}

impl fmt::Display for TerminalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// A connectable point on a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Terminal {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type")]
    pub kind: TerminalKind,
    pub position: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Id of the owning component. Filled in when the terminal is indexed.
    #[serde(default)]
    pub component_id: String,
}

impl Terminal {
    pub fn new(id: impl Into<String>, kind: TerminalKind, x: f32, y: f32) -> Self {
        Self {
            id: id.into(),
            label: String::new(),
            kind,
            position: Point::new(x, y),
            style: None,
            component_id: String::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

impl SpatialObject for Terminal {
    fn id(&self) -> &str {
        &self.id
    }

    fn position(&self) -> Point {
        self.position
    }
}

/// A placed device (breaker, motor, lamp, ...) owning its terminals.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Component {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: Point,
    #[serde(default = "default_component_color", deserialize_with = "deserialize_color")]
    pub color: Color,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub terminals: Vec<Terminal>,
}

impl Component {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position: Point::default(),
            color: default_component_color(),
            icon: None,
            style: None,
            terminals: Vec::new(),
        }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.position = Point::new(x, y);
        self
    }

    /// Add a terminal, taking ownership of it.
    pub fn with_terminal(mut self, mut terminal: Terminal) -> Self {
        terminal.component_id = self.id.clone();
        self.terminals.push(terminal);
        self
    }
}

fn default_component_color() -> Color {
    Color::from_rgb_u8(200, 200, 200)
}

/// Visual attributes of a wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WireStyle {
    pub line_width: f32,
}

impl Default for WireStyle {
    fn default() -> Self {
        Self { line_width: 2.0 }
    }
}

/// A directed wire between two terminals.
#[derive(Debug, Clone, PartialEq)]
pub struct WireConnection {
    pub id: String,
    pub from: Terminal,
    pub to: Terminal,
    pub color: Color,
    pub style: WireStyle,
}

impl WireConnection {
    /// Whether this wire joins exactly `from` -> `to`.
    pub fn joins(&self, from: &str, to: &str) -> bool {
        self.from.id == from && self.to.id == to
    }
}

/// How the entries of a rule relate to each other. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    #[default]
    Sequence,
    Parallel,
    Custom,
}

/// A connection a rule expects to be present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredConnection {
    pub from: String,
    pub to: String,
    #[serde(default = "default_true")]
    pub required: bool,
}

/// A connection a rule treats as a wiring fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForbiddenConnection {
    pub from: String,
    pub to: String,
    pub reason: String,
}

/// Messages shown to the learner for a rule.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RuleFeedback {
    #[serde(default)]
    pub success: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

/// Declarative wiring rule of a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WiringRule {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: RuleKind,
    #[serde(default)]
    pub required: Vec<RequiredConnection>,
    #[serde(default)]
    pub forbidden: Vec<ForbiddenConnection>,
    #[serde(default)]
    pub feedback: RuleFeedback,
}

impl WiringRule {
    pub fn new(id: impl Into<String>, kind: RuleKind) -> Self {
        Self {
            id: id.into(),
            kind,
            required: Vec::new(),
            forbidden: Vec::new(),
            feedback: RuleFeedback::default(),
        }
    }

    pub fn require(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.required.push(RequiredConnection {
            from: from.into(),
            to: to.into(),
            required: true,
        });
        self
    }

    pub fn allow(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.required.push(RequiredConnection {
            from: from.into(),
            to: to.into(),
            required: false,
        });
        self
    }

    pub fn forbid(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        self.forbidden.push(ForbiddenConnection {
            from: from.into(),
            to: to.into(),
            reason: reason.into(),
        });
        self
    }

    /// Every terminal id this rule mentions.
    pub fn terminal_ids(&self) -> impl Iterator<Item = &str> {
        self.required
            .iter()
            .flat_map(|r| [r.from.as_str(), r.to.as_str()])
            .chain(self.forbidden.iter().flat_map(|f| [f.from.as_str(), f.to.as_str()]))
    }
}

fn default_true() -> bool {
    true
}

/// Parse `#rrggbb` or `#rrggbbaa`.
pub fn parse_color(text: &str) -> Result<Color, DataError> {
    let invalid = || DataError::InvalidColor(text.to_string());
    let hex = text.strip_prefix('#').ok_or_else(invalid)?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) || (hex.len() != 6 && hex.len() != 8) {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    let (r, g, b) = (channel(0)?, channel(2)?, channel(4)?);
    let a = if hex.len() == 8 { channel(6)? } else { 255 };
    Ok(Color::from_argb_u8(a, r, g, b))
}

fn deserialize_color<'de, D>(deserializer: D) -> Result<Color, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_color(&text).map_err(serde::de::Error::custom)
}
