//! Error and rejection types.
//!
//! Three concerns are kept apart:
//!
//! - [`Rejection`] - a user action that was refused (wrong terminal type,
//!   duplicate wire, ...). Non-fatal; the state is left unchanged and the
//!   `Display` text is the advisory shown to the learner.
//! - [`DataError`] - malformed component or rule data. Fatal to that load.
//! - [`ConfigError`] - invalid session configuration.

use crate::model::TerminalKind;
use thiserror::Error;

/// Reasons why a wire-drawing action was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Wires may only start at a source or output terminal
    #[error("wires must start at a source or output terminal")]
    InputOrigin,
    /// `start_drawing` while a wire is already being drawn
    #[error("a wire is already being drawn")]
    AlreadyDrawing,
    /// `complete_drawing` without an active wire
    #[error("no wire is being drawn")]
    NotDrawing,
    /// Target is the anchor itself
    #[error("cannot connect to same terminal")]
    SameTerminal,
    /// Anchor and target have the same terminal type
    #[error("cannot connect two {0} terminals")]
    SameKind(TerminalKind),
    /// Anchor is an input terminal
    #[error("a wire cannot originate from an input terminal")]
    InputAnchor,
    /// A wire with the same endpoints already exists
    #[error("connection already exists")]
    DuplicateConnection,
    /// Both terminals belong to the same component
    #[error("cannot connect terminals of the same component")]
    SameComponent,
    /// No terminal with this id in the session
    #[error("unknown terminal `{0}`")]
    UnknownTerminal(String),
    /// A wiring rule forbids this pair
    #[error("{reason}")]
    Forbidden { rule_id: String, reason: String },
}

/// Malformed component or rule data.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("duplicate component id `{0}`")]
    DuplicateComponent(String),
    #[error("duplicate terminal id `{id}` (components `{first}` and `{second}`)")]
    DuplicateTerminal {
        id: String,
        first: String,
        second: String,
    },
    #[error("duplicate rule id `{0}`")]
    DuplicateRule(String),
    #[error("terminal `{0}` has a non-finite position")]
    NonFinitePosition(String),
    #[error("rule `{rule_id}` references unknown terminal `{terminal_id}`")]
    UnknownTerminal {
        rule_id: String,
        terminal_id: String,
    },
    #[error("invalid color `{0}`, expected #rrggbb or #rrggbbaa")]
    InvalidColor(String),
    #[error("malformed data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Invalid session configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cell size must be a positive finite number, got {0}")]
    InvalidCellSize(f32),
    #[error("{name} must be a non-negative finite number, got {value}")]
    InvalidThreshold { name: &'static str, value: f32 },
    #[error(transparent)]
    Color(#[from] DataError),
    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Anything that can go wrong while building or reloading a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Data(#[from] DataError),
}
