//! # Wiring Lab
//!
//! Interactive core of an educational electrical-wiring simulator. Learners
//! drag wires between component terminals on a canvas; the crate decides what
//! the pointer is over, runs the wire-drawing protocol and grades the result
//! against the lesson's wiring rules.
//!
//! ## Features
//!
//! - **Grid Indexed Hit Testing** - Terminals live in a uniform-grid [`SpatialIndex`],
//!   so click and hover lookups touch only nearby cells
//! - **Out-of-band Hover** - Hover ids are published through a [`HoverHandle`]
//!   instead of a reactive property, polled once per frame
//! - **Pluggable Connection Checks** - Direction and duplicate checks are built in;
//!   add your own through the [`ConnectionCheck`] trait
//! - **Rule Grading** - Required sequences, forbidden pairs, short-circuit warnings
//!   and a progress percentage via [`ConnectionRuleValidator`]
//! - **Slint Ready** - Wire colors are [`slint::Color`] and the connection list can be
//!   mirrored into a `VecModel` with [`WireDrawingEngine::bind_model`]
//!
//! ## Core Types
//!
//! - [`WiringSession`] - Owns a lesson and turns pointer events into protocol steps
//! - [`HitTester`] - Terminal and wire hit testing
//! - [`WireDrawingEngine`] - The start / update / complete / cancel state machine
//! - [`ConnectionRuleValidator`] - Grades the connection list
//! - [`Catalog`] - Lesson data loaded from JSON
//! - [`WiringConfig`] - Thresholds, grid cell size and completion policy
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events (`debug` for protocol steps, `trace` for
//! hover changes, `info`/`warn` for session lifecycle). Install any subscriber
//! to see them.

pub mod catalog;
pub mod checks;
pub mod config;
pub mod drawing;
pub mod error;
pub mod frame;
pub mod model;
pub mod rules;
pub mod session;
pub mod spatial;

pub use catalog::{components_from_json, rules_from_json, Catalog};
pub use checks::{
    duplicate_connection_exists, CompositeCheck, ConnectionCheck, DirectionCheck,
    DistinctComponentsCheck, ForbiddenPairsCheck, NoDuplicatesCheck,
};
pub use config::{CompletionPolicy, WiringConfig};
pub use drawing::{DrawingSession, DrawingState, WireDrawingEngine};
pub use error::{ConfigError, DataError, Rejection, SessionError};
pub use frame::PointerCoalescer;
pub use hit_test::{distance_to_segment, find_wire_at, HitTester, HoverHandle, HoverState};
pub use model::{
    parse_color, Component, ForbiddenConnection, Point, RequiredConnection, RuleFeedback,
    RuleKind, SpatialObject, Terminal, TerminalKind, WireConnection, WireStyle, WiringRule,
};
pub use rules::{ConnectionRuleValidator, ConnectionVerdict, RuleError, RuleWarning, ValidationReport};
pub use session::{FrameUpdate, PointerOutcome, WiringSession};
pub use spatial::SpatialIndex;
