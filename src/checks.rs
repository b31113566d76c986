//! Checks run when a wire is dropped on a target terminal.
//!
//! Each check implements [`ConnectionCheck`]. The drawing engine always runs
//! [`DirectionCheck`] followed by [`NoDuplicatesCheck`]; hosts may append their
//! own checks (for instance [`ForbiddenPairsCheck`] to refuse wires a lesson
//! forbids instead of reporting them afterwards).

use crate::error::Rejection;
use crate::model::{Terminal, TerminalKind, WireConnection};
use crate::rules::{ConnectionRuleValidator, ConnectionVerdict};

/// Trait for a single check on a candidate wire `anchor` -> `target`.
///
/// # Example
///
/// ```
/// use wiring_lab::{ConnectionCheck, Rejection, Terminal, WireConnection};
///
/// struct MaxFanOut(usize);
///
/// impl ConnectionCheck for MaxFanOut {
///     fn check(
///         &self,
///         anchor: &Terminal,
///         _target: &Terminal,
///         connections: &[WireConnection],
///     ) -> Result<(), Rejection> {
///         let used = connections.iter().filter(|c| c.from.id == anchor.id).count();
///         if used >= self.0 {
///             return Err(Rejection::Forbidden {
///                 rule_id: "fan-out".into(),
///                 reason: "this terminal is already fully wired".into(),
///             });
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait ConnectionCheck {
    fn check(
        &self,
        anchor: &Terminal,
        target: &Terminal,
        connections: &[WireConnection],
    ) -> Result<(), Rejection>;
}

/// Whether a wire `from` -> `to` already exists. Direction matters.
pub fn duplicate_connection_exists(from: &str, to: &str, connections: &[WireConnection]) -> bool {
    connections.iter().any(|c| c.joins(from, to))
}

/// Terminal identity and type rules.
///
/// 1. the target must not be the anchor
/// 2. anchor and target must be of different kinds
/// 3. the anchor must not be an input
///
/// Only equal kinds are refused, so source -> output and output -> source
/// pass this check.
#[derive(Clone, Copy, Debug, Default)]
pub struct DirectionCheck;

impl ConnectionCheck for DirectionCheck {
    fn check(
        &self,
        anchor: &Terminal,
        target: &Terminal,
        _connections: &[WireConnection],
    ) -> Result<(), Rejection> {
        if target.id == anchor.id {
            return Err(Rejection::SameTerminal);
        }
        if target.kind == anchor.kind {
            return Err(Rejection::SameKind(anchor.kind));
        }
        if anchor.kind == TerminalKind::Input {
            return Err(Rejection::InputAnchor);
        }
        Ok(())
    }
}

/// Refuses a second wire with the same endpoints.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDuplicatesCheck;

impl ConnectionCheck for NoDuplicatesCheck {
    fn check(
        &self,
        anchor: &Terminal,
        target: &Terminal,
        connections: &[WireConnection],
    ) -> Result<(), Rejection> {
        if duplicate_connection_exists(&anchor.id, &target.id, connections) {
            return Err(Rejection::DuplicateConnection);
        }
        Ok(())
    }
}

/// Refuses wires between two terminals of the same component.
#[derive(Clone, Copy, Debug, Default)]
pub struct DistinctComponentsCheck;

impl ConnectionCheck for DistinctComponentsCheck {
    fn check(
        &self,
        anchor: &Terminal,
        target: &Terminal,
        _connections: &[WireConnection],
    ) -> Result<(), Rejection> {
        if !anchor.component_id.is_empty() && anchor.component_id == target.component_id {
            return Err(Rejection::SameComponent);
        }
        Ok(())
    }
}

/// Refuses wires a rule lists as forbidden.
#[derive(Clone, Debug)]
pub struct ForbiddenPairsCheck {
    validator: ConnectionRuleValidator,
}

impl ForbiddenPairsCheck {
    pub fn new(validator: ConnectionRuleValidator) -> Self {
        Self { validator }
    }
}

impl ConnectionCheck for ForbiddenPairsCheck {
    fn check(
        &self,
        anchor: &Terminal,
        target: &Terminal,
        _connections: &[WireConnection],
    ) -> Result<(), Rejection> {
        match self.validator.validate_connection(&anchor.id, &target.id) {
            ConnectionVerdict::Valid => Ok(()),
            ConnectionVerdict::Forbidden { rule_id, reason } => {
                Err(Rejection::Forbidden { rule_id, reason })
            }
        }
    }
}

/// Runs checks in the order they were added; the first refusal wins.
#[derive(Default)]
pub struct CompositeCheck {
    checks: Vec<Box<dyn ConnectionCheck>>,
}

impl CompositeCheck {
    pub fn new() -> Self {
        Self::default()
    }

    /// The checks every wire must pass.
    pub fn standard() -> Self {
        Self::new().add(DirectionCheck).add(NoDuplicatesCheck)
    }

    pub fn add<C: ConnectionCheck + 'static>(mut self, check: C) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    pub fn push<C: ConnectionCheck + 'static>(&mut self, check: C) {
        self.checks.push(Box::new(check));
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

impl ConnectionCheck for CompositeCheck {
    fn check(
        &self,
        anchor: &Terminal,
        target: &Terminal,
        connections: &[WireConnection],
    ) -> Result<(), Rejection> {
        self.checks
            .iter()
            .try_for_each(|check| check.check(anchor, target, connections))
    }
}
