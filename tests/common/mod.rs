//! Common test utilities for integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use wiring_lab::{
    Component, RuleKind, Terminal, TerminalKind, WireConnection, WiringConfig, WiringRule,
    WiringSession,
};

/// The motor lesson used across levels.
///
/// Supply L1 at the top left, breaker QF1 in the middle, motor M1 on the right.
pub const MOTOR_LESSON: &str = r##"{
    "components": [
        { "id": "supply", "name": "Supply", "position": { "x": 0, "y": 0 },
          "terminals": [ { "id": "L1", "label": "L1", "type": "source", "position": { "x": 40, "y": 40 } } ] },
        { "id": "QF1", "name": "Circuit breaker", "color": "#3366ff", "position": { "x": 200, "y": 0 },
          "terminals": [
            { "id": "QF1-in", "label": "1", "type": "input", "position": { "x": 240, "y": 40 } },
            { "id": "QF1-out", "label": "2", "type": "output", "position": { "x": 240, "y": 160 } }
          ] },
        { "id": "M1", "name": "Motor", "color": "#cc3333", "position": { "x": 400, "y": 120 },
          "terminals": [ { "id": "M1-in", "label": "U", "type": "input", "position": { "x": 440, "y": 160 } } ] }
    ],
    "rules": [
        { "id": "motor-circuit", "type": "sequence",
          "required": [ { "from": "L1", "to": "QF1-in" }, { "from": "QF1-out", "to": "M1-in" } ],
          "forbidden": [ { "from": "L1", "to": "M1-in", "reason": "Route the supply through the breaker" } ],
          "feedback": { "success": "Motor wired", "error": "The motor bypasses the breaker" } }
    ]
}"##;

pub fn supply() -> Component {
    Component::new("supply", "Supply")
        .with_terminal(Terminal::new("L1", TerminalKind::Source, 40.0, 40.0).with_label("L1"))
}

pub fn breaker() -> Component {
    Component::new("QF1", "Circuit breaker")
        .at(200.0, 0.0)
        .with_terminal(Terminal::new("QF1-in", TerminalKind::Input, 240.0, 40.0).with_label("1"))
        .with_terminal(Terminal::new("QF1-out", TerminalKind::Output, 240.0, 160.0).with_label("2"))
}

pub fn motor() -> Component {
    Component::new("M1", "Motor")
        .at(400.0, 120.0)
        .with_terminal(Terminal::new("M1-in", TerminalKind::Input, 440.0, 160.0).with_label("U"))
}

pub fn components() -> Vec<Component> {
    vec![supply(), breaker(), motor()]
}

pub fn motor_rule() -> WiringRule {
    WiringRule::new("motor-circuit", RuleKind::Sequence)
        .require("L1", "QF1-in")
        .require("QF1-out", "M1-in")
        .forbid("L1", "M1-in", "Route the supply through the breaker")
}

pub fn session() -> WiringSession {
    WiringSession::new(WiringConfig::default(), components(), vec![motor_rule()])
        .expect("motor lesson is valid")
}

/// Press on `from`, then press on `to`, using terminal coordinates.
pub fn click_wire(session: &mut WiringSession, from: &str, to: &str) {
    session
        .start_drawing_at(from)
        .unwrap_or_else(|e| panic!("start at {from}: {e}"));
    session
        .complete_drawing_at(to)
        .unwrap_or_else(|e| panic!("{from} -> {to}: {e}"));
}

/// Tracks callback invocations for testing.
#[derive(Default, Clone)]
pub struct CallbackTracker {
    /// Connection count seen by each `on_connection_change` call
    pub connection_changes: Rc<RefCell<Vec<usize>>>,
    /// Ids of the connections at the last change
    pub last_ids: Rc<RefCell<Vec<String>>>,
    /// Count of `on_complete` calls
    pub completed: Rc<RefCell<usize>>,
}

impl CallbackTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register both callbacks on `session`.
    pub fn attach(&self, session: &mut WiringSession) {
        let changes = self.connection_changes.clone();
        let ids = self.last_ids.clone();
        session.on_connection_change(move |wires: &[WireConnection]| {
            changes.borrow_mut().push(wires.len());
            *ids.borrow_mut() = wires.iter().map(|w| w.id.clone()).collect();
        });
        let completed = self.completed.clone();
        session.on_complete(move || *completed.borrow_mut() += 1);
    }

    /// Clear all recorded callbacks.
    pub fn clear(&self) {
        self.connection_changes.borrow_mut().clear();
        self.last_ids.borrow_mut().clear();
        *self.completed.borrow_mut() = 0;
    }

    pub fn change_count(&self) -> usize {
        self.connection_changes.borrow().len()
    }

    pub fn completed(&self) -> usize {
        *self.completed.borrow()
    }
}
