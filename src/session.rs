//! The wiring session: one object holding everything a lesson needs.
//!
//! [`WiringSession`] owns the component data, the [`HitTester`], the
//! [`WireDrawingEngine`] and the [`ConnectionRuleValidator`], and translates
//! raw pointer events into protocol steps. The host UI keeps a single session
//! per lesson and forwards its events to it.
//!
//! # Example
//!
//! ```
//! use wiring_lab::{
//!     Component, PointerOutcome, RuleKind, Terminal, TerminalKind, WiringConfig, WiringRule,
//!     WiringSession,
//! };
//!
//! let components = vec![
//!     Component::new("supply", "Supply")
//!         .with_terminal(Terminal::new("L1", TerminalKind::Source, 10.0, 10.0)),
//!     Component::new("QF1", "Breaker")
//!         .with_terminal(Terminal::new("QF1-in", TerminalKind::Input, 200.0, 10.0)),
//! ];
//! let rules = vec![WiringRule::new("feed", RuleKind::Sequence).require("L1", "QF1-in")];
//!
//! let mut session = WiringSession::new(WiringConfig::default(), components, rules).unwrap();
//!
//! // Press on L1, drag, press on QF1-in
//! assert!(matches!(session.pointer_down(12.0, 11.0), PointerOutcome::Started(_)));
//! session.pointer_moved(100.0, 12.0);
//! session.frame();
//! assert!(matches!(session.pointer_down(199.0, 10.0), PointerOutcome::Connected(_)));
//!
//! let report = session.report();
//! assert!(report.is_valid);
//! assert_eq!(report.progress, 100);
//! ```

use crate::catalog::{adopt_terminals, validate_components, validate_rules, Catalog};
use crate::config::WiringConfig;
use crate::drawing::WireDrawingEngine;
use crate::error::{DataError, Rejection, SessionError};
use crate::frame::PointerCoalescer;
use crate::hit_test::{HitTester, HoverHandle};
use crate::model::{Component, Point, Terminal, WireConnection, WiringRule};
use crate::rules::{ConnectionRuleValidator, ConnectionVerdict, ValidationReport};

/// What a pointer press did.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerOutcome {
    /// A wire now hangs off this terminal
    Started(Terminal),
    /// The wire was dropped and accepted
    Connected(WireConnection),
    /// The action was refused; the message is for the learner
    Rejected(Rejection),
    /// The wire being drawn was dropped on empty canvas
    Cancelled,
    /// Nothing under the pointer while idle
    Missed,
}

/// What a frame tick changed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameUpdate {
    /// Loose end of the wire being drawn, if any
    pub cursor: Option<Point>,
    /// Whether a hover highlight needs repainting
    pub hover_changed: bool,
}

pub struct WiringSession {
    config: WiringConfig,
    components: Vec<Component>,
    hit_tester: HitTester,
    engine: WireDrawingEngine,
    validator: ConnectionRuleValidator,
    pointer: PointerCoalescer,
}

impl WiringSession {
    /// Build a session, validating configuration and data up front.
    pub fn new(
        config: WiringConfig,
        mut components: Vec<Component>,
        rules: Vec<WiringRule>,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        adopt_terminals(&mut components);
        let terminals = validate_components(&components)?;
        validate_rules(&rules, |id| terminals.contains(id))?;

        let mut hit_tester = HitTester::from_config(&config)?;
        hit_tester.rebuild(&components)?;

        let validator = ConnectionRuleValidator::new(rules)
            .with_optional_entries_excluded(!config.count_optional_requirements);
        let engine = WireDrawingEngine::new()
            .with_completion(config.completion)
            .with_rules(validator.clone())
            .with_wire_color(config.wire_color()?);

        tracing::info!(
            components = components.len(),
            terminals = hit_tester.len(),
            rules = validator.rules().len(),
            "wiring session created"
        );

        Ok(Self {
            config,
            components,
            hit_tester,
            engine,
            validator,
            pointer: PointerCoalescer::new(),
        })
    }

    pub fn from_catalog(config: WiringConfig, catalog: Catalog) -> Result<Self, SessionError> {
        Self::new(config, catalog.components, catalog.rules)
    }

    pub fn config(&self) -> &WiringConfig {
        &self.config
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn rules(&self) -> &[WiringRule] {
        self.validator.rules()
    }

    pub fn hit_tester(&self) -> &HitTester {
        &self.hit_tester
    }

    pub fn engine(&self) -> &WireDrawingEngine {
        &self.engine
    }

    /// Direct access for registering extra checks or binding models.
    pub fn engine_mut(&mut self) -> &mut WireDrawingEngine {
        &mut self.engine
    }

    pub fn connections(&self) -> &[WireConnection] {
        self.engine.connections()
    }

    /// Hover state for highlight rendering. Poll it once per frame.
    pub fn hover(&self) -> HoverHandle {
        self.hit_tester.hover()
    }

    pub fn on_connection_change<F>(&mut self, callback: F)
    where
        F: FnMut(&[WireConnection]) + 'static,
    {
        self.engine.on_connection_change(callback);
    }

    pub fn on_complete<F>(&mut self, callback: F)
    where
        F: FnMut() + 'static,
    {
        self.engine.on_complete(callback);
    }

    /// Swap in a new component set.
    ///
    /// The data is checked against the loaded rules first; on error the
    /// session keeps its previous components. Wires whose terminals vanished
    /// are removed; the return value is how many.
    pub fn replace_components(&mut self, mut components: Vec<Component>) -> Result<usize, DataError> {
        adopt_terminals(&mut components);
        let terminals = validate_components(&components)?;
        validate_rules(self.validator.rules(), |id| terminals.contains(id))?;
        self.hit_tester.rebuild(&components)?;
        self.components = components;

        let hit_tester = &self.hit_tester;
        let dropped = self
            .engine
            .reconcile(|id| hit_tester.find_terminal_by_id(id).cloned());
        if dropped > 0 {
            tracing::warn!(dropped, "component reload removed wires to vanished terminals");
        }
        if let Some(id) = self.hover().wire() {
            if !self.engine.connections().iter().any(|c| c.id == id) {
                self.hover().set_wire(None);
            }
        }
        tracing::info!(
            components = self.components.len(),
            terminals = self.hit_tester.len(),
            "components replaced"
        );
        Ok(dropped)
    }

    /// Handle a press at `(x, y)`.
    ///
    /// While idle a press on a terminal starts a wire. While drawing a press
    /// on a terminal tries to complete it and a press on empty canvas cancels.
    pub fn pointer_down(&mut self, x: f32, y: f32) -> PointerOutcome {
        let target = self.hit_tester.find_clicked(x, y).cloned();

        if self.engine.is_idle() {
            return match target {
                Some(terminal) => match self.engine.start_drawing(&terminal) {
                    Ok(()) => PointerOutcome::Started(terminal),
                    Err(rejection) => PointerOutcome::Rejected(rejection),
                },
                None => PointerOutcome::Missed,
            };
        }

        match target {
            Some(terminal) => match self.engine.complete_drawing(&terminal) {
                Ok(connection) => {
                    self.pointer.discard();
                    PointerOutcome::Connected(connection)
                }
                Err(rejection) => PointerOutcome::Rejected(rejection),
            },
            None => {
                self.cancel();
                PointerOutcome::Cancelled
            }
        }
    }

    /// Queue a pointer move; it is processed on the next [`frame`](Self::frame).
    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        self.pointer.push(Point::new(x, y));
    }

    /// Process the latest queued move, once per display refresh.
    pub fn frame(&mut self) -> FrameUpdate {
        let Some(point) = self.pointer.take() else {
            return FrameUpdate {
                cursor: self.engine.cursor(),
                hover_changed: false,
            };
        };

        self.engine.update_drawing(point);

        let hover = self.hit_tester.hover();
        let before = hover.revision();
        if self.hit_tester.check_hover(point.x, point.y).is_some() {
            hover.set_wire(None);
        } else {
            self.hit_tester
                .check_wire_hover(point.x, point.y, self.engine.connections());
        }

        FrameUpdate {
            cursor: self.engine.cursor(),
            hover_changed: hover.revision() != before,
        }
    }

    /// Abandon the wire being drawn (escape key, focus loss, ...).
    pub fn cancel(&mut self) -> bool {
        self.pointer.discard();
        self.engine.cancel_drawing()
    }

    /// Start a wire at a terminal given by id.
    pub fn start_drawing_at(&mut self, terminal_id: &str) -> Result<(), Rejection> {
        let terminal = self.terminal(terminal_id)?;
        self.engine.start_drawing(&terminal)
    }

    /// Drop the wire being drawn on a terminal given by id.
    pub fn complete_drawing_at(&mut self, terminal_id: &str) -> Result<WireConnection, Rejection> {
        let terminal = self.terminal(terminal_id)?;
        self.engine.complete_drawing(&terminal)
    }

    pub fn remove_connection(&mut self, index: usize) -> Option<WireConnection> {
        self.engine.remove_connection(index)
    }

    pub fn remove_connection_by_id(&mut self, id: &str) -> Option<WireConnection> {
        let removed = self.engine.remove_connection_by_id(id)?;
        if self.hover().wire().as_deref() == Some(id) {
            self.hover().set_wire(None);
        }
        Some(removed)
    }

    /// Evaluate the current wiring against the lesson rules.
    pub fn report(&self) -> ValidationReport {
        self.validator.validate(self.engine.connections())
    }

    /// Cheap check of a wire before it is drawn.
    pub fn validate_candidate(&self, from: &str, to: &str) -> ConnectionVerdict {
        self.validator.validate_connection(from, to)
    }

    fn terminal(&self, id: &str) -> Result<Terminal, Rejection> {
        self.hit_tester
            .find_terminal_by_id(id)
            .cloned()
            .ok_or_else(|| Rejection::UnknownTerminal(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CompletionPolicy, DEFAULT_THRESHOLD};
    use crate::error::ConfigError;
    use crate::model::{RuleKind, TerminalKind};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn components() -> Vec<Component> {
        vec![
            Component::new("supply", "Supply")
                .with_terminal(Terminal::new("L1", TerminalKind::Source, 10.0, 10.0)),
            Component::new("QF1", "Breaker")
                .with_terminal(Terminal::new("QF1-in", TerminalKind::Input, 200.0, 10.0))
                .with_terminal(Terminal::new("QF1-out", TerminalKind::Output, 200.0, 110.0)),
            Component::new("M1", "Motor")
                .with_terminal(Terminal::new("M1-in", TerminalKind::Input, 400.0, 110.0)),
        ]
    }

    fn rules() -> Vec<WiringRule> {
        vec![WiringRule::new("motor", RuleKind::Sequence)
            .require("L1", "QF1-in")
            .require("QF1-out", "M1-in")
            .forbid("L1", "M1-in", "the motor needs the breaker")]
    }

    fn session() -> WiringSession {
        WiringSession::new(WiringConfig::default(), components(), rules()).unwrap()
    }

    // ========================================================================
    // Construction
    // ========================================================================

    #[test]
    fn test_new_indexes_terminals() {
        let session = session();
        assert_eq!(session.hit_tester().len(), 4);
        assert_eq!(session.rules().len(), 1);
        assert_eq!(session.hit_tester().click_threshold(), DEFAULT_THRESHOLD);
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let config = WiringConfig { cell_size: 0.0, ..Default::default() };
        assert!(matches!(
            WiringSession::new(config, components(), rules()),
            Err(SessionError::Config(ConfigError::InvalidCellSize(_)))
        ));
    }

    #[test]
    fn test_new_rejects_rule_with_unknown_terminal() {
        let rules = vec![WiringRule::new("r", RuleKind::Sequence).require("L1", "X9")];
        assert!(matches!(
            WiringSession::new(WiringConfig::default(), components(), rules),
            Err(SessionError::Data(DataError::UnknownTerminal { .. }))
        ));
    }

    // ========================================================================
    // pointer_down()
    // ========================================================================

    #[test]
    fn test_pointer_down_starts_and_completes() {
        let mut session = session();
        assert!(matches!(session.pointer_down(11.0, 10.0), PointerOutcome::Started(ref t) if t.id == "L1"));
        match session.pointer_down(200.0, 12.0) {
            PointerOutcome::Connected(wire) => {
                assert_eq!(wire.from.id, "L1");
                assert_eq!(wire.to.id, "QF1-in");
                assert_eq!(wire.to.component_id, "QF1");
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(session.engine().is_idle());
    }

    #[test]
    fn test_pointer_down_on_input_is_rejected() {
        let mut session = session();
        assert_eq!(
            session.pointer_down(200.0, 10.0),
            PointerOutcome::Rejected(Rejection::InputOrigin)
        );
        assert!(session.engine().is_idle());
    }

    #[test]
    fn test_pointer_down_on_empty_canvas() {
        let mut session = session();
        assert_eq!(session.pointer_down(700.0, 700.0), PointerOutcome::Missed);

        session.pointer_down(10.0, 10.0);
        assert_eq!(session.pointer_down(700.0, 700.0), PointerOutcome::Cancelled);
        assert!(session.engine().is_idle());
        assert!(session.connections().is_empty());
    }

    #[test]
    fn test_rejected_completion_keeps_drawing() {
        let mut session = session();
        session.pointer_down(10.0, 10.0);
        assert_eq!(
            session.pointer_down(10.0, 10.0),
            PointerOutcome::Rejected(Rejection::SameTerminal)
        );
        assert!(!session.engine().is_idle());
    }

    // ========================================================================
    // pointer_moved() / frame()
    // ========================================================================

    #[test]
    fn test_moves_are_coalesced_per_frame() {
        let mut session = session();
        session.start_drawing_at("L1").unwrap();
        session.pointer_moved(50.0, 50.0);
        session.pointer_moved(60.0, 60.0);
        session.pointer_moved(70.0, 65.0);

        // Nothing happens until the frame
        assert_eq!(session.engine().cursor(), Some(Point::new(10.0, 10.0)));
        let update = session.frame();
        assert_eq!(update.cursor, Some(Point::new(70.0, 65.0)));

        let idle_frame = session.frame();
        assert_eq!(idle_frame.cursor, Some(Point::new(70.0, 65.0)));
        assert!(!idle_frame.hover_changed);
    }

    #[test]
    fn test_frame_updates_terminal_hover() {
        let mut session = session();
        let hover = session.hover();

        session.pointer_moved(205.0, 108.0);
        assert!(session.frame().hover_changed);
        assert_eq!(hover.terminal().as_deref(), Some("QF1-out"));

        session.pointer_moved(206.0, 109.0);
        assert!(!session.frame().hover_changed);
    }

    #[test]
    fn test_frame_updates_wire_hover() {
        let mut session = session();
        session.start_drawing_at("L1").unwrap();
        let wire = session.complete_drawing_at("QF1-in").unwrap();
        let hover = session.hover();

        session.pointer_moved(100.0, 14.0);
        session.frame();
        assert_eq!(hover.wire(), Some(wire.id.clone()));
        assert_eq!(hover.terminal(), None);

        // Terminals take precedence over wires
        session.pointer_moved(195.0, 10.0);
        session.frame();
        assert_eq!(hover.terminal().as_deref(), Some("QF1-in"));
        assert_eq!(hover.wire(), None);
    }

    #[test]
    fn test_cancel_discards_pending_move() {
        let mut session = session();
        session.start_drawing_at("L1").unwrap();
        session.pointer_moved(50.0, 50.0);
        assert!(session.cancel());
        assert_eq!(session.frame().cursor, None);
        assert!(!session.cancel());
    }

    // ========================================================================
    // Id-based drawing
    // ========================================================================

    #[test]
    fn test_unknown_terminal_id() {
        let mut session = session();
        assert_eq!(
            session.start_drawing_at("nope"),
            Err(Rejection::UnknownTerminal("nope".into()))
        );
    }

    // ========================================================================
    // Reports
    // ========================================================================

    #[test]
    fn test_report_and_candidates() {
        let mut session = session();
        assert!(!session.report().is_valid);
        assert!(!session.validate_candidate("L1", "M1-in").is_valid());

        session.start_drawing_at("L1").unwrap();
        session.complete_drawing_at("QF1-in").unwrap();
        session.start_drawing_at("QF1-out").unwrap();
        session.complete_drawing_at("M1-in").unwrap();

        let report = session.report();
        assert!(report.is_valid);
        assert_eq!(report.progress, 100);
    }

    #[test]
    fn test_rules_completion_policy() {
        let config = WiringConfig { completion: CompletionPolicy::AllRulesComplete, ..Default::default() };
        let mut session = WiringSession::new(config, components(), rules()).unwrap();
        let fired = Rc::new(RefCell::new(false));
        session.on_complete({
            let fired = fired.clone();
            move || *fired.borrow_mut() = true
        });

        session.start_drawing_at("L1").unwrap();
        session.complete_drawing_at("QF1-in").unwrap();
        assert!(!*fired.borrow());
        session.start_drawing_at("QF1-out").unwrap();
        session.complete_drawing_at("M1-in").unwrap();
        assert!(*fired.borrow());
    }

    // ========================================================================
    // replace_components()
    // ========================================================================

    #[test]
    fn test_replace_components_rejects_missing_rule_terminal() {
        let mut session = session();
        let err = session.replace_components(components()[..2].to_vec()).unwrap_err();
        assert!(matches!(err, DataError::UnknownTerminal { .. }));
        assert_eq!(session.hit_tester().len(), 4);
    }

    #[test]
    fn test_replace_components_prunes_wires() {
        let mut session = WiringSession::new(WiringConfig::default(), components(), vec![]).unwrap();
        session.start_drawing_at("L1").unwrap();
        session.complete_drawing_at("QF1-in").unwrap();
        session.start_drawing_at("QF1-out").unwrap();
        session.complete_drawing_at("M1-in").unwrap();

        let dropped = session.replace_components(components()[..2].to_vec()).unwrap();
        assert_eq!(dropped, 1);
        assert_eq!(session.connections().len(), 1);
        assert_eq!(session.components().len(), 2);
    }

    #[test]
    fn test_remove_by_id_clears_wire_hover() {
        let mut session = session();
        session.start_drawing_at("L1").unwrap();
        let wire = session.complete_drawing_at("QF1-in").unwrap();
        session.pointer_moved(100.0, 12.0);
        session.frame();
        assert_eq!(session.hover().wire(), Some(wire.id.clone()));

        session.remove_connection_by_id(&wire.id);
        assert_eq!(session.hover().wire(), None);
    }
}
