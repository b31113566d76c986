//! The interactive wire-drawing protocol.
//!
//! [`WireDrawingEngine`] is a two-state machine: `Idle` until the user grabs a
//! source or output terminal, then `Drawing` while the loose wire follows the
//! pointer, until it is dropped on a target or cancelled. The engine owns the
//! list of confirmed connections and is the only place they are created.
//!
//! # Example
//!
//! ```
//! use wiring_lab::{Terminal, TerminalKind, WireDrawingEngine};
//!
//! let l1 = Terminal::new("L1", TerminalKind::Source, 0.0, 0.0);
//! let qf1 = Terminal::new("QF1-in", TerminalKind::Input, 100.0, 0.0);
//!
//! let mut engine = WireDrawingEngine::new();
//! engine.on_connection_change(|wires| println!("{} wires", wires.len()));
//!
//! engine.start_drawing(&l1).unwrap();
//! engine.update_drawing((50.0, 10.0).into());
//! let wire = engine.complete_drawing(&qf1).unwrap();
//! assert_eq!(wire.from.id, "L1");
//! assert!(engine.is_idle());
//! ```

use crate::checks::{CompositeCheck, ConnectionCheck, DirectionCheck};
use crate::config::CompletionPolicy;
use crate::error::Rejection;
use crate::model::{Point, Terminal, WireConnection, WireStyle};
use crate::rules::ConnectionRuleValidator;
use slint::{Color, Model, VecModel};
use std::rc::Rc;

/// Internal trait for auto-syncing the connection list to Slint models.
trait ModelSyncer {
    fn sync(&self, connections: &[WireConnection]);
}

struct ConcreteModelSyncer<P, F> {
    model: Rc<VecModel<P>>,
    constructor: F,
}

impl<P, F> ModelSyncer for ConcreteModelSyncer<P, F>
where
    P: Clone + 'static,
    F: Fn(&WireConnection) -> P,
{
    fn sync(&self, connections: &[WireConnection]) {
        for (i, connection) in connections.iter().enumerate() {
            let item = (self.constructor)(connection);
            if i < self.model.row_count() {
                self.model.set_row_data(i, item);
            } else {
                self.model.push(item);
            }
        }
        while self.model.row_count() > connections.len() {
            self.model.remove(self.model.row_count() - 1);
        }
    }
}

/// Protocol state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawingState {
    Idle,
    Drawing,
}

/// The in-progress wire: where it started and where the pointer is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawingSession {
    anchor: Option<Terminal>,
    cursor: Option<Point>,
}

impl DrawingSession {
    pub fn is_active(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn anchor(&self) -> Option<&Terminal> {
        self.anchor.as_ref()
    }

    pub fn cursor(&self) -> Option<Point> {
        self.cursor
    }

    fn reset(&mut self) {
        self.anchor = None;
        self.cursor = None;
    }
}

type ConnectionsCallback = Box<dyn FnMut(&[WireConnection])>;
type CompleteCallback = Box<dyn FnMut()>;

/// Drives drawing and owns the confirmed connections.
pub struct WireDrawingEngine {
    session: DrawingSession,
    connections: Vec<WireConnection>,
    next_id: u64,
    checks: CompositeCheck,
    extra_checks: CompositeCheck,
    completion: CompletionPolicy,
    rules: ConnectionRuleValidator,
    wire_color: Color,
    wire_style: WireStyle,
    on_connection_change: Option<ConnectionsCallback>,
    on_complete: Option<CompleteCallback>,
    syncers: Vec<Box<dyn ModelSyncer>>,
}

impl Default for WireDrawingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl WireDrawingEngine {
    pub fn new() -> Self {
        Self {
            session: DrawingSession::default(),
            connections: Vec::new(),
            next_id: 1,
            checks: CompositeCheck::standard(),
            extra_checks: CompositeCheck::new(),
            completion: CompletionPolicy::default(),
            rules: ConnectionRuleValidator::default(),
            wire_color: Color::from_rgb_u8(255, 204, 51),
            wire_style: WireStyle::default(),
            on_connection_change: None,
            on_complete: None,
            syncers: Vec::new(),
        }
    }

    pub fn with_completion(mut self, completion: CompletionPolicy) -> Self {
        self.completion = completion;
        self
    }

    /// Rules consulted by [`CompletionPolicy::AllRulesComplete`].
    pub fn with_rules(mut self, rules: ConnectionRuleValidator) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_wire_color(mut self, color: Color) -> Self {
        self.wire_color = color;
        self
    }

    pub fn with_wire_style(mut self, style: WireStyle) -> Self {
        self.wire_style = style;
        self
    }

    /// Append a check run after the built-in ones on every completion.
    pub fn add_check<C: ConnectionCheck + 'static>(&mut self, check: C) {
        self.extra_checks.push(check);
    }

    pub fn set_rules(&mut self, rules: ConnectionRuleValidator) {
        self.rules = rules;
    }

    /// Called with the full list after every add or remove.
    pub fn on_connection_change<F>(&mut self, callback: F)
    where
        F: FnMut(&[WireConnection]) + 'static,
    {
        self.on_connection_change = Some(Box::new(callback));
    }

    /// Called when the completion policy is met after a new connection.
    pub fn on_complete<F>(&mut self, callback: F)
    where
        F: FnMut() + 'static,
    {
        self.on_complete = Some(Box::new(callback));
    }

    /// Bind a Slint model that mirrors the connection list.
    ///
    /// The model is filled immediately and kept in sync on every change.
    ///
    /// ```
    /// use std::rc::Rc;
    /// use slint::{Model, VecModel};
    /// use wiring_lab::WireDrawingEngine;
    ///
    /// let mut engine = WireDrawingEngine::new();
    /// let ids = Rc::new(VecModel::<String>::default());
    /// engine.bind_model(ids.clone(), |wire| wire.id.clone());
    /// assert_eq!(ids.row_count(), 0);
    /// ```
    pub fn bind_model<P, F>(&mut self, model: Rc<VecModel<P>>, constructor: F)
    where
        P: Clone + 'static,
        F: Fn(&WireConnection) -> P + 'static,
    {
        let syncer = ConcreteModelSyncer { model, constructor };
        syncer.sync(&self.connections);
        self.syncers.push(Box::new(syncer));
    }

    pub fn state(&self) -> DrawingState {
        if self.session.is_active() {
            DrawingState::Drawing
        } else {
            DrawingState::Idle
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state() == DrawingState::Idle
    }

    pub fn session(&self) -> &DrawingSession {
        &self.session
    }

    pub fn anchor(&self) -> Option<&Terminal> {
        self.session.anchor()
    }

    pub fn cursor(&self) -> Option<Point> {
        self.session.cursor()
    }

    pub fn connections(&self) -> &[WireConnection] {
        &self.connections
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Grab `terminal` as the anchor of a new wire.
    pub fn start_drawing(&mut self, terminal: &Terminal) -> Result<(), Rejection> {
        if self.session.is_active() {
            tracing::debug!(terminal = %terminal.id, "start refused: already drawing");
            return Err(Rejection::AlreadyDrawing);
        }
        if !terminal.kind.can_originate() {
            tracing::debug!(terminal = %terminal.id, "start refused: input terminal");
            return Err(Rejection::InputOrigin);
        }
        self.session.anchor = Some(terminal.clone());
        self.session.cursor = Some(terminal.position);
        tracing::debug!(terminal = %terminal.id, "wire drawing started");
        Ok(())
    }

    /// Move the loose end of the wire. Ignored while idle.
    pub fn update_drawing(&mut self, point: Point) {
        if self.session.is_active() {
            self.session.cursor = Some(point);
        }
    }

    /// Drop the wire on `terminal`.
    ///
    /// On refusal nothing changes and the wire keeps following the pointer.
    pub fn complete_drawing(&mut self, terminal: &Terminal) -> Result<WireConnection, Rejection> {
        let anchor = self.session.anchor.as_ref().ok_or(Rejection::NotDrawing)?;

        if let Err(rejection) = self
            .checks
            .check(anchor, terminal, &self.connections)
            .and_then(|()| self.extra_checks.check(anchor, terminal, &self.connections))
        {
            tracing::debug!(
                from = %anchor.id,
                to = %terminal.id,
                %rejection,
                "connection refused"
            );
            return Err(rejection);
        }

        let connection = WireConnection {
            id: format!("wire-{}", self.next_id),
            from: anchor.clone(),
            to: terminal.clone(),
            color: self.wire_color,
            style: self.wire_style,
        };
        self.next_id += 1;
        self.connections.push(connection.clone());
        self.session.reset();
        tracing::debug!(
            id = %connection.id,
            from = %connection.from.id,
            to = %connection.to.id,
            "connection created"
        );

        self.notify();
        if self.completion_reached() {
            tracing::debug!(connections = self.connections.len(), "completion reached");
            if let Some(callback) = self.on_complete.as_mut() {
                callback();
            }
        }
        Ok(connection)
    }

    /// Abandon the wire being drawn. Returns false if there was none.
    pub fn cancel_drawing(&mut self) -> bool {
        if !self.session.is_active() {
            return false;
        }
        self.session.reset();
        tracing::debug!("wire drawing cancelled");
        true
    }

    /// Remove the connection at `index`. Out of range is a no-op.
    pub fn remove_connection(&mut self, index: usize) -> Option<WireConnection> {
        if index >= self.connections.len() {
            return None;
        }
        let removed = self.connections.remove(index);
        tracing::debug!(id = %removed.id, "connection removed");
        self.notify();
        Some(removed)
    }

    pub fn remove_connection_by_id(&mut self, id: &str) -> Option<WireConnection> {
        let index = self.connections.iter().position(|c| c.id == id)?;
        self.remove_connection(index)
    }

    /// Remove every connection. Notifies only if there was something to remove.
    pub fn clear_connections(&mut self) {
        if self.connections.is_empty() {
            return;
        }
        self.connections.clear();
        self.notify();
    }

    /// Bring connections and the anchor in line with a new terminal set.
    ///
    /// Wires whose endpoints vanished, or whose refreshed kinds no longer
    /// pass [`DirectionCheck`], are dropped; the others take the new terminal
    /// data. An anchor that vanished or can no longer originate a wire ends
    /// the drawing. Returns the number of dropped wires.
    pub(crate) fn reconcile<F>(&mut self, lookup: F) -> usize
    where
        F: Fn(&str) -> Option<Terminal>,
    {
        if let Some(anchor) = self.session.anchor.as_ref() {
            match lookup(&anchor.id) {
                Some(fresh) if fresh.kind.can_originate() => self.session.anchor = Some(fresh),
                _ => {
                    tracing::debug!(terminal = %anchor.id, "wire drawing ended by reload");
                    self.session.reset();
                }
            }
        }

        let before = self.connections.len();
        let mut changed = false;
        self.connections.retain_mut(|connection| {
            match (lookup(&connection.from.id), lookup(&connection.to.id)) {
                (Some(from), Some(to)) if DirectionCheck.check(&from, &to, &[]).is_ok() => {
                    if from != connection.from || to != connection.to {
                        connection.from = from;
                        connection.to = to;
                        changed = true;
                    }
                    true
                }
                _ => false,
            }
        });
        let dropped = before - self.connections.len();
        if dropped > 0 || changed {
            self.notify();
        }
        dropped
    }

    fn completion_reached(&self) -> bool {
        match self.completion {
            CompletionPolicy::ConnectionCount(count) => self.connections.len() >= count,
            CompletionPolicy::AllRulesComplete => {
                !self.rules.is_empty() && self.rules.validate(&self.connections).is_valid
            }
            CompletionPolicy::Never => false,
        }
    }

    fn notify(&mut self) {
        for syncer in &self.syncers {
            syncer.sync(&self.connections);
        }
        if let Some(callback) = self.on_connection_change.as_mut() {
            callback(&self.connections);
        }
    }
}
