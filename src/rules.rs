//! Rule-based evaluation of the wiring drawn so far.
//!
//! A lesson ships a list of [`WiringRule`]s. [`ConnectionRuleValidator`] turns
//! the current connection list into a [`ValidationReport`]: which rules are
//! completed, which forbidden wires are present, and which terminals look like
//! they feed more than one target.

use crate::model::{WireConnection, WiringRule};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

/// A forbidden wire that is currently present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleError {
    pub rule_id: String,
    pub from: String,
    pub to: String,
    pub message: String,
    pub suggestion: String,
}

/// Advisory finding that does not affect validity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleWarning {
    /// Terminal the suspicious wires start at
    pub terminal_id: String,
    /// Distinct targets reached from it, sorted
    pub targets: Vec<String>,
    pub message: String,
}

/// Result of evaluating a connection list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<RuleError>,
    pub warnings: Vec<RuleWarning>,
    /// Ids of completed rules, in rule order
    pub completed_rules: Vec<String>,
    /// Percentage of completed rules, 0-100
    pub progress: u8,
}

/// Outcome of the cheap pre-check on a single candidate wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionVerdict {
    Valid,
    Forbidden { rule_id: String, reason: String },
}

impl ConnectionVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, ConnectionVerdict::Valid)
    }
}

/// Evaluates connections against a fixed rule set.
///
/// Cloning is cheap: the rules are shared.
#[derive(Debug, Clone)]
pub struct ConnectionRuleValidator {
    rules: Rc<[WiringRule]>,
    count_optional: bool,
}

impl Default for ConnectionRuleValidator {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl ConnectionRuleValidator {
    pub fn new(rules: Vec<WiringRule>) -> Self {
        Self {
            rules: rules.into(),
            count_optional: true,
        }
    }

    /// Skip entries marked `required: false` when deciding completion.
    ///
    /// By default every entry counts, whatever its flag.
    pub fn with_optional_entries_excluded(mut self, excluded: bool) -> Self {
        self.count_optional = !excluded;
        self
    }

    pub fn rules(&self) -> &[WiringRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether every counted entry of `rule` has a matching wire.
    pub fn is_rule_completed(&self, rule: &WiringRule, connections: &[WireConnection]) -> bool {
        rule.required
            .iter()
            .filter(|entry| self.count_optional || entry.required)
            .all(|entry| connections.iter().any(|c| c.joins(&entry.from, &entry.to)))
    }

    pub fn validate(&self, connections: &[WireConnection]) -> ValidationReport {
        let completed_rules: Vec<String> = self
            .rules
            .iter()
            .filter(|rule| self.is_rule_completed(rule, connections))
            .map(|rule| rule.id.clone())
            .collect();

        let mut errors = Vec::new();
        for rule in self.rules.iter() {
            for forbidden in &rule.forbidden {
                if connections.iter().any(|c| c.joins(&forbidden.from, &forbidden.to)) {
                    let message = rule.feedback.error.clone().unwrap_or_else(|| {
                        format!("forbidden connection {} -> {}", forbidden.from, forbidden.to)
                    });
                    errors.push(RuleError {
                        rule_id: rule.id.clone(),
                        from: forbidden.from.clone(),
                        to: forbidden.to.clone(),
                        message,
                        suggestion: forbidden.reason.clone(),
                    });
                }
            }
        }

        let warnings = short_circuit_warnings(connections);

        let total = self.rules.len();
        let progress = if total == 0 {
            0
        } else {
            (100.0 * completed_rules.len() as f64 / total as f64).round() as u8
        };
        let is_valid = completed_rules.len() == total && errors.is_empty();

        ValidationReport {
            is_valid,
            errors,
            warnings,
            completed_rules,
            progress,
        }
    }

    /// First forbidden entry across the rules matching `from` -> `to`.
    pub fn validate_connection(&self, from: &str, to: &str) -> ConnectionVerdict {
        self.rules
            .iter()
            .flat_map(|rule| rule.forbidden.iter().map(move |f| (rule, f)))
            .find(|(_, f)| f.from == from && f.to == to)
            .map_or(ConnectionVerdict::Valid, |(rule, f)| ConnectionVerdict::Forbidden {
                rule_id: rule.id.clone(),
                reason: f.reason.clone(),
            })
    }
}

/// One warning per origin terminal wired to more than one distinct target.
fn short_circuit_warnings(connections: &[WireConnection]) -> Vec<RuleWarning> {
    let mut targets: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for connection in connections {
        targets
            .entry(connection.from.id.as_str())
            .or_default()
            .insert(connection.to.id.as_str());
    }

    targets
        .into_iter()
        .filter(|(_, to)| to.len() > 1)
        .map(|(from, to)| RuleWarning {
            terminal_id: from.to_string(),
            message: format!("possible short circuit: {} feeds {} terminals", from, to.len()),
            targets: to.into_iter().map(str::to_string).collect(),
        })
        .collect()
}
