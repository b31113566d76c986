//! Loading and checking lesson data.
//!
//! Lessons describe their components and rules as JSON:
//!
//! ```json
//! {
//!   "components": [
//!     { "id": "QF1", "name": "Breaker", "color": "#3366ff",
//!       "terminals": [
//!         { "id": "QF1-in", "label": "1", "type": "input", "position": { "x": 100, "y": 10 } }
//!       ] }
//!   ],
//!   "rules": [
//!     { "id": "supply", "type": "sequence",
//!       "required": [ { "from": "L1", "to": "QF1-in" } ],
//!       "forbidden": [] }
//!   ]
//! }
//! ```
//!
//! Data problems are reported eagerly here, before anything reaches the index.

use crate::error::DataError;
use crate::model::{Component, WiringRule};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

/// Components and rules of one lesson.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default)]
    pub rules: Vec<WiringRule>,
}

impl Catalog {
    /// Parse and validate a lesson.
    pub fn from_json(text: &str) -> Result<Self, DataError> {
        let mut catalog: Catalog = serde_json::from_str(text)?;
        adopt_terminals(&mut catalog.components);
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<(), DataError> {
        let terminals = validate_components(&self.components)?;
        validate_rules(&self.rules, |id| terminals.contains(id))
    }
}

/// Parse a bare component list.
pub fn components_from_json(text: &str) -> Result<Vec<Component>, DataError> {
    let mut components: Vec<Component> = serde_json::from_str(text)?;
    adopt_terminals(&mut components);
    validate_components(&components)?;
    Ok(components)
}

/// Parse a bare rule list. Terminal references are checked when the rules
/// meet their components.
pub fn rules_from_json(text: &str) -> Result<Vec<WiringRule>, DataError> {
    let rules: Vec<WiringRule> = serde_json::from_str(text)?;
    validate_rules(&rules, |_| true)?;
    Ok(rules)
}

/// Record each terminal's owning component.
pub fn adopt_terminals(components: &mut [Component]) {
    for component in components {
        for terminal in &mut component.terminals {
            terminal.component_id.clone_from(&component.id);
        }
    }
}

/// Check id uniqueness and positions. Returns the set of terminal ids.
pub fn validate_components(components: &[Component]) -> Result<HashSet<String>, DataError> {
    let mut component_ids = HashSet::new();
    let mut owners: HashMap<&str, &str> = HashMap::new();

    for component in components {
        if !component_ids.insert(component.id.as_str()) {
            return Err(DataError::DuplicateComponent(component.id.clone()));
        }
        for terminal in &component.terminals {
            if !terminal.position.is_finite() {
                return Err(DataError::NonFinitePosition(terminal.id.clone()));
            }
            if let Some(first) = owners.insert(terminal.id.as_str(), component.id.as_str()) {
                return Err(DataError::DuplicateTerminal {
                    id: terminal.id.clone(),
                    first: first.to_string(),
                    second: component.id.clone(),
                });
            }
        }
    }

    Ok(owners.into_keys().map(str::to_string).collect())
}

/// Check rule id uniqueness and that every referenced terminal exists.
pub fn validate_rules<F>(rules: &[WiringRule], terminal_exists: F) -> Result<(), DataError>
where
    F: Fn(&str) -> bool,
{
    let mut rule_ids = HashSet::new();
    for rule in rules {
        if !rule_ids.insert(rule.id.as_str()) {
            return Err(DataError::DuplicateRule(rule.id.clone()));
        }
        if let Some(missing) = rule.terminal_ids().find(|id| !terminal_exists(id)) {
            return Err(DataError::UnknownTerminal {
                rule_id: rule.id.clone(),
                terminal_id: missing.to_string(),
            });
        }
    }
    Ok(())
}
