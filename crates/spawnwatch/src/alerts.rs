//! The ordered list of alert rules of a group.
//!
//! Rules are addressed by position in user-facing commands. Tracked spawns
//! remember which rules are still pending by stable [`RuleId`], so removing a
//! rule never shifts what another spawn is waiting for.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::predicate::{Bindings, Predicate};
use crate::types::{TrackerError, TrackerResult};

/// Stable identity of a rule. Never reused within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RuleId(pub u64);

#[derive(Debug, Clone)]
pub struct AlertRule {
    pub id: RuleId,
    pub predicate: Predicate,
}

impl AlertRule {
    pub fn source(&self) -> &str {
        self.predicate.source()
    }

    /// Evaluate, treating a runtime evaluation failure as "not true".
    pub fn holds(&self, bindings: &Bindings) -> bool {
        match self.predicate.evaluate(bindings) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Alert rule `{}` failed to evaluate: {}", self.source(), e);
                false
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AlertRules {
    rules: Vec<AlertRule>,
    next_id: u64,
}

impl AlertRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a rule from source, mapping failures to a tracker error.
    pub fn compile(source: &str) -> TrackerResult<Predicate> {
        Predicate::compile(source).map_err(|e| TrackerError::PredicateCompile(e.to_string()))
    }

    /// Append a compiled rule and return its id.
    pub fn push(&mut self, predicate: Predicate) -> RuleId {
        let id = RuleId(self.next_id);
        self.next_id += 1;
        self.rules.push(AlertRule { id, predicate });
        id
    }

    /// Remove the rule at `position` (0-based).
    pub fn remove_at(&mut self, position: usize) -> TrackerResult<AlertRule> {
        if position >= self.rules.len() {
            return Err(TrackerError::Validation(format!(
                "there is no alert number {}",
                position + 1
            )));
        }
        Ok(self.rules.remove(position))
    }

    pub fn get(&self, id: RuleId) -> Option<&AlertRule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    pub fn position(&self, id: RuleId) -> Option<usize> {
        self.rules.iter().position(|rule| rule.id == id)
    }

    pub fn ids(&self) -> BTreeSet<RuleId> {
        self.rules.iter().map(|rule| rule.id).collect()
    }

    /// Ids of every rule that currently holds.
    pub fn holding(&self, bindings: &Bindings) -> BTreeSet<RuleId> {
        self.rules
            .iter()
            .filter(|rule| rule.holds(bindings))
            .map(|rule| rule.id)
            .collect()
    }

    pub fn sources(&self) -> Vec<String> {
        self.rules.iter().map(|rule| rule.source().to_string()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AlertRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(sources: &[&str]) -> AlertRules {
        let mut rules = AlertRules::new();
        for source in sources {
            rules.push(AlertRules::compile(source).unwrap());
        }
        rules
    }

    #[test]
    fn test_ids_survive_removal() {
        let mut rules = rules(&["prob > 0", "prob > 0.5", "prob >= 1"]);
        let last = rules.iter().last().unwrap().id;
        assert_eq!(rules.position(last), Some(2));
        rules.remove_at(1).unwrap();
        assert_eq!(rules.position(last), Some(1));
        let next = rules.push(AlertRules::compile("true").unwrap());
        assert_eq!(next, RuleId(3));
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut rules = rules(&["prob > 0"]);
        assert!(rules.remove_at(1).is_err());
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn test_holding() {
        let rules = rules(&["prob > 0.5", "now > min"]);
        let bindings = Bindings {
            now: 15.0,
            min: 10.0,
            max: 20.0,
            prob: 0.2,
        };
        let holding = rules.holding(&bindings);
        assert_eq!(holding.into_iter().collect::<Vec<_>>(), vec![RuleId(1)]);
    }

    #[test]
    fn test_compile_error_is_reported() {
        let err = AlertRules::compile("prob +").unwrap_err();
        assert!(matches!(err, TrackerError::PredicateCompile(_)));
    }
}
