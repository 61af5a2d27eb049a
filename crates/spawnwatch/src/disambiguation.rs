//! Numbered-choice prompts that suspend an operation until the same user
//! picks an option.

use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

/// Upper bound for any index in a range selector.
pub const MAX_SELECTION: usize = 1000;

/// A parsed reply to a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// A bare number: `2`.
    Single(usize),
    /// A quoted number, `'2`: one index taken as-is, for batch continuations.
    Literal(usize),
    /// Comma-separated numbers and inclusive ranges: `1,3-5`.
    Multi(Vec<usize>),
}

impl Selection {
    /// The 1-based indices selected, ascending for range lists.
    pub fn indices(&self) -> Vec<usize> {
        match self {
            Selection::Single(n) | Selection::Literal(n) => vec![*n],
            Selection::Multi(indices) => indices.clone(),
        }
    }
}

/// Parse a batch selector: `'N` or a comma/range list. A lone bare number is
/// not a selector here, since it is also a valid time argument.
pub fn parse_selector(text: &str) -> Option<Selection> {
    if let Some(rest) = text.strip_prefix('\'') {
        let value = positive(rest)?;
        return Some(Selection::Literal(value));
    }
    if !text.contains([',', '-']) {
        return None;
    }

    let mut indices = BTreeSet::new();
    for part in text.split(',') {
        match part.split_once('-') {
            None => {
                indices.insert(positive(part)?);
            }
            Some((low, high)) => {
                let low = positive(low)?;
                let high = positive(high)?;
                if low > high || high > MAX_SELECTION {
                    return None;
                }
                indices.extend(low..=high);
            }
        }
    }
    if indices.iter().any(|&index| index > MAX_SELECTION) {
        return None;
    }
    Some(Selection::Multi(indices.into_iter().collect()))
}

/// Parse a reply to a pending prompt: a bare number or any batch selector.
pub fn parse_selection(text: &str) -> Option<Selection> {
    let text = text.trim();
    if let Some(value) = positive(text) {
        return Some(Selection::Single(value));
    }
    parse_selector(text)
}

fn positive(text: &str) -> Option<usize> {
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse().ok().filter(|&value| value > 0)
}

/// Operations that can be suspended behind a prompt.
pub trait Continuation {
    /// Whether the operation can resume with several options at once.
    fn accepts_batch(&self) -> bool;
}

/// What a resolved prompt hands back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Resumption<V, C> {
    One { value: V, continuation: C },
    Many { values: Vec<V>, continuation: C },
}

#[derive(Debug, Clone)]
struct PendingChoice<V, C> {
    values: Vec<V>,
    continuation: C,
}

/// Per-user pending prompts. At most one per user; a new prompt replaces
/// the previous one.
#[derive(Debug, Clone)]
pub struct DisambiguationBroker<U, V, C> {
    pending: HashMap<U, PendingChoice<V, C>>,
}

impl<U, V, C> Default for DisambiguationBroker<U, V, C> {
    fn default() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }
}

impl<U, V, C> DisambiguationBroker<U, V, C>
where
    U: Eq + Hash,
    V: Clone,
    C: Continuation,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Suspend `continuation` for `user` and return the prompt text.
    ///
    /// With `sort`, options are ordered by label ignoring parentheses.
    pub fn prompt(
        &mut self,
        user: U,
        message: &str,
        mut options: Vec<(String, V)>,
        continuation: C,
        sort: bool,
    ) -> String {
        if sort {
            options.sort_by_key(|(label, _)| label.replace(['(', ')'], ""));
        }
        let lines = options
            .iter()
            .enumerate()
            .map(|(i, (label, _))| format!("{}) {}", i + 1, label))
            .collect::<Vec<_>>()
            .join("\n");
        let values = options.into_iter().map(|(_, value)| value).collect();
        self.pending.insert(
            user,
            PendingChoice {
                values,
                continuation,
            },
        );
        format!("{message}\n\n{lines}")
    }

    pub fn is_awaiting(&self, user: &U) -> bool {
        self.pending.contains_key(user)
    }

    pub fn option_count(&self, user: &U) -> Option<usize> {
        self.pending.get(user).map(|pending| pending.values.len())
    }

    /// Apply a selection. Anything not applicable to the pending prompt
    /// (out of range, batch form for a single-choice operation) is ignored
    /// and the prompt stays pending.
    pub fn choose(&mut self, user: &U, selection: &Selection) -> Option<Resumption<V, C>> {
        let pending = self.pending.get(user)?;
        let indices = selection.indices();
        let in_range = indices
            .iter()
            .all(|&index| index >= 1 && index <= pending.values.len());
        let batch = !matches!(selection, Selection::Single(_));
        if !in_range || indices.is_empty() || (batch && !pending.continuation.accepts_batch()) {
            return None;
        }

        let pending = self.pending.remove(user)?;
        let mut values: Vec<V> = indices
            .iter()
            .map(|&index| pending.values[index - 1].clone())
            .collect();
        if batch {
            Some(Resumption::Many {
                values,
                continuation: pending.continuation,
            })
        } else {
            values.truncate(1);
            let value = values.pop()?;
            Some(Resumption::One {
                value,
                continuation: pending.continuation,
            })
        }
    }

    pub fn clear(&mut self, user: &U) {
        self.pending.remove(user);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Track,
        Remove,
    }

    impl Continuation for Op {
        fn accepts_batch(&self) -> bool {
            matches!(self, Op::Track)
        }
    }

    fn options(labels: &[&str]) -> Vec<(String, String)> {
        labels
            .iter()
            .map(|label| (label.to_string(), label.to_lowercase()))
            .collect()
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!(parse_selection("2"), Some(Selection::Single(2)));
        assert_eq!(parse_selection("0"), None);
        assert_eq!(parse_selection("'3"), Some(Selection::Literal(3)));
        assert_eq!(parse_selection("'0"), None);
        assert_eq!(parse_selection("1,3-5,3"), Some(Selection::Multi(vec![1, 3, 4, 5])));
        assert_eq!(parse_selection("5-3"), None);
        assert_eq!(parse_selection("1-1001"), None);
        assert_eq!(parse_selection("1,x"), None);
        assert_eq!(parse_selection("1-2-3"), None);
        assert_eq!(parse_selection("gtb"), None);
    }

    #[test]
    fn test_selector_ignores_bare_numbers() {
        assert_eq!(parse_selector("70"), None);
        assert_eq!(parse_selector("1,2"), Some(Selection::Multi(vec![1, 2])));
        assert_eq!(parse_selector("5:30"), None);
    }

    #[test]
    fn test_prompt_numbers_sorted_options() {
        let mut broker = DisambiguationBroker::new();
        let text = broker.prompt(
            1u64,
            "Which spawn was it?",
            options(&["Orc Lord (Village)", "Orc Hero", "Orc Archer"]),
            Op::Track,
            true,
        );
        assert_eq!(
            text,
            "Which spawn was it?\n\n1) Orc Archer\n2) Orc Hero\n3) Orc Lord (Village)"
        );
        let chosen = broker.choose(&1, &Selection::Single(2)).unwrap();
        assert_eq!(
            chosen,
            Resumption::One {
                value: "orc hero".to_string(),
                continuation: Op::Track
            }
        );
        assert!(!broker.is_awaiting(&1));
    }

    #[test]
    fn test_unsorted_prompt_keeps_order() {
        let mut broker = DisambiguationBroker::new();
        let text = broker.prompt(1u64, "Pick", options(&["b", "a"]), Op::Remove, false);
        assert_eq!(text, "Pick\n\n1) b\n2) a");
    }

    #[test]
    fn test_out_of_range_keeps_context() {
        let mut broker = DisambiguationBroker::new();
        broker.prompt(1u64, "Pick", options(&["a", "b"]), Op::Track, true);
        assert!(broker.choose(&1, &Selection::Single(3)).is_none());
        assert!(broker.is_awaiting(&1));
        assert!(broker.choose(&2, &Selection::Single(1)).is_none());
        assert!(broker.choose(&1, &Selection::Single(1)).is_some());
    }

    #[test]
    fn test_batch_only_for_batch_continuations() {
        let mut broker = DisambiguationBroker::new();
        broker.prompt(1u64, "Pick", options(&["a", "b", "c"]), Op::Remove, true);
        assert!(broker.choose(&1, &Selection::Multi(vec![1, 2])).is_none());
        assert!(broker.is_awaiting(&1));

        broker.prompt(1u64, "Pick", options(&["a", "b", "c"]), Op::Track, true);
        match broker.choose(&1, &Selection::Multi(vec![1, 3])).unwrap() {
            Resumption::Many { values, .. } => assert_eq!(values, vec!["a", "c"]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_new_prompt_replaces_old() {
        let mut broker = DisambiguationBroker::new();
        broker.prompt(1u64, "First", options(&["a", "b", "c"]), Op::Track, true);
        broker.prompt(1u64, "Second", options(&["x"]), Op::Remove, true);
        assert_eq!(broker.option_count(&1), Some(1));
        assert!(broker.choose(&1, &Selection::Single(2)).is_none());
    }
}
