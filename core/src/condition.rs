//! Field presence conditions.
//!
//! A condition is a flat chain of `key=value` comparisons joined by `&&`
//! and `||`. There is no grouping and no operator precedence: evaluation
//! folds strictly left to right, so `a=1 || b=2 && c=3` means
//! `((a=1 || b=2) && c=3)`. The narrowness is deliberate and schemas rely
//! on it.

use serde::Serialize;

use crate::types::Literal;
use crate::value::Record;

/// Connective joining a term to the accumulated result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Connective {
    And,
    Or,
}

/// One `key=value` comparison in a chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionTerm {
    /// `None` on the first term of the chain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connective: Option<Connective>,
    /// Sibling field the comparison reads.
    pub key: String,
    /// Comparison literal, typed against the sibling's primitive kind.
    /// `None` when the key names no sibling; such terms appear in help text
    /// but are skipped during evaluation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Literal>,
}

/// A parsed condition chain plus the schema text it came from.
///
/// The raw text is what help output shows; the terms are what the codec
/// and binder evaluate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionExpr {
    pub raw: String,
    pub terms: Vec<ConditionTerm>,
}

impl ConditionExpr {
    /// Evaluates the chain against the sibling fields bound so far.
    ///
    /// A comparison against an unset slot is false. Display-only terms are
    /// skipped; the first enforced term starts the fold and drops its
    /// connective. A chain with no enforced terms always holds.
    ///
    /// # Examples
    ///
    /// ```
    /// use rpckit_core::{ConditionExpr, ConditionTerm, Connective, Literal, Record, Value};
    ///
    /// let cond = ConditionExpr {
    ///     raw: "type=fork".to_string(),
    ///     terms: vec![ConditionTerm {
    ///         connective: None,
    ///         key: "type".to_string(),
    ///         value: Some(Literal::String("fork".to_string())),
    ///     }],
    /// };
    ///
    /// let mut siblings = Record::new();
    /// assert!(!cond.evaluate(&siblings));
    /// siblings.set("type", Value::String("fork".to_string()));
    /// assert!(cond.evaluate(&siblings));
    /// ```
    pub fn evaluate(&self, siblings: &Record) -> bool {
        let mut acc: Option<bool> = None;
        for term in &self.terms {
            let Some(expected) = &term.value else {
                continue;
            };
            let current = siblings
                .get(&term.key)
                .is_some_and(|actual| expected.matches(actual));
            acc = Some(match (acc, term.connective) {
                (None, _) => current,
                (Some(prev), Some(Connective::Or)) => prev || current,
                (Some(prev), _) => prev && current,
            });
        }
        acc.unwrap_or(true)
    }

    /// True when no term can be enforced and the chain is help-only.
    pub fn is_display_only(&self) -> bool {
        self.terms.iter().all(|term| term.value.is_none())
    }
}

impl std::fmt::Display for ConditionExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn term(connective: Option<Connective>, key: &str, value: i64) -> ConditionTerm {
        ConditionTerm {
            connective,
            key: key.to_string(),
            value: Some(Literal::Int(value)),
        }
    }

    fn siblings(pairs: &[(&str, i64)]) -> Record {
        let mut record = Record::new();
        for (key, value) in pairs {
            record.set(*key, Value::Int(*value));
        }
        record
    }

    #[test]
    fn test_fold_is_left_to_right_without_precedence() {
        // a=1 || b=2 && c=3 folds as ((a || b) && c), not (a || (b && c)).
        let cond = ConditionExpr {
            raw: "a=1 || b=2 && c=3".to_string(),
            terms: vec![
                term(None, "a", 1),
                term(Some(Connective::Or), "b", 2),
                term(Some(Connective::And), "c", 3),
            ],
        };
        assert!(!cond.evaluate(&siblings(&[("a", 1), ("b", 0), ("c", 0)])));
        assert!(cond.evaluate(&siblings(&[("a", 1), ("b", 0), ("c", 3)])));
    }

    #[test]
    fn test_and_chain_requires_all() {
        let cond = ConditionExpr {
            raw: "a=1 && b=2".to_string(),
            terms: vec![term(None, "a", 1), term(Some(Connective::And), "b", 2)],
        };
        assert!(cond.evaluate(&siblings(&[("a", 1), ("b", 2)])));
        assert!(!cond.evaluate(&siblings(&[("a", 1), ("b", 3)])));
    }

    #[test]
    fn test_unset_sibling_compares_false() {
        let cond = ConditionExpr {
            raw: "a=1".to_string(),
            terms: vec![term(None, "a", 1)],
        };
        assert!(!cond.evaluate(&Record::new()));
    }

    #[test]
    fn test_display_only_terms_are_skipped() {
        let cond = ConditionExpr {
            raw: "mode=fast && a=1".to_string(),
            terms: vec![
                ConditionTerm {
                    connective: None,
                    key: "mode".to_string(),
                    value: None,
                },
                term(Some(Connective::And), "a", 1),
            ],
        };
        // The display-only first term drops out; only a=1 is enforced.
        assert!(cond.evaluate(&siblings(&[("a", 1)])));
        assert!(!cond.evaluate(&siblings(&[("a", 2)])));
    }

    #[test]
    fn test_all_display_only_always_holds() {
        let cond = ConditionExpr {
            raw: "mode=fast".to_string(),
            terms: vec![ConditionTerm {
                connective: None,
                key: "mode".to_string(),
                value: None,
            }],
        };
        assert!(cond.is_display_only());
        assert!(cond.evaluate(&Record::new()));
    }

    #[test]
    fn test_serialization_keeps_raw_and_drops_leading_connective() {
        let cond = ConditionExpr {
            raw: "a=1 || b=2".to_string(),
            terms: vec![term(None, "a", 1), term(Some(Connective::Or), "b", 2)],
        };
        let json = serde_json::to_value(&cond).expect("condition serializes");
        assert_eq!(json["raw"], serde_json::json!("a=1 || b=2"));
        assert!(json["terms"][0].get("connective").is_none());
        assert_eq!(json["terms"][1]["connective"], serde_json::json!("or"));
        assert_eq!(json["terms"][1]["value"], serde_json::json!(2));
    }
}
