//! Task completion validation
//!
//! The checklist is a list of rules. Each rule reads either nothing, a flag
//! from the payload's `context` object, or a gate result, and reports a
//! status. Which gates feed which items is decided by the config.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::gate::{GateOutcome, GateResults};

pub const REASON_PASSED: &str = "All quality gates passed";
pub const REASON_PENDING: &str = "Some quality gates pending";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Not actually checked; always satisfied
    AssumedPass,
    Pass,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistItem {
    pub name: String,
    pub status: ItemStatus,
    pub required: bool,
}

/// Where a checklist rule gets its answer from
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleCheck {
    AssumedPass,
    /// Truthy `context.<flag>` passes
    ContextFlag { flag: String },
    /// A passed gate passes; failed or unknown is pending
    Gate { gate: String },
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ChecklistRule {
    pub name: String,
    #[serde(default = "default_required")]
    pub required: bool,
    pub check: RuleCheck,
}

fn default_required() -> bool {
    true
}

impl ChecklistRule {
    fn new(name: &str, check: RuleCheck) -> Self {
        Self {
            name: name.to_string(),
            required: true,
            check,
        }
    }

    pub fn evaluate(&self, context: &Map<String, Value>, gates: &GateResults) -> ChecklistItem {
        let status = match &self.check {
            RuleCheck::AssumedPass => ItemStatus::AssumedPass,
            RuleCheck::ContextFlag { flag } => {
                if context.get(flag).is_some_and(is_truthy) {
                    ItemStatus::Pass
                } else {
                    ItemStatus::Pending
                }
            }
            RuleCheck::Gate { gate } => match gates.get(gate) {
                Some(GateOutcome::Passed) => ItemStatus::Pass,
                _ => ItemStatus::Pending,
            },
        };

        ChecklistItem {
            name: self.name.clone(),
            status,
            required: self.required,
        }
    }
}

/// The stock five-item checklist
pub fn default_checklist() -> Vec<ChecklistRule> {
    vec![
        ChecklistRule::new("Code compiles", RuleCheck::AssumedPass),
        ChecklistRule::new("Tests pass", RuleCheck::AssumedPass),
        ChecklistRule::new("Code quality checks", RuleCheck::AssumedPass),
        ChecklistRule::new(
            "Code review completed",
            RuleCheck::ContextFlag {
                flag: "code_reviewed".to_string(),
            },
        ),
        ChecklistRule::new(
            "Test plan verified",
            RuleCheck::ContextFlag {
                flag: "test_plan_complete".to_string(),
            },
        ),
    ]
}

/// Gates referenced by the checklist, first mention first
pub fn referenced_gates(rules: &[ChecklistRule]) -> Vec<String> {
    let mut gates: Vec<String> = Vec::new();
    for rule in rules {
        if let RuleCheck::Gate { gate } = &rule.check
            && !gates.contains(gate)
        {
            gates.push(gate.clone());
        }
    }
    gates
}

/// Outcome of a completion check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub ok: bool,
    pub reason: String,
    pub pending_items: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Validation {
    pub checklist: Vec<ChecklistItem>,
}

impl Validation {
    /// No required item is pending
    pub fn ok(&self) -> bool {
        !self
            .checklist
            .iter()
            .any(|item| item.required && item.status == ItemStatus::Pending)
    }

    pub fn verdict(&self) -> Verdict {
        let ok = self.ok();
        Verdict {
            ok,
            reason: if ok { REASON_PASSED } else { REASON_PENDING }.to_string(),
            pending_items: self
                .checklist
                .iter()
                .filter(|item| item.status == ItemStatus::Pending)
                .map(|item| item.name.clone())
                .collect(),
        }
    }
}

/// Evaluate the checklist against a stop-check payload
pub fn validate_completion(payload: &Value, rules: &[ChecklistRule], gates: &GateResults) -> Validation {
    let empty = Map::new();
    let context = payload.get("context").and_then(|v| v.as_object()).unwrap_or(&empty);

    Validation {
        checklist: rules.iter().map(|rule| rule.evaluate(context, gates)).collect(),
    }
}

/// JSON truthiness: null, false, 0, and empty strings/arrays/objects are false
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validate(payload: Value) -> Validation {
        validate_completion(&payload, &default_checklist(), &GateResults::new())
    }

    #[test]
    fn test_all_flags_set_passes() {
        let verdict = validate(json!({"context": {"code_reviewed": true, "test_plan_complete": true}})).verdict();
        assert!(verdict.ok);
        assert_eq!(verdict.reason, "All quality gates passed");
        assert!(verdict.pending_items.is_empty());
    }

    #[test]
    fn test_missing_review_is_pending() {
        let verdict = validate(json!({"context": {"test_plan_complete": true}})).verdict();
        assert!(!verdict.ok);
        assert_eq!(verdict.reason, "Some quality gates pending");
        assert_eq!(verdict.pending_items, vec!["Code review completed"]);
    }

    #[test]
    fn test_empty_payload_has_both_pending() {
        let validation = validate(json!({}));
        assert_eq!(
            validation.verdict().pending_items,
            vec!["Code review completed", "Test plan verified"]
        );
        assert_eq!(validate(json!({"context": {}})).verdict(), validation.verdict());
    }

    #[test]
    fn test_checklist_order_and_statuses() {
        let validation = validate(json!({"context": {"code_reviewed": true}}));
        let items: Vec<(&str, ItemStatus)> = validation
            .checklist
            .iter()
            .map(|item| (item.name.as_str(), item.status))
            .collect();
        assert_eq!(
            items,
            vec![
                ("Code compiles", ItemStatus::AssumedPass),
                ("Tests pass", ItemStatus::AssumedPass),
                ("Code quality checks", ItemStatus::AssumedPass),
                ("Code review completed", ItemStatus::Pass),
                ("Test plan verified", ItemStatus::Pending),
            ]
        );
        assert!(validation.checklist.iter().all(|item| item.required));
    }

    #[test]
    fn test_non_object_context_is_empty() {
        let verdict = validate(json!({"context": "reviewed"})).verdict();
        assert_eq!(verdict.pending_items.len(), 2);
    }

    #[test]
    fn test_truthy_values_count() {
        let verdict = validate(json!({"context": {"code_reviewed": "yes", "test_plan_complete": 1}})).verdict();
        assert!(verdict.ok);

        let verdict = validate(json!({"context": {"code_reviewed": 0, "test_plan_complete": ""}})).verdict();
        assert!(!verdict.ok);
        assert_eq!(verdict.pending_items.len(), 2);
    }

    #[test]
    fn test_is_truthy() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(0.0)));
        assert!(!is_truthy(&json!([])));
        assert!(!is_truthy(&json!({})));
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(-1)));
        assert!(is_truthy(&json!(["x"])));
        assert!(is_truthy(&json!({"a": 1})));
    }

    #[test]
    fn test_optional_pending_item_does_not_block() {
        let rules = vec![ChecklistRule {
            name: "Changelog updated".to_string(),
            required: false,
            check: RuleCheck::ContextFlag {
                flag: "changelog".to_string(),
            },
        }];
        let verdict = validate_completion(&json!({}), &rules, &GateResults::new()).verdict();
        assert!(verdict.ok);
        assert_eq!(verdict.pending_items, vec!["Changelog updated"]);
    }

    #[test]
    fn test_gate_rule_uses_gate_results() {
        let rules = vec![
            ChecklistRule::new("Code compiles", RuleCheck::Gate { gate: "compile".to_string() }),
            ChecklistRule::new("Code quality checks", RuleCheck::Gate { gate: "detekt".to_string() }),
            ChecklistRule::new("Formatting", RuleCheck::Gate { gate: "spotless".to_string() }),
        ];
        let gates = GateResults::from([
            ("compile".to_string(), GateOutcome::Passed),
            ("detekt".to_string(), GateOutcome::Failed),
            ("spotless".to_string(), GateOutcome::Unknown),
        ]);

        let verdict = validate_completion(&json!({}), &rules, &gates).verdict();
        assert!(!verdict.ok);
        assert_eq!(verdict.pending_items, vec!["Code quality checks", "Formatting"]);
    }

    #[test]
    fn test_gate_rule_without_result_is_pending() {
        let rules = vec![ChecklistRule::new("Code compiles", RuleCheck::Gate { gate: "compile".to_string() })];
        let validation = validate_completion(&json!({}), &rules, &GateResults::new());
        assert_eq!(validation.checklist[0].status, ItemStatus::Pending);
    }

    #[test]
    fn test_referenced_gates() {
        assert!(referenced_gates(&default_checklist()).is_empty());

        let rules = vec![
            ChecklistRule::new("a", RuleCheck::Gate { gate: "compile".to_string() }),
            ChecklistRule::new("b", RuleCheck::AssumedPass),
            ChecklistRule::new("c", RuleCheck::Gate { gate: "detekt".to_string() }),
            ChecklistRule::new("d", RuleCheck::Gate { gate: "compile".to_string() }),
        ];
        assert_eq!(referenced_gates(&rules), vec!["compile", "detekt"]);
    }

    #[test]
    fn test_item_status_serialization() {
        assert_eq!(serde_json::to_value(ItemStatus::AssumedPass).unwrap(), json!("assumed_pass"));
        assert_eq!(serde_json::to_value(ItemStatus::Pending).unwrap(), json!("pending"));
    }
}
