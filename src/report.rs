use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AnalyzerError, Result};

/// List sections of a quality report, in display order: (key, title).
pub const LIST_SECTIONS: &[(&str, &str)] = &[
    ("ambiguities", "Ambiguities"),
    ("missing_information", "Missing information"),
    ("assumptions", "Assumptions"),
    ("risks_and_dependencies", "Risks & dependencies"),
    ("edge_cases", "Edge cases"),
    ("acceptance_criteria", "Acceptance criteria"),
    ("test_scenarios", "Suggested test scenarios"),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Text,
    Integer,
    List,
}

impl FieldKind {
    fn name(self) -> &'static str {
        match self {
            FieldKind::Text => "string",
            FieldKind::Integer => "integer",
            FieldKind::List => "array",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            FieldKind::Text => value.is_string(),
            FieldKind::Integer => value.is_i64() || value.is_u64(),
            FieldKind::List => value.is_array(),
        }
    }
}

/// Every key a saved report must carry.
pub const REPORT_SCHEMA: &[(&str, FieldKind)] = &[
    ("summary", FieldKind::Text),
    ("clarity_score", FieldKind::Integer),
    ("clarity_score_reason", FieldKind::Text),
    ("ambiguities", FieldKind::List),
    ("missing_information", FieldKind::List),
    ("assumptions", FieldKind::List),
    ("risks_and_dependencies", FieldKind::List),
    ("edge_cases", FieldKind::List),
    ("acceptance_criteria", FieldKind::List),
    ("test_scenarios", FieldKind::List),
];

/// A quality report exactly as the model produced it.
///
/// Fields are read leniently through the accessors; nothing is coerced or
/// dropped, and key order survives a save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualityReport(Map<String, Value>);

impl QualityReport {
    /// Wrap an extracted value. Non-object JSON is rejected.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map(QualityReport).map_err(AnalyzerError::UnexpectedShape)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn clarity_score(&self) -> Option<&Value> {
        self.get("clarity_score")
    }

    /// Items of a list section as display strings.
    ///
    /// Strings are returned as-is; other JSON values as their JSON text.
    /// A missing or non-array field gives an empty list.
    pub fn items(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Check a saved report against [`REPORT_SCHEMA`] and the 0-100 score range.
///
/// Returns every violation found, not just the first.
pub fn validate(value: &Value) -> std::result::Result<(), Vec<String>> {
    let Some(object) = value.as_object() else {
        return Err(vec!["report is not a JSON object".to_string()]);
    };

    let mut violations = Vec::new();
    for (key, kind) in REPORT_SCHEMA {
        match object.get(*key) {
            None => violations.push(format!("missing key: {}", key)),
            Some(found) if !kind.accepts(found) => violations.push(format!(
                "key {} expected {}, got {}",
                key,
                kind.name(),
                json_type_name(found)
            )),
            Some(_) => {}
        }
    }

    if let Some(score) = object.get("clarity_score").and_then(Value::as_i64) {
        if !(0..=100).contains(&score) {
            violations.push(format!("clarity_score out of range: {}", score));
        }
    } else if let Some(score) = object.get("clarity_score").and_then(Value::as_u64) {
        violations.push(format!("clarity_score out of range: {}", score));
    }

    if violations.is_empty() { Ok(()) } else { Err(violations) }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClarifyingQuestion {
    pub id: String,
    pub question: String,
    #[serde(default)]
    pub why_it_matters: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClarifyingQuestions {
    pub clarifying_questions: Vec<ClarifyingQuestion>,
}

impl ClarifyingQuestions {
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(AnalyzerError::UnexpectedShape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_report() -> Value {
        json!({
            "summary": "Users reset passwords with an emailed OTP",
            "clarity_score": 62,
            "clarity_score_reason": "Expiry and lockout rules are missing",
            "ambiguities": ["Which channel delivers the OTP?"],
            "missing_information": ["OTP lifetime"],
            "assumptions": [],
            "risks_and_dependencies": ["Email provider availability"],
            "edge_cases": ["OTP requested twice"],
            "acceptance_criteria": ["Given a valid OTP, the password can be changed"],
            "test_scenarios": ["Reset with expired OTP is rejected"]
        })
    }

    #[test]
    fn test_accessors_read_report_fields() {
        let report = QualityReport::from_value(full_report()).unwrap();
        assert_eq!(report.get("summary"), Some(&json!("Users reset passwords with an emailed OTP")));
        assert_eq!(report.clarity_score(), Some(&json!(62)));
        assert_eq!(report.get("unknown_key"), None);
        assert_eq!(report.items("missing_information"), vec!["OTP lifetime".to_string()]);
        assert!(report.items("assumptions").is_empty());
        assert_eq!(report.len(), 10);
    }

    #[test]
    fn test_items_tolerate_odd_shapes() {
        let report = QualityReport::from_value(json!({
            "ambiguities": ["text", 3, {"k": "v"}],
            "edge_cases": "not a list"
        }))
        .unwrap();
        assert_eq!(report.items("ambiguities"), vec!["text", "3", "{\"k\":\"v\"}"]);
        assert!(report.items("edge_cases").is_empty());
        assert!(report.items("test_scenarios").is_empty());
    }

    #[test]
    fn test_key_order_is_preserved() {
        let value: Value =
            serde_json::from_str("{\"zeta\": 1, \"summary\": \"s\", \"alpha\": 2}").unwrap();
        let report = QualityReport::from_value(value).unwrap();
        let text = serde_json::to_string(&report).unwrap();
        assert_eq!(text, "{\"zeta\":1,\"summary\":\"s\",\"alpha\":2}");
    }

    #[test]
    fn test_non_object_is_unexpected_shape() {
        assert!(matches!(
            QualityReport::from_value(json!([1, 2])),
            Err(AnalyzerError::UnexpectedShape(_))
        ));
    }

    #[test]
    fn test_validate_accepts_complete_report() {
        assert!(validate(&full_report()).is_ok());
    }

    #[test]
    fn test_validate_score_bounds() {
        for score in [0, 100] {
            let mut report = full_report();
            report["clarity_score"] = json!(score);
            assert!(validate(&report).is_ok(), "score {} should pass", score);
        }
        for score in [json!(-1), json!(101), json!(150)] {
            let mut report = full_report();
            report["clarity_score"] = score.clone();
            let violations = validate(&report).unwrap_err();
            assert_eq!(violations, vec![format!("clarity_score out of range: {}", score)]);
        }
    }

    #[test]
    fn test_validate_collects_every_violation() {
        let mut report = full_report();
        report.as_object_mut().unwrap().remove("summary");
        report["clarity_score"] = json!("80");
        report["edge_cases"] = json!("none");
        let violations = validate(&report).unwrap_err();
        assert_eq!(
            violations,
            vec![
                "missing key: summary".to_string(),
                "key clarity_score expected integer, got string".to_string(),
                "key edge_cases expected array, got string".to_string(),
            ]
        );
    }

    #[test]
    fn test_validate_rejects_float_score() {
        let mut report = full_report();
        report["clarity_score"] = json!(72.5);
        let violations = validate(&report).unwrap_err();
        assert_eq!(violations, vec!["key clarity_score expected integer, got float".to_string()]);
    }

    #[test]
    fn test_validate_rejects_non_object() {
        assert_eq!(
            validate(&json!("text")).unwrap_err(),
            vec!["report is not a JSON object".to_string()]
        );
    }

    #[test]
    fn test_clarifying_questions_parse() {
        let questions = ClarifyingQuestions::from_value(json!({
            "clarifying_questions": [
                {"id": "Q1", "question": "How long is the OTP valid?", "why_it_matters": "Sets expiry tests"},
                {"id": "Q2", "question": "Is SMS supported?"}
            ]
        }))
        .unwrap();
        assert_eq!(questions.clarifying_questions.len(), 2);
        assert_eq!(questions.clarifying_questions[1].why_it_matters, "");
    }

    #[test]
    fn test_clarifying_questions_missing_list() {
        assert!(matches!(
            ClarifyingQuestions::from_value(json!({"questions": []})),
            Err(AnalyzerError::UnexpectedShape(_))
        ));
    }
}
