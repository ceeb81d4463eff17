use std::fs;
use std::path::Path;

use crate::error::{AnalyzerError, Result};

pub const REQUIREMENT: &str = "{{REQUIREMENT}}";
pub const QA: &str = "{{QA}}";

/// A prompt template with named markers, each occurring exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    /// Validate `text` against the markers it must contain.
    pub fn new(text: impl Into<String>, placeholders: &[&'static str]) -> Result<Self> {
        let text = text.into();
        for placeholder in placeholders {
            let count = text.matches(placeholder).count();
            if count != 1 {
                return Err(AnalyzerError::InvalidTemplate {
                    placeholder: placeholder.to_string(),
                    count,
                });
            }
        }
        Ok(Self { text })
    }

    /// Load a single-requirement template from disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())
            .map_err(|e| AnalyzerError::filesystem(path.as_ref(), e))?;
        Self::new(text.trim().to_string(), &[REQUIREMENT])
    }

    /// Substitute every marker in one pass over the template.
    ///
    /// Inserted values are copied verbatim and never rescanned, so a value
    /// that contains a marker token shows up literally in the output.
    /// Markers without a value are left in place.
    pub fn render(&self, values: &[(&str, &str)]) -> String {
        let mut spans: Vec<(usize, &str, &str)> = values
            .iter()
            .filter_map(|(marker, value)| {
                self.text.find(marker).map(|pos| (pos, *marker, *value))
            })
            .collect();
        spans.sort_by_key(|(pos, _, _)| *pos);

        let mut out = String::with_capacity(
            self.text.len() + values.iter().map(|(_, v)| v.len()).sum::<usize>(),
        );
        let mut cursor = 0;
        for (pos, marker, value) in spans {
            out.push_str(&self.text[cursor..pos]);
            out.push_str(value);
            cursor = pos + marker.len();
        }
        out.push_str(&self.text[cursor..]);
        out
    }
}

/// One clarifying question together with the user's answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub id: String,
    pub question: String,
    pub answer: String,
}

/// Format answers as `"{id}. {question}\nAnswer: {answer}"` blocks.
pub fn format_answers(answers: &[Answer]) -> String {
    answers
        .iter()
        .map(|a| format!("{}. {}\nAnswer: {}", a.id, a.question, a.answer.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
        .trim()
        .to_string()
}

/// The three prompts a run can send.
#[derive(Debug, Clone)]
pub struct PromptSet {
    pub analyze: PromptTemplate,
    pub clarify: PromptTemplate,
    pub improve: PromptTemplate,
}

impl PromptSet {
    pub fn builtin() -> Self {
        Self {
            analyze: PromptTemplate { text: default_analyze_prompt() },
            clarify: PromptTemplate { text: default_clarify_prompt() },
            improve: PromptTemplate { text: default_improve_prompt() },
        }
    }

    /// Built-in prompts, with the analyze prompt optionally read from a file.
    pub fn load(analyze_template: Option<&Path>) -> Result<Self> {
        let mut set = Self::builtin();
        if let Some(path) = analyze_template {
            set.analyze = PromptTemplate::from_file(path)?;
        }
        Ok(set)
    }

    pub fn compose_analyze(&self, requirement: &str) -> String {
        self.analyze.render(&[(REQUIREMENT, requirement)])
    }

    pub fn compose_clarify(&self, requirement: &str) -> String {
        self.clarify.render(&[(REQUIREMENT, requirement)])
    }

    pub fn compose_improve(&self, requirement: &str, answers: &[Answer]) -> String {
        let qa = format_answers(answers);
        self.improve.render(&[(REQUIREMENT, requirement), (QA, &qa)])
    }
}

const REPORT_SCHEMA: &str = r#"{
  "summary": "string",
  "clarity_score": 0,
  "clarity_score_reason": "string",
  "ambiguities": ["string"],
  "missing_information": ["string"],
  "assumptions": ["string"],
  "risks_and_dependencies": ["string"],
  "edge_cases": ["string"],
  "acceptance_criteria": ["string"],
  "test_scenarios": ["string"]
}"#;

const QUESTIONS_SCHEMA: &str = r#"{
  "clarifying_questions": [
    {"id": "Q1", "question": "string", "why_it_matters": "string"}
  ]
}"#;

fn default_analyze_prompt() -> String {
    format!(
        r#"You are a Senior QA Lead and Requirements Analyst.

Evaluate the requirement and return ONLY valid JSON in this exact schema:

{}

Rules:
- clarity_score must be an integer from 0 to 100.
- Keep each bullet short and specific.

Requirement:
{}"#,
        REPORT_SCHEMA, REQUIREMENT
    )
}

fn default_clarify_prompt() -> String {
    format!(
        r#"You are a Senior QA Lead.

Task:
Ask clarifying questions to remove ambiguity and make the requirement testable.

Return ONLY valid JSON in this exact schema (no markdown, no extra text):
{}

Rules:
- Ask 6-10 focused, answerable questions.
- Prefer questions that produce concrete values or boolean choices (limits, formats, expiry, retries, roles, permissions).
- Order by importance (most impactful to least).
- why_it_matters must be one concise sentence.

Requirement:
{}"#,
        QUESTIONS_SCHEMA, REQUIREMENT
    )
}

fn default_improve_prompt() -> String {
    format!(
        r#"You are a Senior QA Lead and Requirements Analyst.

Task:
Use the stakeholder answers to improve the requirement analysis and produce a refreshed quality report.

Return ONLY valid JSON in this exact schema (no markdown, no extra text):
{}

Rules:
- clarity_score must be an integer 0-100.
- Keep each list item short and specific (one sentence).
- Acceptance criteria: atomic, testable, prefer Gherkin.
- Test scenarios: provide 6-12 realistic scenarios, each a single line:
  "Title - Preconditions - Steps - Expected Result".
- If any answers are still vague, call that out under missing_information.

Original Requirement:
{}

Clarifying Q&A:
{}"#,
        REPORT_SCHEMA, REQUIREMENT, QA
    )
}
