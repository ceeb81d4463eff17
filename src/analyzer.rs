use log::info;

use crate::error::Result;
use crate::extractor::extract_json;
use crate::llm_manager::LLMManager;
use crate::prompt::{Answer, PromptSet};
use crate::report::{ClarifyingQuestion, ClarifyingQuestions, QualityReport};
use crate::requirement::Requirement;
use crate::writer::ReportWriter;

/// Turns a requirement into a quality report by way of the model.
///
/// Each call composes one prompt, sends it once and extracts the JSON
/// object from the reply. Failures are returned as-is; nothing is retried.
pub struct Analyzer<'a> {
    llm_manager: &'a LLMManager,
    prompts: PromptSet,
}

impl<'a> Analyzer<'a> {
    pub fn new(llm_manager: &'a LLMManager, prompts: PromptSet) -> Self {
        Self { llm_manager, prompts }
    }

    /// Review a requirement and return the report as the model wrote it.
    pub async fn analyze(&self, requirement: &Requirement) -> Result<QualityReport> {
        let prompt = self.prompts.compose_analyze(requirement.as_str());
        self.request_report(&prompt).await
    }

    /// Review a requirement, hand the report to `show`, then save it.
    ///
    /// `show` runs before the write, so a report the model produced is still
    /// displayed when saving fails. Nothing is written if extraction fails.
    pub async fn analyze_and_save<F>(
        &self,
        requirement: &Requirement,
        writer: &ReportWriter,
        show: F,
    ) -> Result<QualityReport>
    where
        F: FnOnce(&QualityReport),
    {
        let report = self.analyze(requirement).await?;
        show(&report);
        writer.write(&report)?;
        Ok(report)
    }

    /// Ask the model what it needs to know to make the requirement testable.
    pub async fn clarifying_questions(
        &self,
        requirement: &Requirement,
    ) -> Result<Vec<ClarifyingQuestion>> {
        let prompt = self.prompts.compose_clarify(requirement.as_str());
        let reply = self.llm_manager.send_prompt(&prompt).await?;
        let questions = ClarifyingQuestions::from_value(extract_json(&reply)?)?;
        info!("Model asked {} clarifying questions", questions.clarifying_questions.len());
        Ok(questions.clarifying_questions)
    }

    /// Re-run the review with the user's answers folded into the prompt.
    pub async fn improve(
        &self,
        requirement: &Requirement,
        answers: &[Answer],
    ) -> Result<QualityReport> {
        let prompt = self.prompts.compose_improve(requirement.as_str(), answers);
        self.request_report(&prompt).await
    }

    async fn request_report(&self, prompt: &str) -> Result<QualityReport> {
        let reply = self.llm_manager.send_prompt(prompt).await?;
        let report = QualityReport::from_value(extract_json(&reply)?)?;
        info!("Extracted report with {} keys", report.len());
        Ok(report)
    }
}
