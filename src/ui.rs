use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;

use crate::config::UIConfig;
use crate::report::{ClarifyingQuestion, QualityReport, LIST_SECTIONS};

/// Terminal output for a run.
pub struct UIHandler {
    pub headless: bool,
    spinner: bool,
}

impl UIHandler {
    pub fn new(headless: bool, config: &UIConfig) -> Self {
        if !config.colorful {
            colored::control::set_override(false);
        }
        Self { headless, spinner: config.spinner && !headless }
    }

    pub fn prompt_requirement(&self) {
        if !self.headless {
            println!("Paste your requirement. Press Enter on an empty line to finish:\n");
        }
    }

    /// Start a spinner; finished when the returned handle is cleared.
    pub fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if !self.spinner {
            return None;
        }
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            bar.set_style(style);
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Some(bar)
    }

    pub fn render_report(&self, report: &QualityReport) {
        if !self.headless {
            print!("{}", format_report(report));
        }
    }

    pub fn show_question(&self, question: &ClarifyingQuestion) {
        if self.headless {
            return;
        }
        println!("{}", format!("{}: {}", question.id, question.question).bold());
        if !question.why_it_matters.is_empty() {
            println!("  {}", question.why_it_matters.dimmed());
        }
        print!("Answer for {}: ", question.id);
        let _ = std::io::Write::flush(&mut std::io::stdout());
    }

    pub fn saved(&self, path: &Path) {
        println!("{} Saved JSON output to {}", "✔".green(), path.display());
    }
}

fn scalar(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "None".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Render a report as the titled, sectioned text shown after a run.
pub fn format_report(report: &QualityReport) -> String {
    let rule = "============================".bright_blue();
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", rule);
    let _ = writeln!(out, "{}", " Requirement Review Report".bright_white().bold());
    let _ = writeln!(out, "{}\n", rule);

    let _ = writeln!(out, "{} {}\n", "Summary:".bold(), scalar(report.get("summary")));
    let _ = writeln!(
        out,
        "{} {} / 100",
        "Clarity Score:".bold(),
        scalar(report.clarity_score()).cyan()
    );
    let _ = writeln!(
        out,
        "{} {}\n",
        "Reason:".bold(),
        scalar(report.get("clarity_score_reason"))
    );

    for (key, title) in LIST_SECTIONS {
        let _ = writeln!(out, "{}", format!("{}:", title).yellow().bold());
        let items = report.items(key);
        if items.is_empty() {
            let _ = writeln!(out, "- (none)");
        }
        for item in items {
            let _ = writeln!(out, "- {}", item);
        }
        let _ = writeln!(out);
    }
    out
}
