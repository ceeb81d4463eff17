use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

mod analyzer;
mod config;
mod error;
mod extractor;
mod llm_manager;
mod logger;
mod prompt;
mod providers;
mod report;
mod requirement;
mod ui;
mod writer;

use analyzer::Analyzer;
use config::Config;
use error::AnalyzerError;
use llm_manager::LLMManager;
use prompt::{Answer, PromptSet};
use providers::gemini::GeminiProvider;
use requirement::{read_answer, read_requirement};
use ui::UIHandler;
use writer::ReportWriter;

#[derive(Parser)]
#[command(name = "req_quality_analyzer", version, about)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<String>,
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Run without colors, spinners or report rendering
    #[arg(long, global = true)]
    headless: bool,
    /// Model identifier (overrides config and GEMINI_MODEL)
    #[arg(short, long, global = true)]
    model: Option<String>,
    /// Report file to write or check
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Review a requirement read from stdin (default)
    Analyze,
    /// Answer clarifying questions first, then review
    Clarify,
    /// Validate a saved report against the report schema
    Check {
        /// Report file; defaults to the configured output path
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logger::init(args.verbose);
    if let Ok(path) = dotenv::dotenv() {
        info!("Loaded environment from {}", path.display());
    }

    let mut config = Config::load(&args.config)?;
    config.apply_env();
    config.merge_with_args(args.headless, args.model, args.output);
    let ui = UIHandler::new(args.headless, &config.ui);

    match args.command.unwrap_or(Command::Analyze) {
        Command::Analyze => analyze(&config, &ui).await,
        Command::Clarify => clarify(&config, &ui).await,
        Command::Check { path } => check(&config, path),
    }
}

fn build_llm_manager(config: &Config) -> Result<LLMManager> {
    let provider = GeminiProvider::from_env(&config.generation)?;
    let manager = LLMManager::new(Box::new(provider));
    info!(
        "Using {} model {} (timeout: {})",
        manager.provider().name(),
        manager.provider().model_name(),
        config
            .generation
            .request_timeout()
            .map(|t| format!("{}s", t.as_secs()))
            .unwrap_or_else(|| "none".to_string())
    );
    Ok(manager)
}

async fn analyze(config: &Config, ui: &UIHandler) -> Result<()> {
    let llm_manager = build_llm_manager(config)?;
    let prompts = PromptSet::load(config.prompt.analyze_template.as_deref())?;

    ui.prompt_requirement();
    let requirement = read_requirement(&mut io::stdin().lock())?;
    if requirement.is_empty() {
        println!("No requirement provided. Exiting.");
        return Ok(());
    }

    let analyzer = Analyzer::new(&llm_manager, prompts);
    let writer = ReportWriter::new(&config.output.report_path);

    let mut spinner = ui.spinner("Analyzing requirement...");
    let result = analyzer
        .analyze_and_save(&requirement, &writer, |report| {
            if let Some(bar) = spinner.take() {
                bar.finish_and_clear();
            }
            ui.render_report(report);
        })
        .await;
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }
    result.context("Requirement analysis failed")?;

    ui.saved(writer.path());
    Ok(())
}

async fn clarify(config: &Config, ui: &UIHandler) -> Result<()> {
    let llm_manager = build_llm_manager(config)?;
    let prompts = PromptSet::load(config.prompt.analyze_template.as_deref())?;

    let mut input = io::stdin().lock();
    ui.prompt_requirement();
    let requirement = read_requirement(&mut input)?;
    if requirement.is_empty() {
        println!("No requirement provided. Exiting.");
        return Ok(());
    }

    let analyzer = Analyzer::new(&llm_manager, prompts);

    let spinner = ui.spinner("Generating clarifying questions...");
    let result = analyzer.clarifying_questions(&requirement).await;
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }
    let questions = result.context("Failed to get clarifying questions")?;
    if questions.is_empty() {
        warn!("Model returned no clarifying questions");
    }

    let mut answers = Vec::with_capacity(questions.len());
    for question in questions {
        ui.show_question(&question);
        let answer = read_answer(&mut input)?;
        answers.push(Answer { id: question.id, question: question.question, answer });
    }

    let writer = ReportWriter::new(&config.output.report_path);
    let spinner = ui.spinner("Improving analysis...");
    let result = analyzer.improve(&requirement, &answers).await;
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }
    let report = result.context("Improved analysis failed")?;

    ui.render_report(&report);
    writer.write(&report)?;
    ui.saved(writer.path());
    Ok(())
}

fn check(config: &Config, path: Option<PathBuf>) -> Result<()> {
    let writer = ReportWriter::new(path.unwrap_or_else(|| config.output.report_path.clone()));
    let value = writer.read()?;
    report::validate(&value).map_err(AnalyzerError::ReportInvalid)?;
    println!("OK: {} looks valid", writer.path().display());
    Ok(())
}
