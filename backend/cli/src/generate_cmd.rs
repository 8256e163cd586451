//! `esprobe generate`: one entry sheet in, question sheet files out.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use tracing::info;

use esprobe_config::EsprobeConfig;
use esprobe_core::{Document, LlmProvider};
use esprobe_export::{ExportFormat, Exporter};
use esprobe_planner::providers::{GeminiProvider, MockProvider};
use esprobe_planner::{LayoutPolicy, QuestionGenerator};

use crate::terminal_output::{note_info, note_success, note_warn, render_question_table};

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Entry sheet PDF
    pub pdf: PathBuf,

    /// Output directory (defaults to `export.outputDir` from config)
    #[arg(short, long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Which files to write
    #[arg(short, long, value_enum, default_value_t = FormatChoice::Both)]
    pub format: FormatChoice,

    /// Require five sections with three questions each
    #[arg(long)]
    pub strict: bool,

    /// Use a saved model response instead of calling Gemini
    #[arg(long, value_name = "FILE")]
    pub mock_response: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatChoice {
    Csv,
    Xlsx,
    Both,
}

impl FormatChoice {
    pub fn formats(self) -> &'static [ExportFormat] {
        match self {
            FormatChoice::Csv => &[ExportFormat::Csv],
            FormatChoice::Xlsx => &[ExportFormat::Xlsx],
            FormatChoice::Both => &ExportFormat::ALL,
        }
    }
}

/// Gemini client from config. Fails when no API key is configured.
pub fn gemini_provider(config: &EsprobeConfig) -> Result<Arc<dyn LlmProvider>> {
    let api_key = config.require_api_key()?;
    let provider = GeminiProvider::new(api_key)
        .with_base_url(config.gemini.base_url.as_str())
        .with_timeout(Duration::from_secs(config.gemini.timeout_secs))?;
    Ok(Arc::new(provider))
}

pub fn build_generator(
    config: &EsprobeConfig,
    provider: Arc<dyn LlmProvider>,
    strict: bool,
) -> QuestionGenerator {
    let policy = if strict || config.generation.strict_layout {
        LayoutPolicy::Strict
    } else {
        LayoutPolicy::Trust
    };
    QuestionGenerator::new(provider, config.gemini.model.as_str()).with_policy(policy)
}

pub async fn run(args: GenerateArgs, config: &EsprobeConfig) -> Result<()> {
    // The key check comes before any input is read.
    let provider: Arc<dyn LlmProvider> = match &args.mock_response {
        Some(path) => {
            let canned = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read mock response: {}", path.display()))?;
            Arc::new(MockProvider::new("mock").with_response(canned))
        }
        None => gemini_provider(config)?,
    };
    let generator = build_generator(config, provider, args.strict);

    let document = Document::read(&args.pdf).await?;
    note_info(&format!(
        "{} を読み込みました（{} bytes）。質問リストを生成しています…",
        document.file_name(),
        document.len()
    ));

    let table = generator.generate(&document).await?;
    print!("{}", render_question_table(&table));

    let out_dir = args
        .out
        .unwrap_or_else(|| PathBuf::from(&config.export.output_dir));
    let report = Exporter::new()
        .write_all(&table, &out_dir, args.format.formats())
        .await?;

    for path in &report.written {
        note_success(&format!("{} を保存しました", path.display()));
    }
    for warning in &report.warnings {
        note_warn(warning);
    }
    info!(rows = table.len(), files = report.written.len(), "Generate command finished");
    Ok(())
}
