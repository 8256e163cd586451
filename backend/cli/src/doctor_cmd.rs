//! CLI Doctor Command
//!
//! Reports whether this machine can generate and export question sheets.

use std::path::Path;

use anyhow::Result;

use esprobe_config::{mask_secret, redact, validate, EsprobeConfig};
use esprobe_export::SpreadsheetCapability;

/// Executes the full doctor diagnosis.
pub async fn run(config: &EsprobeConfig, config_path: &Path) -> Result<()> {
    println!("\n🔍 Running esprobe Doctor...\n");
    println!("Config file: {}", config_path.display());

    let checks = [
        check_config(config),
        check_api_key(config),
        check_output_dir(Path::new(&config.export.output_dir)).await,
        check_spreadsheet(),
    ];

    println!();
    if checks.iter().all(|ok| *ok) {
        println!("✅ All checks passed! esprobe is ready.");
    } else {
        println!("❌ Some checks failed! Please fix the errors above.");
    }

    println!("\nEffective configuration:");
    println!("{}", serde_json::to_string_pretty(&redact(config))?);
    Ok(())
}

fn check_config(config: &EsprobeConfig) -> bool {
    println!("Checking Configuration:");
    let report = validate(config);
    for error in &report.errors {
        println!("  🔴 {}: {}", error.path, error.message);
    }
    if report.errors.is_empty() {
        println!("  🟢 Settings are valid (model {})", config.gemini.model);
    }
    report.is_valid()
}

fn check_api_key(config: &EsprobeConfig) -> bool {
    println!("Checking Gemini API Key:");
    match config.require_api_key() {
        Ok(key) => {
            println!("  🟢 GEMINI_API_KEY is set ({})", mask_secret(key));
            true
        }
        Err(_) => {
            println!("  🔴 GEMINI_API_KEY is missing (REQUIRED)");
            false
        }
    }
}

async fn check_output_dir(dir: &Path) -> bool {
    println!("Checking Output Directory:");
    let probe = dir.join(".esprobe-write-test");
    let writable = async {
        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(&probe, b"ok").await?;
        tokio::fs::remove_file(&probe).await
    }
    .await;

    match writable {
        Ok(()) => {
            println!("  🟢 {} is writable", dir.display());
            true
        }
        Err(e) => {
            println!("  🔴 {} is not writable: {e}", dir.display());
            false
        }
    }
}

fn check_spreadsheet() -> bool {
    println!("Checking Spreadsheet Export:");
    match SpreadsheetCapability::detect() {
        SpreadsheetCapability::Available => println!("  🟢 XLSX export is available"),
        SpreadsheetCapability::Unavailable(reason) => {
            println!("  🟡 XLSX export is unavailable (optional): {reason}")
        }
    }
    true
}
