use std::{io::Write, process::ExitCode};

use anyhow::{anyhow, Context, Result};
use log::{error, info, log_enabled, Level};

use super::{import_pdf, speak};
use crate::config::{AppConfig, AwsSettings};
use crate::polly::{ServiceError, SpeechService};

/// Status reported for any synthesis failure, the `-1` of other platforms.
pub const SYNTHESIS_FAILURE_STATUS: u8 = 255;

/// Extracts the configured PDF and turns its text into speech.
///
/// Extraction failures are returned as errors and end the program
/// uncaught. Synthesis failures are logged and mapped to
/// [`SYNTHESIS_FAILURE_STATUS`].
pub fn run<S, F>(config: &AppConfig, connect: F) -> Result<ExitCode>
where
    S: SpeechService,
    F: FnOnce(&AwsSettings) -> Result<S, ServiceError>,
{
    let pdf_file = config
        .pdf_file
        .as_deref()
        .ok_or_else(|| anyhow!("PDF_FILE is not configured"))?;
    let text = import_pdf::extract_text(pdf_file)
        .with_context(|| format!("unable to read text from {}", pdf_file.display()))?;

    let outcome = connect(&config.aws)
        .map_err(speak::SynthesisFailure::from)
        .and_then(|service| speak::synthesize(&service, &text, &config.output_path));

    match outcome {
        Ok(response) => {
            info!(
                "Speech saved to {} in {} ms",
                response.output_path.display(),
                response.duration_ms
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            report(&err, log_enabled!(Level::Error), &mut std::io::stderr());
            Ok(ExitCode::from(SYNTHESIS_FAILURE_STATUS))
        }
    }
}

/// Logs the failure, or writes it to `fallback` when no logger is active.
fn report(err: &speak::SynthesisFailure, logger_active: bool, fallback: &mut dyn Write) {
    let line = format!("[{}] {err}", err.code());
    if logger_active {
        error!("{line}");
    } else {
        let _ = writeln!(fallback, "{line}");
    }
}
