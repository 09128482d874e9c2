//! Result reporting.
//!
//! Precedence is strict: server errors, then compile errors, then warnings.
//! The first two abort the build whatever else the response holds.

use super::closure::{CompileError, CompileResponse, CompileWarning, ServerError, Statistics};
use super::error::PipelineError;

/// Print diagnostics for `response` and decide whether the build may go on.
///
/// `bundle_name` prefixes compile error and warning locations.
pub fn report(response: &CompileResponse, bundle_name: &str) -> Result<(), PipelineError> {
    if let Some(errors) = non_empty(&response.server_errors) {
        println!("\nServer errors:");
        println!("{}", server_errors(errors));
        return Err(PipelineError::ServerErrors(errors.len()));
    }

    if let Some(errors) = non_empty(&response.errors) {
        println!("\nErrors:");
        println!("{}", compile_errors(errors, bundle_name));
        return Err(PipelineError::CompileErrors(errors.len()));
    }

    if let Some(warnings) = non_empty(&response.warnings) {
        println!("\nWarnings:");
        println!("{}", compile_warnings(warnings, bundle_name));
    }

    match &response.statistics {
        Some(stats) => println!("\n{}", statistics(stats)),
        None => tracing::warn!("response carries no statistics"),
    }

    Ok(())
}

fn non_empty<T>(list: &Option<Vec<T>>) -> Option<&[T]> {
    list.as_deref().filter(|items| !items.is_empty())
}

#[must_use]
pub fn server_errors(errors: &[ServerError]) -> String {
    errors
        .iter()
        .map(|e| format!("  {} - {}", e.code, e.error))
        .collect::<Vec<_>>()
        .join("\n")
}

#[must_use]
pub fn compile_errors(errors: &[CompileError], bundle_name: &str) -> String {
    errors
        .iter()
        .map(|e| {
            format!(
                "  {bundle_name}:{}:{} - {}\n    \"{}\"",
                e.lineno,
                e.charno,
                e.error,
                e.line.as_deref().unwrap_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[must_use]
pub fn compile_warnings(warnings: &[CompileWarning], bundle_name: &str) -> String {
    warnings
        .iter()
        .map(|w| format!("  {bundle_name}:{}:{} - {}", w.lineno, w.charno, w.warning))
        .collect::<Vec<_>>()
        .join("\n")
}

#[must_use]
pub fn statistics(stats: &Statistics) -> String {
    format!(
        "Statistics:\n  Original size: {} bytes\n  Compressed size: {} bytes\n  Compile time: {} seconds",
        stats.original_size, stats.compressed_size, stats.compile_time
    )
}
