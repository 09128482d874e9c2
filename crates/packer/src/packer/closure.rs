//! Closure Compiler Service API client.
//!
//! One blocking form-encoded POST per build. The response is JSON with
//! optional `serverErrors`, `errors`, `warnings`, `statistics` and
//! `compiledCode` fields.

use super::collect::Sources;
use super::config::ServiceConfig;
use super::error::PipelineError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

/// Something that turns a bundle into an optimized bundle.
pub trait Optimizer {
    fn compile(&self, sources: &Sources) -> Result<CompileResponse>;
}

/// Parsed service response.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileResponse {
    pub compiled_code: Option<String>,
    pub server_errors: Option<Vec<ServerError>>,
    pub errors: Option<Vec<CompileError>>,
    pub warnings: Option<Vec<CompileWarning>>,
    pub statistics: Option<Statistics>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerError {
    pub code: i64,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompileError {
    pub lineno: i64,
    pub charno: i64,
    pub error: String,
    #[serde(default)]
    pub line: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompileWarning {
    pub lineno: i64,
    pub charno: i64,
    pub warning: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub original_size: u64,
    pub compressed_size: u64,
    pub compile_time: u64,
}

/// Remote optimizer over HTTPS.
pub struct ClosureService {
    client: reqwest::blocking::Client,
    config: ServiceConfig,
}

impl ClosureService {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        // The blocking client defaults to a 30 s timeout; keep "none" unless configured.
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout_secs.map(Duration::from_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: reqwest::blocking::Client, config: &ServiceConfig) -> Self {
        Self {
            client,
            config: config.clone(),
        }
    }
}

impl Optimizer for ClosureService {
    fn compile(&self, sources: &Sources) -> Result<CompileResponse> {
        println!("\nRequesting compiled code from Google Closure Compiler Service API...");
        println!("  (You must accept the Google Terms of Service to use this API)");

        let form = request_form(sources, &self.config);
        tracing::debug!(
            "POST {} ({} bytes of code, {} bytes of externs)",
            self.config.url,
            sources.bundle.len(),
            sources.externs.len()
        );

        let response = self
            .client
            .post(&self.config.url)
            .form(&form)
            .send()
            .with_context(|| format!("Request to {} failed", self.config.url))?;
        let status = response.status();
        let body = response
            .bytes()
            .context("Failed to read compiler response")?;
        tracing::debug!("HTTP {status}, {} byte body", body.len());

        let parsed = parse_response(&body)
            .with_context(|| format!("Compiler service answered HTTP {status}"))?;
        println!("Request complete");
        Ok(parsed)
    }
}

/// Form fields for one compilation. `output_info` repeats once per field.
pub fn request_form<'a>(
    sources: &'a Sources,
    config: &'a ServiceConfig,
) -> Vec<(&'static str, &'a str)> {
    let mut form = vec![
        ("js_code", sources.bundle.as_str()),
        ("js_externs", sources.externs.as_str()),
        ("compilation_level", config.compilation_level.as_str()),
        ("language_out", config.language_out.as_str()),
        ("output_format", config.output_format.as_str()),
    ];
    form.extend(config.output_info.iter().map(|info| ("output_info", info.as_str())));
    form
}

/// Decode a response body. An empty body is a deliberate abort.
pub fn parse_response(body: &[u8]) -> Result<CompileResponse> {
    if body.is_empty() {
        return Err(PipelineError::EmptyResponse.into());
    }
    serde_json::from_slice(body).context("Failed to parse compiler response as JSON")
}
