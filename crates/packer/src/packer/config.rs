//! Build configuration.
//!
//! Defaults reproduce the game's release layout. A `packer.json` at the
//! project root (or `--config <file>`) overrides any subset of the fields.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Config file looked up at the project root when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "packer.json";

/// Everything the pipeline needs to know about the project.
///
/// Paths are relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Output directory, recreated on every run.
    pub build_dir: PathBuf,
    /// Non-script files copied into the build directory and the archive.
    pub assets: Vec<PathBuf>,
    /// Scripts concatenated, in order, into the bundle.
    pub scripts: Vec<PathBuf>,
    /// Declarations of symbols the optimizer must not rename.
    pub externs: PathBuf,
    /// Literal removed from the concatenated scripts.
    pub strip_directive: String,
    /// Pre-optimization bundle name inside the build directory.
    pub bundle_original: String,
    /// Optimized bundle name inside the build directory.
    pub bundle: String,
    /// Archive name inside the build directory.
    pub archive: String,
    /// Extra pause after filesystem writes, in milliseconds.
    pub settle_ms: u64,
    pub service: ServiceConfig,
    pub archiver: ArchiverConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            build_dir: PathBuf::from("build"),
            assets: vec![
                PathBuf::from("src/index.html"),
                PathBuf::from("src/public/js/resources.js"),
                PathBuf::from("src/public/js/three.js"),
                PathBuf::from("src/public/js/BufferGeometryUtils.js"),
            ],
            scripts: vec![
                PathBuf::from("src/public/tinysequencer/tinysequencer.js"),
                PathBuf::from("src/public/js/game.js"),
            ],
            externs: PathBuf::from("src/externs.js"),
            strip_directive: "'use strict';".to_string(),
            bundle_original: "bundle_original.js".to_string(),
            bundle: "bundle.js".to_string(),
            archive: "compressed.zip".to_string(),
            settle_ms: 0,
            service: ServiceConfig::default(),
            archiver: ArchiverConfig::default(),
        }
    }
}

/// Remote optimizer endpoint and compilation flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    pub url: String,
    pub compilation_level: String,
    pub language_out: String,
    pub output_format: String,
    pub output_info: Vec<String>,
    /// No timeout when unset.
    pub timeout_secs: Option<u64>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            url: "https://closure-compiler.appspot.com/compile".to_string(),
            compilation_level: "ADVANCED_OPTIMIZATIONS".to_string(),
            language_out: "ECMASCRIPT_2017".to_string(),
            output_format: "json".to_string(),
            output_info: ["compiled_code", "warnings", "errors", "statistics"]
                .iter()
                .map(ToString::to_string)
                .collect(),
            timeout_secs: None,
        }
    }
}

/// External archiver invocation: `program args... <archive> <inputs...>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiverConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for ArchiverConfig {
    fn default() -> Self {
        Self {
            program: "7z".to_string(),
            args: vec!["a".to_string()],
        }
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub service_url: Option<String>,
    pub archiver: Option<String>,
}

impl Config {
    /// Load the config for `root`.
    ///
    /// An explicit `path` must exist. Without one, `packer.json` at the root is
    /// used when present and the built-in defaults otherwise.
    pub fn load(root: &Path, path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let candidate = root.join(DEFAULT_CONFIG_FILE);
                if !candidate.exists() {
                    tracing::debug!("no {} found, using defaults", candidate.display());
                    return Ok(Self::default());
                }
                candidate
            }
        };

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        tracing::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply command-line overrides.
    #[must_use]
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(url) = overrides.service_url {
            self.service.url = url;
        }
        if let Some(program) = overrides.archiver {
            self.archiver.program = program;
        }
        self
    }

    /// Reject layouts that would make the recursive delete of the build
    /// directory hit the project root or anything outside it.
    pub fn validate(&self) -> Result<()> {
        let mut depth = 0;
        for component in self.build_dir.components() {
            match component {
                Component::Normal(_) => depth += 1,
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => bail!(
                    "build_dir must be a relative path inside the project without '..': {}",
                    self.build_dir.display()
                ),
            }
        }
        if depth == 0 {
            bail!(
                "build_dir must name a directory below the project root, got {:?}",
                self.build_dir.display().to_string()
            );
        }

        for (field, name) in [
            ("bundle_original", &self.bundle_original),
            ("bundle", &self.bundle),
            ("archive", &self.archive),
        ] {
            let mut components = Path::new(name).components();
            if !matches!(
                (components.next(), components.next()),
                (Some(Component::Normal(_)), None)
            ) {
                bail!("{field} must be a plain file name, got {name:?}");
            }
        }
        Ok(())
    }

    /// The build directory under `root`, after [`Config::validate`].
    pub fn build_dir_path(&self, root: &Path) -> Result<PathBuf> {
        self.validate()?;
        Ok(root.join(&self.build_dir))
    }

    pub fn bundle_original_path(&self, root: &Path) -> PathBuf {
        root.join(&self.build_dir).join(&self.bundle_original)
    }

    pub fn bundle_path(&self, root: &Path) -> PathBuf {
        root.join(&self.build_dir).join(&self.bundle)
    }

    pub fn archive_path(&self, root: &Path) -> PathBuf {
        root.join(&self.build_dir).join(&self.archive)
    }
}
