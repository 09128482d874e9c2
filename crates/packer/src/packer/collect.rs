//! Source collection: bundle the scripts and load the externs.

use super::config::Config;
use anyhow::{Context, Result};
use std::path::Path;

/// Inputs sent to the optimizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sources {
    /// Concatenated scripts with the directive stripped.
    pub bundle: String,
    /// Externs file, unmodified.
    pub externs: String,
}

/// Read every configured script and the externs file.
pub fn collect(root: &Path, config: &Config) -> Result<Sources> {
    println!("Reading Javascript files...");

    let mut texts = Vec::with_capacity(config.scripts.len());
    for script in &config.scripts {
        let path = root.join(script);
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read script: {}", path.display()))?;
        tracing::debug!("read {} ({} bytes)", path.display(), text.len());
        texts.push(text);
    }

    let externs_path = root.join(&config.externs);
    let externs = std::fs::read_to_string(&externs_path)
        .with_context(|| format!("Failed to read externs: {}", externs_path.display()))?;

    Ok(Sources {
        bundle: concat_scripts(&texts, &config.strip_directive),
        externs,
    })
}

/// Join scripts in order, each followed by a newline, then remove every
/// occurrence of `directive`.
#[must_use]
pub fn concat_scripts<S: AsRef<str>>(texts: &[S], directive: &str) -> String {
    let mut bundle = String::new();
    for text in texts {
        bundle.push_str(text.as_ref());
        bundle.push('\n');
    }
    if directive.is_empty() {
        bundle
    } else {
        bundle.replace(directive, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_strict_directive_removed_and_joined() {
        let bundle = concat_scripts(&["'use strict';\nfoo();", "bar();"], "'use strict';");
        assert_eq!(bundle, "\nfoo();\nbar();\n");
    }

    #[test]
    fn test_every_occurrence_removed() {
        let bundle = concat_scripts(
            &["'use strict';a();'use strict';", "function f(){'use strict';}"],
            "'use strict';",
        );
        assert_eq!(bundle, "a();\nfunction f(){}\n");
    }

    #[test]
    fn test_double_quoted_directive_kept() {
        let bundle = concat_scripts(&["\"use strict\";"], "'use strict';");
        assert_eq!(bundle, "\"use strict\";\n");
    }

    #[test]
    fn test_collect_reads_in_order() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        std::fs::write(root.join("a.js"), "'use strict';\nfoo();").unwrap();
        std::fs::write(root.join("b.js"), "bar();").unwrap();
        std::fs::write(root.join("externs.js"), "var THREE;\n'use strict';").unwrap();

        let config = Config {
            scripts: vec![PathBuf::from("a.js"), PathBuf::from("b.js")],
            externs: PathBuf::from("externs.js"),
            ..Config::default()
        };

        let sources = collect(root, &config).unwrap();
        assert_eq!(sources.bundle, "\nfoo();\nbar();\n");
        assert_eq!(sources.externs, "var THREE;\n'use strict';");
    }

    #[test]
    fn test_missing_script_fails() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("externs.js"), "").unwrap();
        let config = Config {
            scripts: vec![PathBuf::from("missing.js")],
            externs: PathBuf::from("externs.js"),
            ..Config::default()
        };

        let err = collect(tmp.path(), &config).unwrap_err();
        assert!(err.to_string().contains("missing.js"));
    }
}
