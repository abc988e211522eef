use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::severity::{ReportDiagnostic, Severity};
use crate::workspace::ProjectOptions;

/// Contents of a `lint-verify.toml` file. Every section is optional and
/// only overrides what it names.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LintVerifyConfig {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub compiler: CompilerConfig,

    /// Per-diagnostic overrides keyed by id.
    #[serde(default)]
    pub analyzers: BTreeMap<String, ReportDiagnostic>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    pub document_name: Option<String>,
    pub language_version: Option<String>,
    pub preprocessor_symbols: Option<Vec<String>>,
    pub nullable_reference_types: Option<bool>,

    /// Added to the references the base options already carry.
    #[serde(default)]
    pub references: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompilerConfig {
    pub allowed_severity: Option<Severity>,

    /// Added to the allowed ids the base options already carry.
    #[serde(default)]
    pub allowed_ids: Vec<String>,
}

impl LintVerifyConfig {
    /// Layers this file over `base`.
    pub fn apply(&self, mut base: ProjectOptions) -> ProjectOptions {
        let project = &self.project;
        if let Some(name) = &project.document_name {
            base.document_name = name.clone();
        }
        if let Some(version) = &project.language_version {
            base = base.with_language_version(version.as_str());
        }
        if let Some(symbols) = &project.preprocessor_symbols {
            base = base.with_preprocessor_symbols(symbols.iter().cloned());
        }
        if let Some(nullable) = project.nullable_reference_types {
            base = base.with_nullable_reference_types(nullable);
        }
        for reference in &project.references {
            if !base.references.contains(reference) {
                base = base.with_reference(reference.as_str());
            }
        }

        if let Some(severity) = self.compiler.allowed_severity {
            base = base.with_allowed_compiler_severity(severity);
        }
        base = base.with_allowed_compiler_ids(self.compiler.allowed_ids.iter().cloned());

        for (id, report) in &self.analyzers {
            base = base.with_diagnostic_option(id.as_str(), *report);
        }
        base
    }
}

pub const DEFAULT_CONFIG_FILE_NAME: &str = "lint-verify.toml";

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut cur = Some(start_dir);
    while let Some(dir) = cur {
        let candidate = dir.join(DEFAULT_CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        cur = dir.parent();
    }
    None
}

pub fn load_config_file(path: &Path) -> Result<LintVerifyConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    let cfg: LintVerifyConfig = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;
    Ok(cfg)
}

pub fn load_config(
    explicit_path: Option<&Path>,
    start_dir: &Path,
) -> Result<Option<(PathBuf, LintVerifyConfig)>> {
    if let Some(p) = explicit_path {
        let cfg = load_config_file(p)?;
        return Ok(Some((p.to_path_buf(), cfg)));
    }

    let Some(p) = find_config_file(start_dir) else {
        return Ok(None);
    };
    let cfg = load_config_file(&p)?;
    Ok(Some((p, cfg)))
}
