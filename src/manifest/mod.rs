//! Research-project manifest model and validation.
//!
//! The manifest declares the project, its runtime and development
//! dependency tables with version constraints, and tool configuration for
//! formatting and versioning policy. Validation checks the properties a
//! packaging pass relies on: every dependency names a package and carries
//! a resolvable constraint, and each tool section matches its schema.

use crate::utils::error::{PredictError, Result};
use crate::utils::validation::{validate_placeholder, validate_range, Validate};
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectManifest {
    pub project: ProjectSection,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "dev-dependencies")]
    pub dev_dependencies: BTreeMap<String, String>,
    pub tool: Option<ToolSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectSection {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolSection {
    pub format: Option<FormatConfig>,
    pub versioning: Option<VersioningConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FormatConfig {
    pub line_length: usize,
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct VersioningConfig {
    pub tag_format: String,
    #[serde(default)]
    pub changelog: bool,
    pub bump_message: Option<String>,
}

/// A single structural problem found in a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestIssue {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ManifestIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl ProjectManifest {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PredictError::Io)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| PredictError::ConfigValidation {
            field: "manifest".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Collects every structural problem instead of stopping at the first.
    pub fn issues(&self) -> Vec<ManifestIssue> {
        let mut issues = Vec::new();

        if self.project.name.trim().is_empty() {
            issues.push(ManifestIssue {
                field: "project.name".to_string(),
                message: "Project name cannot be empty".to_string(),
            });
        }

        if let Err(e) = parse_version(&self.project.version) {
            issues.push(ManifestIssue {
                field: "project.version".to_string(),
                message: e,
            });
        }

        check_dependency_table("dependencies", &self.dependencies, &mut issues);
        check_dependency_table("dev-dependencies", &self.dev_dependencies, &mut issues);

        if let Some(tool) = &self.tool {
            if let Some(format) = &tool.format {
                if let Err(e) =
                    validate_range("tool.format.line-length", format.line_length, 40, 200)
                {
                    issues.push(ManifestIssue {
                        field: "tool.format.line-length".to_string(),
                        message: e.user_friendly_message(),
                    });
                }
                for path in &format.exclude {
                    if path.trim().is_empty() || path.contains('\0') {
                        issues.push(ManifestIssue {
                            field: "tool.format.exclude".to_string(),
                            message: format!("Invalid exclude path: {:?}", path),
                        });
                    }
                }
            }

            if let Some(versioning) = &tool.versioning {
                if let Err(e) =
                    validate_placeholder("tool.versioning.tag-format", &versioning.tag_format, "$version")
                {
                    issues.push(ManifestIssue {
                        field: "tool.versioning.tag-format".to_string(),
                        message: e.user_friendly_message(),
                    });
                }
                if let Some(bump) = &versioning.bump_message {
                    for placeholder in ["$current_version", "$new_version"] {
                        if let Err(e) =
                            validate_placeholder("tool.versioning.bump-message", bump, placeholder)
                        {
                            issues.push(ManifestIssue {
                                field: "tool.versioning.bump-message".to_string(),
                                message: e.user_friendly_message(),
                            });
                        }
                    }
                }
            }
        }

        issues
    }

    pub fn dependency_names(&self) -> Vec<&str> {
        self.dependencies.keys().map(String::as_str).collect()
    }

    pub fn constraint(&self, name: &str) -> Option<&str> {
        self.dependencies
            .get(name)
            .or_else(|| self.dev_dependencies.get(name))
            .map(String::as_str)
    }
}

impl Validate for ProjectManifest {
    fn validate(&self) -> Result<()> {
        match self.issues().into_iter().next() {
            None => Ok(()),
            Some(issue) => Err(PredictError::ConfigValidation {
                field: issue.field,
                message: issue.message,
            }),
        }
    }
}

fn check_dependency_table(
    table: &str,
    entries: &BTreeMap<String, String>,
    issues: &mut Vec<ManifestIssue>,
) {
    for (name, constraint) in entries {
        if name.trim().is_empty() {
            issues.push(ManifestIssue {
                field: table.to_string(),
                message: "Dependency name cannot be empty".to_string(),
            });
        }
        if let Err(e) = parse_constraint(constraint) {
            issues.push(ManifestIssue {
                field: format!("{}.{}", table, name),
                message: e,
            });
        }
    }
}

/// Parses a declared version constraint. Caret, tilde, comparator lists
/// and wildcards resolve directly; `==` exact pins normalize to `=` first.
pub fn parse_constraint(raw: &str) -> std::result::Result<VersionReq, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("Version constraint cannot be empty".to_string());
    }
    if trimmed.contains("!=") {
        return Err("Exclusion constraints are not resolvable".to_string());
    }

    let normalized = trimmed.replace("==", "=");
    VersionReq::parse(&normalized)
        .map_err(|e| format!("Unresolvable version constraint '{}': {}", raw, e))
}

/// Parses a project version, padding missing components (`1.0` -> `1.0.0`).
pub fn parse_version(raw: &str) -> std::result::Result<Version, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("Project version cannot be empty".to_string());
    }

    let components = trimmed.split('.').count();
    let padded = match components {
        1 => format!("{}.0.0", trimmed),
        2 => format!("{}.0", trimmed),
        _ => trimmed.to_string(),
    };

    Version::parse(&padded).map_err(|e| format!("Invalid project version '{}': {}", raw, e))
}
