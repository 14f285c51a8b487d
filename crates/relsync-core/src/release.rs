use crate::config::Config;
use crate::error::{RelsyncError, Result};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

fn tag_ref_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^refs/tags/(\S+)$").expect("valid tag ref regex"))
}

/// Extract the release version from a git tag reference (`refs/tags/<version>`).
pub fn parse_tag_ref(git_ref: &str) -> Result<String> {
    tag_ref_pattern()
        .captures(git_ref.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| RelsyncError::InvalidTagRef(git_ref.to_string()))
}

// ---------------------------------------------------------------------------
// ReleaseMode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReleaseMode {
    /// Released straight to production; no tagging or aggregate pass.
    Standalone { version_field: String },
    /// Tagged, then releases every aggregate it is the root of.
    AggregateRoot { aggregates: Vec<String> },
    /// Tagged only; production happens when an aggregate ships it.
    MicroService,
}

impl ReleaseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseMode::Standalone { .. } => "standalone",
            ReleaseMode::AggregateRoot { .. } => "aggregate-root",
            ReleaseMode::MicroService => "micro-service",
        }
    }
}

// ---------------------------------------------------------------------------
// Release
// ---------------------------------------------------------------------------

/// One tag event: which repository, which version, and how it ships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Release {
    pub repo: String,
    pub version: String,
    pub mode: ReleaseMode,
}

impl Release {
    pub fn classify(config: &Config, repo: impl Into<String>, version: impl Into<String>) -> Self {
        let repo = repo.into();
        let mode = if let Some(s) = config.standalone_for(&repo) {
            ReleaseMode::Standalone {
                version_field: s.version_field.clone(),
            }
        } else {
            let aggregates: Vec<String> = config
                .aggregates_rooted_at(&repo)
                .map(|g| g.name.clone())
                .collect();
            if aggregates.is_empty() {
                ReleaseMode::MicroService
            } else {
                ReleaseMode::AggregateRoot { aggregates }
            }
        };
        Self {
            repo,
            version: version.into(),
            mode,
        }
    }

    /// Classify a tag push given the raw git reference.
    pub fn from_tag_ref(config: &Config, repo: impl Into<String>, git_ref: &str) -> Result<Self> {
        let version = parse_tag_ref(git_ref)?;
        Ok(Self::classify(config, repo, version))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
