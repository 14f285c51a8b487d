use crate::error::{RelsyncError, Result};
use crate::types::Stage;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// File name searched for when no config path is given explicitly.
pub const CONFIG_FILE_NAME: &str = "relsync.yaml";

const BUILTIN_CONFIG: &str = include_str!("../relsync.default.yaml");

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// StoreConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub base_url: String,
    #[serde(default = "default_user")]
    pub user: String,
}

fn default_user() -> String {
    "jira-bot@run.ai".to_string()
}

// ---------------------------------------------------------------------------
// FieldMap
// ---------------------------------------------------------------------------

/// A multi-valued label field addressed by id in reads/updates and by clause
/// name inside JQL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelField {
    pub id: String,
    pub clause: String,
}

/// A label field that is only ever filtered on, never read back or updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseField {
    pub clause: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMap {
    pub develop_repos: ClauseField,
    pub master_repos: LabelField,
    pub tagged_repos: LabelField,
    pub prod_repos: LabelField,
    pub code_status: String,
    pub last_prod_update: String,
}

impl FieldMap {
    /// JQL clause name of the label field recording `stage`.
    pub fn clause(&self, stage: Stage) -> &str {
        match stage {
            Stage::Develop => &self.develop_repos.clause,
            Stage::Master => &self.master_repos.clause,
            Stage::Tagged => &self.tagged_repos.clause,
            Stage::Production => &self.prod_repos.clause,
        }
    }

    /// Field id of the label field recording `stage`, if it is addressable.
    pub fn id(&self, stage: Stage) -> Option<&str> {
        match stage {
            Stage::Develop => None,
            Stage::Master => Some(&self.master_repos.id),
            Stage::Tagged => Some(&self.tagged_repos.id),
            Stage::Production => Some(&self.prod_repos.id),
        }
    }

    /// `(clause, id)` pairs for every addressable label field.
    pub fn aliases(&self) -> Vec<(&str, &str)> {
        Stage::all()
            .iter()
            .filter_map(|s| self.id(*s).map(|id| (self.clause(*s), id)))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// StandaloneRepo / AggregateGroup
// ---------------------------------------------------------------------------

/// A repository released straight to production, with its own version field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandaloneRepo {
    pub repo: String,
    pub version_field: String,
}

/// A deployable bundle (cluster, backend) composed of member repositories.
///
/// Tagging `root` releases the bundle; members tagged since the previous
/// bundle release are promoted to production.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateGroup {
    pub name: String,
    pub root: String,
    pub version_field: String,
    #[serde(default)]
    pub members: Vec<String>,
}

impl AggregateGroup {
    pub fn contains(&self, repo: &str) -> bool {
        self.members.iter().any(|m| m == repo)
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    pub store: StoreConfig,
    pub fields: FieldMap,
    #[serde(default)]
    pub standalone: Vec<StandaloneRepo>,
    #[serde(default)]
    pub aggregates: Vec<AggregateGroup>,
}

fn default_version() -> u32 {
    1
}

impl Config {
    /// The configuration embedded in the binary.
    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_CONFIG)
    }

    pub fn parse(data: &str) -> Result<Self> {
        let cfg: Config = serde_yaml::from_str(data)?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RelsyncError::ConfigNotFound(path.to_path_buf()));
        }
        let data = std::fs::read_to_string(path)?;
        Self::parse(&data)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Override store settings taken from the environment or the command line.
    pub fn with_store_overrides(mut self, base_url: Option<String>, user: Option<String>) -> Self {
        if let Some(url) = base_url {
            self.store.base_url = url;
        }
        if let Some(user) = user {
            self.store.user = user;
        }
        self
    }

    pub fn standalone_for(&self, repo: &str) -> Option<&StandaloneRepo> {
        self.standalone.iter().find(|s| s.repo == repo)
    }

    /// Aggregates released by tagging `repo`, in configuration order.
    pub fn aggregates_rooted_at<'a>(
        &'a self,
        repo: &'a str,
    ) -> impl Iterator<Item = &'a AggregateGroup> + 'a {
        self.aggregates.iter().filter(move |g| g.root == repo)
    }

    pub fn aggregate(&self, name: &str) -> Result<&AggregateGroup> {
        self.aggregates
            .iter()
            .find(|g| g.name == name)
            .ok_or_else(|| RelsyncError::UnknownAggregate(name.to_string()))
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Report suspicious configuration data. Never rewrites anything.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let warn = |w: &mut Vec<ConfigWarning>, level: WarnLevel, message: String| {
            w.push(ConfigWarning { level, message });
        };

        if self.store.base_url.trim().is_empty() {
            warn(&mut warnings, WarnLevel::Error, "store.base_url is empty".to_string());
        }

        for (name, value) in [
            ("fields.code_status", &self.fields.code_status),
            ("fields.last_prod_update", &self.fields.last_prod_update),
            ("fields.master_repos.id", &self.fields.master_repos.id),
            ("fields.tagged_repos.id", &self.fields.tagged_repos.id),
            ("fields.prod_repos.id", &self.fields.prod_repos.id),
        ] {
            if value.trim().is_empty() {
                warn(&mut warnings, WarnLevel::Error, format!("{name} is empty"));
            }
        }

        // 1. Every identifier should look like owner/name
        let mut seen_standalone = HashSet::new();
        for s in &self.standalone {
            check_identifier(&mut warnings, &s.repo, "standalone");
            if !seen_standalone.insert(s.repo.as_str()) {
                warn(
                    &mut warnings,
                    WarnLevel::Warning,
                    format!("standalone repo '{}' is listed more than once", s.repo),
                );
            }
            if s.version_field.trim().is_empty() {
                warn(
                    &mut warnings,
                    WarnLevel::Error,
                    format!("standalone repo '{}' has an empty version_field", s.repo),
                );
            }
        }

        let mut seen_groups = HashSet::new();
        let mut membership: HashMap<&str, Vec<&str>> = HashMap::new();
        for group in &self.aggregates {
            if !seen_groups.insert(group.name.as_str()) {
                warn(
                    &mut warnings,
                    WarnLevel::Error,
                    format!("aggregate '{}' is defined more than once", group.name),
                );
            }
            if group.version_field.trim().is_empty() {
                warn(
                    &mut warnings,
                    WarnLevel::Error,
                    format!("aggregate '{}' has an empty version_field", group.name),
                );
            }
            if group.members.is_empty() {
                warn(
                    &mut warnings,
                    WarnLevel::Warning,
                    format!("aggregate '{}' has no members", group.name),
                );
            } else if !group.contains(&group.root) {
                warn(
                    &mut warnings,
                    WarnLevel::Warning,
                    format!(
                        "aggregate '{}' root '{}' is not one of its members",
                        group.name, group.root
                    ),
                );
            }

            let mut seen_members = HashSet::new();
            for member in &group.members {
                check_identifier(&mut warnings, member, &format!("aggregate '{}'", group.name));
                if !seen_members.insert(member.as_str()) {
                    warn(
                        &mut warnings,
                        WarnLevel::Warning,
                        format!("aggregate '{}' lists '{}' more than once", group.name, member),
                    );
                }
                membership
                    .entry(member.as_str())
                    .or_default()
                    .push(group.name.as_str());
            }
        }

        // 2. Standalone repos bypass aggregate promotion entirely
        for s in &self.standalone {
            if let Some(groups) = membership.get(s.repo.as_str()) {
                warn(
                    &mut warnings,
                    WarnLevel::Warning,
                    format!(
                        "standalone repo '{}' is also a member of aggregate(s) {}",
                        s.repo,
                        groups.join(", ")
                    ),
                );
            }
        }

        warnings
    }
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^/\s]+/[^/\s]+$").expect("valid identifier regex"))
}

fn check_identifier(warnings: &mut Vec<ConfigWarning>, repo: &str, owner: &str) {
    if identifier_pattern().is_match(repo) {
        return;
    }
    let message = if repo.matches('/').count() > 1 {
        format!(
            "{owner} repo '{repo}' looks like two identifiers joined without a separator"
        )
    } else {
        format!("{owner} repo '{repo}' is not of the form owner/name")
    };
    warnings.push(ConfigWarning {
        level: WarnLevel::Warning,
        message,
    });
}

/// Walk upward from `start` looking for [`CONFIG_FILE_NAME`].
pub fn find_config(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        match dir.parent() {
            Some(p) => dir = p.to_path_buf(),
            None => return None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
