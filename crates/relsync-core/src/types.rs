use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// How far a repository's change has progressed toward production on a ticket.
///
/// Each stage past `Develop` is recorded in its own label field. Stages only
/// advance; no reconciler ever removes a repository from a stage field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Develop,
    Master,
    Tagged,
    Production,
}

impl Stage {
    pub fn all() -> &'static [Stage] {
        &[
            Stage::Develop,
            Stage::Master,
            Stage::Tagged,
            Stage::Production,
        ]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Option<Stage> {
        Stage::all().get(self.index() + 1).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Develop => "develop",
            Stage::Master => "master",
            Stage::Tagged => "tagged",
            Stage::Production => "production",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = crate::error::RelsyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "develop" => Ok(Stage::Develop),
            "master" => Ok(Stage::Master),
            "tagged" => Ok(Stage::Tagged),
            "production" => Ok(Stage::Production),
            _ => Err(crate::error::RelsyncError::InvalidConfig(format!(
                "unknown stage '{s}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// CodeStatus
// ---------------------------------------------------------------------------

/// Value written to the code-status field once a repo reaches production.
pub const CODE_STATUS_PRODUCTION: &str = "Production";

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_advance_in_order() {
        assert_eq!(Stage::Develop.next(), Some(Stage::Master));
        assert_eq!(Stage::Master.next(), Some(Stage::Tagged));
        assert_eq!(Stage::Tagged.next(), Some(Stage::Production));
        assert_eq!(Stage::Production.next(), None);
    }

    #[test]
    fn stage_parse_and_display() {
        for stage in Stage::all() {
            let parsed: Stage = stage.as_str().parse().unwrap();
            assert_eq!(parsed, *stage);
        }
        assert!("released".parse::<Stage>().is_err());
    }
}
