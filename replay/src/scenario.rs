//! Scenario files
//!
//! A scenario is a TOML list of timed steps run against a fresh ledger:
//!
//! ```toml
//! [[step]]
//! at_ms = 0
//! action = "tag"
//! subject = "alice"
//! opponent = "bob"
//! tag_type = "player"
//!
//! [[step]]
//! at_ms = 4000
//! action = "report"
//! subject = "alice"
//! ```
//!
//! Subjects and opponents are referred to by name; the replay assigns each
//! name a fresh id on first use.

use std::fs;
use std::path::{Path, PathBuf};

use engage_core::TagType;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scenario {
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Step {
    /// Offset from the start of the replay
    pub at_ms: u64,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Tag `subject`. Without `duration_ms` the configured tag duration applies.
    Tag {
        subject: String,
        opponent: Option<String>,
        #[serde(default)]
        tag_type: TagType,
        duration_ms: Option<u64>,
    },
    Remove {
        subject: String,
        opponent: String,
    },
    Untag {
        subject: String,
    },
    /// Print the subject's snapshot as one JSON line
    Report {
        subject: String,
    },
    Evict,
}

impl Scenario {
    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let contents = fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents).map_err(|source| ScenarioError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Steps in time order. Steps sharing an offset keep file order.
    pub fn ordered_steps(&self) -> Vec<&Step> {
        let mut steps: Vec<&Step> = self.steps.iter().collect();
        steps.sort_by_key(|step| step.at_ms);
        steps
    }
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse error in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_actions() {
        let toml = r#"
[[step]]
at_ms = 0
action = "tag"
subject = "alice"
opponent = "bob"
tag_type = "player"
duration_ms = 5000

[[step]]
at_ms = 100
action = "tag"
subject = "alice"

[[step]]
at_ms = 200
action = "remove"
subject = "alice"
opponent = "bob"

[[step]]
at_ms = 300
action = "report"
subject = "alice"

[[step]]
at_ms = 400
action = "untag"
subject = "alice"

[[step]]
at_ms = 500
action = "evict"
"#;
        let scenario = Scenario::parse(toml).unwrap();
        assert_eq!(scenario.steps.len(), 6);
        assert_eq!(
            scenario.steps[0].action,
            Action::Tag {
                subject: "alice".to_string(),
                opponent: Some("bob".to_string()),
                tag_type: TagType::Player,
                duration_ms: Some(5000),
            }
        );
        assert_eq!(
            scenario.steps[1].action,
            Action::Tag {
                subject: "alice".to_string(),
                opponent: None,
                tag_type: TagType::Unknown,
                duration_ms: None,
            }
        );
        assert_eq!(scenario.steps[5].action, Action::Evict);
    }

    #[test]
    fn test_unknown_action_rejected() {
        let toml = r#"
[[step]]
at_ms = 0
action = "explode"
"#;
        assert!(Scenario::parse(toml).is_err());
    }

    #[test]
    fn test_empty_scenario() {
        let scenario = Scenario::parse("").unwrap();
        assert!(scenario.steps.is_empty());
    }

    #[test]
    fn test_ordered_steps_is_stable() {
        let toml = r#"
[[step]]
at_ms = 50
action = "evict"

[[step]]
at_ms = 10
action = "report"
subject = "first"

[[step]]
at_ms = 10
action = "report"
subject = "second"
"#;
        let scenario = Scenario::parse(toml).unwrap();
        let order: Vec<_> = scenario.ordered_steps().iter().map(|s| s.action.clone()).collect();
        assert_eq!(
            order,
            vec![
                Action::Report { subject: "first".to_string() },
                Action::Report { subject: "second".to_string() },
                Action::Evict,
            ]
        );
    }
}
