//! Validation of operator supplied configuration.
//!
//! Everything here is checked before a crawl starts. A [`ConfigError`] is
//! fatal and reported to the operator, never retried.

use crate::publish::GitHubSettings;
use crate::run::OutputPaths;
use crate::schedule::WeeklySchedule;
use std::fmt;
use std::path::PathBuf;
use xrpl_peers_connection::{AddressError, NodeAddress};

/// Default branch updated when publishing the node list.
pub const DEFAULT_PUBLISH_BRANCH: &str = "master";

/// Errors in the configuration of a crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No seed node was configured.
    MissingSeed,
    /// The seed node address could not be parsed.
    InvalidSeed(AddressError),
    /// No file name for the node list was configured.
    MissingNodeListName,
    /// Service mode needs both a schedule day and time.
    MissingSchedule,
    /// The schedule day is not a day of the week.
    InvalidScheduleDay(String),
    /// The schedule time is not a valid time of day.
    InvalidScheduleTime(String),
    /// A GitHub token was configured without the named setting.
    IncompletePublish(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingSeed => write!(f, "A seed node URL must be configured"),
            ConfigError::InvalidSeed(err) => write!(f, "Invalid seed node URL: {err}"),
            ConfigError::MissingNodeListName => {
                write!(f, "A file name for the node list must be configured")
            }
            ConfigError::MissingSchedule => write!(
                f,
                "A scheduled day of the week and time must be configured to run as a service"
            ),
            ConfigError::InvalidScheduleDay(day) => {
                write!(f, "Invalid schedule day '{day}', expected a day of the week")
            }
            ConfigError::InvalidScheduleTime(time) => {
                write!(f, "Invalid schedule time '{time}', expected HH:MM or HH:MM:SS")
            }
            ConfigError::IncompletePublish(setting) => {
                write!(f, "Publishing to GitHub requires {setting} to be configured")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidSeed(err) => Some(err),
            _ => None,
        }
    }
}

/// Unvalidated settings, as collected from the command line and environment.
#[derive(Debug, Clone, Default)]
pub struct RawConfig {
    pub seed: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub node_list_name: Option<String>,
    pub schedule_day: Option<String>,
    pub schedule_time: Option<String>,
    pub github_token: Option<String>,
    pub github_owner: Option<String>,
    pub github_repo: Option<String>,
    pub github_dir: Option<String>,
    pub github_branch: Option<String>,
}

/// Validated settings of the crawler service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Seed node.
    pub seed: NodeAddress,
    /// Where the node list and error log are written.
    pub output: OutputPaths,
    /// Weekly schedule, if both day and time were configured.
    pub schedule: Option<WeeklySchedule>,
    /// Publishing target, if a GitHub token was configured.
    pub github: Option<GitHubSettings>,
}

impl ServiceConfig {
    /// Validate raw settings.
    ///
    /// # Arguments
    ///
    /// * `raw` - Settings as supplied by the operator.
    /// * `crawl_port` - Port assumed for a seed given without one.
    ///
    /// # Returns
    ///
    /// * `Ok(ServiceConfig)` - The validated configuration.
    /// * `Err(ConfigError)` - The first problem found.
    pub fn from_raw(raw: RawConfig, crawl_port: u16) -> Result<Self, ConfigError> {
        let seed = non_empty(raw.seed).ok_or(ConfigError::MissingSeed)?;
        let seed = NodeAddress::from_url(&seed, crawl_port).map_err(ConfigError::InvalidSeed)?;

        let node_list_name =
            non_empty(raw.node_list_name).ok_or(ConfigError::MissingNodeListName)?;
        let output = OutputPaths::new(raw.output_dir.unwrap_or_default(), node_list_name);

        let schedule = match (non_empty(raw.schedule_day), non_empty(raw.schedule_time)) {
            (Some(day), Some(time)) => Some(WeeklySchedule::parse(&day, &time)?),
            (None, None) => None,
            _ => return Err(ConfigError::MissingSchedule),
        };

        let github = match non_empty(raw.github_token) {
            Some(token) => Some(GitHubSettings {
                token,
                owner: non_empty(raw.github_owner)
                    .ok_or(ConfigError::IncompletePublish("a repository owner"))?,
                repository: non_empty(raw.github_repo)
                    .ok_or(ConfigError::IncompletePublish("a repository name"))?,
                directory: raw.github_dir.unwrap_or_default(),
                branch: non_empty(raw.github_branch)
                    .unwrap_or_else(|| DEFAULT_PUBLISH_BRANCH.to_string()),
            }),
            None => None,
        };

        Ok(ServiceConfig {
            seed,
            output,
            schedule,
            github,
        })
    }

    /// The schedule, required to run as a service.
    pub fn require_schedule(&self) -> Result<&WeeklySchedule, ConfigError> {
        self.schedule.as_ref().ok_or(ConfigError::MissingSchedule)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
