//! Configuration loading, validation, and management for mathtier.
//!
//! Loads configuration from `~/.mathtier/config.toml` with environment
//! variable overrides. Validates all settings at startup.
//!
//! The `[practice]` section travels with every session state, so a session
//! keeps the tuning it started with even if the file changes mid-session.

use mathtier_core::Operation;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.mathtier/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where learner data lives (file learner store)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,

    /// Session store settings
    #[serde(default)]
    pub session: SessionConfig,

    /// Orchestrator and agent tuning
    #[serde(default)]
    pub practice: PracticeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Seconds of inactivity before a session is evicted
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_ttl_secs() -> u64 {
    30 * 60
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

/// Per-session tuning for the orchestrator and its agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeConfig {
    /// Capacity of the recent-items ring buffer
    #[serde(default = "default_recent_items")]
    pub recent_items: usize,

    #[serde(default)]
    pub placement: PlacementConfig,

    #[serde(default)]
    pub coach: CoachConfig,

    #[serde(default)]
    pub echo: EchoConfig,

    #[serde(default)]
    pub content: ContentConfig,

    #[serde(default)]
    pub hints: HintsConfig,
}

fn default_recent_items() -> usize {
    10
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            recent_items: default_recent_items(),
            placement: PlacementConfig::default(),
            coach: CoachConfig::default(),
            echo: EchoConfig::default(),
            content: ContentConfig::default(),
            hints: HintsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementConfig {
    /// Number of recent answers kept in the rolling window
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Tier movement for a fast correct answer at zero confidence
    #[serde(default = "default_base_step")]
    pub base_step: f64,

    /// Multiplier applied to the step on a miss
    #[serde(default = "default_miss_weight")]
    pub miss_weight: f64,

    /// Answers at or under this latency count as fast
    #[serde(default = "default_fast_latency_ms")]
    pub fast_latency_ms: u64,

    /// Pseudo-count controlling how fast confidence grows with samples
    #[serde(default = "default_prior_weight")]
    pub prior_weight: f64,

    #[serde(default = "default_accuracy_variance_weight")]
    pub accuracy_variance_weight: f64,

    #[serde(default = "default_latency_variance_weight")]
    pub latency_variance_weight: f64,
}

fn default_window_size() -> usize {
    10
}
fn default_base_step() -> f64 {
    1.0
}
fn default_miss_weight() -> f64 {
    2.0
}
fn default_fast_latency_ms() -> u64 {
    5_000
}
fn default_prior_weight() -> f64 {
    2.0
}
fn default_accuracy_variance_weight() -> f64 {
    0.3
}
fn default_latency_variance_weight() -> f64 {
    0.2
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            base_step: default_base_step(),
            miss_weight: default_miss_weight(),
            fast_latency_ms: default_fast_latency_ms(),
            prior_weight: default_prior_weight(),
            accuracy_variance_weight: default_accuracy_variance_weight(),
            latency_variance_weight: default_latency_variance_weight(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachConfig {
    #[serde(default = "default_miss_penalty")]
    pub miss_penalty: f64,

    #[serde(default = "default_slow_penalty")]
    pub slow_penalty: f64,

    #[serde(default = "default_correct_relief")]
    pub correct_relief: f64,

    /// Extra relief per answer in a fast-correct streak (streak capped at 5)
    #[serde(default = "default_streak_relief")]
    pub streak_relief: f64,

    #[serde(default = "default_slow_latency_ms")]
    pub slow_latency_ms: u64,

    #[serde(default = "default_fast_latency_ms")]
    pub fast_latency_ms: u64,

    /// Tilt at or above which the coach enters recovery
    #[serde(default = "default_enter_recovery")]
    pub enter_recovery: f64,

    /// Tilt below which the coach leaves recovery
    #[serde(default = "default_exit_recovery")]
    pub exit_recovery: f64,

    /// Tiers subtracted from the placement target while recovering
    #[serde(default = "default_recovery_tier_drop")]
    pub recovery_tier_drop: u8,
}

fn default_miss_penalty() -> f64 {
    0.15
}
fn default_slow_penalty() -> f64 {
    0.05
}
fn default_correct_relief() -> f64 {
    0.05
}
fn default_streak_relief() -> f64 {
    0.02
}
fn default_slow_latency_ms() -> u64 {
    15_000
}
fn default_enter_recovery() -> f64 {
    0.7
}
fn default_exit_recovery() -> f64 {
    0.4
}
fn default_recovery_tier_drop() -> u8 {
    5
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            miss_penalty: default_miss_penalty(),
            slow_penalty: default_slow_penalty(),
            correct_relief: default_correct_relief(),
            streak_relief: default_streak_relief(),
            slow_latency_ms: default_slow_latency_ms(),
            fast_latency_ms: default_fast_latency_ms(),
            enter_recovery: default_enter_recovery(),
            exit_recovery: default_exit_recovery(),
            recovery_tier_drop: default_recovery_tier_drop(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EchoConfig {
    /// Questions until a first miss comes back
    #[serde(default = "default_base_delay")]
    pub base_delay: u32,

    /// Ceiling for the backoff delay
    #[serde(default = "default_max_delay")]
    pub max_delay: u32,

    /// Consecutive correct re-answers needed to retire a fact
    #[serde(default = "default_resolve_threshold")]
    pub resolve_threshold: u32,

    /// Questions until a partially-resolved fact is shown again
    #[serde(default = "default_rehearsal_delay")]
    pub rehearsal_delay: u32,

    /// Active queue capacity
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_base_delay() -> u32 {
    3
}
fn default_max_delay() -> u32 {
    24
}
fn default_resolve_threshold() -> u32 {
    2
}
fn default_rehearsal_delay() -> u32 {
    1
}
fn default_max_entries() -> usize {
    25
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            base_delay: default_base_delay(),
            max_delay: default_max_delay(),
            resolve_threshold: default_resolve_threshold(),
            rehearsal_delay: default_rehearsal_delay(),
            max_entries: default_max_entries(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Probability that a fresh item is worded as a word problem
    #[serde(default = "default_word_problem_rate")]
    pub word_problem_rate: f64,
}

fn default_word_problem_rate() -> f64 {
    0.2
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            word_problem_rate: default_word_problem_rate(),
        }
    }
}

/// The hint ladder: one rung per attempt, most general first.
///
/// Templates may use `{a}`, `{b}`, `{op}`, `{answer}`, and
/// `{decomposition}` placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HintsConfig {
    /// A wrong answer within this distance of the right one counts as close
    #[serde(default = "default_near_miss_tolerance")]
    pub near_miss_tolerance: i64,

    #[serde(default = "default_ladder")]
    pub ladder: Vec<HintRung>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HintRung {
    /// Whether this rung gives the answer away
    #[serde(default)]
    pub reveals_answer: bool,

    pub templates: OperationTemplates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationTemplates {
    pub addition: String,
    pub subtraction: String,
    pub multiplication: String,
    pub division: String,
}

impl OperationTemplates {
    pub fn get(&self, operation: Operation) -> &str {
        match operation {
            Operation::Addition => &self.addition,
            Operation::Subtraction => &self.subtraction,
            Operation::Multiplication => &self.multiplication,
            Operation::Division => &self.division,
        }
    }

    fn uniform(template: &str) -> Self {
        Self {
            addition: template.into(),
            subtraction: template.into(),
            multiplication: template.into(),
            division: template.into(),
        }
    }
}

fn default_near_miss_tolerance() -> i64 {
    2
}

fn default_ladder() -> Vec<HintRung> {
    vec![
        HintRung {
            reveals_answer: false,
            templates: OperationTemplates {
                addition: "Addition puts amounts together. What do {a} and {b} make combined?"
                    .into(),
                subtraction: "Subtraction asks how much is left. Start at {a} and take {b} away."
                    .into(),
                multiplication: "Multiplication is repeated addition: think of {a} groups of {b}."
                    .into(),
                division: "Division asks how many times {b} fits into {a}.".into(),
            },
        },
        HintRung {
            reveals_answer: false,
            templates: OperationTemplates {
                addition: "Split {b} into tens and ones, then add each part to {a}.".into(),
                subtraction: "Count up from {b} to {a}. The distance you travel is the answer."
                    .into(),
                multiplication: "Split {b} into tens and ones, multiply each part by {a}, then add."
                    .into(),
                division: "Turn it around: {b} × ? = {a}.".into(),
            },
        },
        HintRung {
            reveals_answer: false,
            templates: OperationTemplates::uniform("Break it down: {decomposition}"),
        },
        HintRung {
            reveals_answer: true,
            templates: OperationTemplates::uniform(
                "{a} {op} {b} = {answer}. Try the next one the same way.",
            ),
        },
    ]
}

impl Default for HintsConfig {
    fn default() -> Self {
        Self {
            near_miss_tolerance: default_near_miss_tolerance(),
            ladder: default_ladder(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.mathtier/config.toml).
    ///
    /// Environment overrides:
    /// - `MATHTIER_DATA_DIR`
    /// - `MATHTIER_SESSION_TTL_SECS`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if let Ok(dir) = std::env::var("MATHTIER_DATA_DIR") {
            config.data_dir = Some(dir);
        }

        if let Ok(ttl) = std::env::var("MATHTIER_SESSION_TTL_SECS") {
            config.session.ttl_secs = ttl.parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "MATHTIER_SESSION_TTL_SECS must be an integer, got '{ttl}'"
                ))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".mathtier")
    }

    /// Directory for learner data, honoring `data_dir` when set.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| Self::config_dir().join("data"))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.practice;

        if p.recent_items == 0 {
            return Err(ConfigError::ValidationError("practice.recent_items must be > 0".into()));
        }

        if p.placement.window_size == 0 {
            return Err(ConfigError::ValidationError(
                "practice.placement.window_size must be > 0".into(),
            ));
        }

        if p.placement.base_step <= 0.0 || p.placement.prior_weight <= 0.0 {
            return Err(ConfigError::ValidationError(
                "practice.placement.base_step and prior_weight must be > 0".into(),
            ));
        }

        let coach = &p.coach;
        if !(0.0 < coach.exit_recovery
            && coach.exit_recovery < coach.enter_recovery
            && coach.enter_recovery <= 1.0)
        {
            return Err(ConfigError::ValidationError(
                "practice.coach thresholds must satisfy 0 < exit_recovery < enter_recovery <= 1"
                    .into(),
            ));
        }

        let echo = &p.echo;
        if echo.base_delay == 0 || echo.max_delay < echo.base_delay {
            return Err(ConfigError::ValidationError(
                "practice.echo requires base_delay >= 1 and max_delay >= base_delay".into(),
            ));
        }
        if echo.resolve_threshold == 0 || echo.max_entries == 0 {
            return Err(ConfigError::ValidationError(
                "practice.echo.resolve_threshold and max_entries must be > 0".into(),
            ));
        }

        if !(0.0..=1.0).contains(&p.content.word_problem_rate) {
            return Err(ConfigError::ValidationError(
                "practice.content.word_problem_rate must be between 0.0 and 1.0".into(),
            ));
        }

        if p.hints.ladder.is_empty() {
            return Err(ConfigError::ValidationError(
                "practice.hints.ladder must have at least one rung".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            session: SessionConfig::default(),
            practice: PracticeConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for mathtier_core::Error {
    fn from(err: ConfigError) -> Self {
        mathtier_core::Error::Config {
            message: err.to_string(),
        }
    }
}
