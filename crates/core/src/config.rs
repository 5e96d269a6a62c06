// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: environment-overridable defaults
//!
//! Every option has a sensible default and an `RELAY_*` override. The
//! agent role allow-list lives here and nowhere else; components receive
//! it through this snapshot.

use crate::role::Role;
use indexmap::IndexMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine home directory")]
    NoHome,
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("role allow-list must include `admin`")]
    RolesMissingAdmin,
    #[error("role allow-list must not be empty")]
    RolesEmpty,
}

/// Scope of the prompt-readiness gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptGating {
    /// Gate every non-admin pane.
    #[default]
    All,
    /// Gate only the `oc` pane.
    Oc,
    /// Gate nothing.
    None,
}

impl PromptGating {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Some(PromptGating::All),
            "oc" => Some(PromptGating::Oc),
            "none" => Some(PromptGating::None),
            _ => None,
        }
    }
}

/// Optional pane-tail debug capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneTailConfig {
    pub enabled: bool,
    pub interval: Duration,
    pub lines: u32,
    pub rotations: u32,
    pub dir: Option<PathBuf>,
}

impl Default for PaneTailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: Duration::from_secs(30),
            lines: 100,
            rotations: 5,
            dir: None,
        }
    }
}

/// LLM summarizer endpoint for the autogen fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub max_retries: u32,
}

/// Full daemon configuration snapshot. Immutable once published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    // filesystem roots
    pub share_dir: PathBuf,
    pub inbox_dir: PathBuf,
    pub log_dir: PathBuf,
    pub state_dir: PathBuf,
    pub attacks_dir: PathBuf,

    // external identifiers
    pub tmux_session: String,
    pub pane_map_path: PathBuf,

    // roles
    pub roles: Vec<Role>,
    /// role → worktree directory, for session-log discovery and the idle
    /// detector. `RELAY_WORKTREES` format: `role=path,role=path`.
    pub worktrees: IndexMap<Role, PathBuf>,
    /// Roles whose session logs live under the claude projects layout.
    pub claude_style_roles: Vec<Role>,
    /// Roles whose session logs live under the codex sessions layout.
    pub codex_style_roles: Vec<Role>,

    // injector
    pub prompt_gating: PromptGating,
    pub vim_mode: bool,
    pub queue_max_age: Duration,

    // nagger policy (consumed by the enqueue-side tooling; carried here so
    // one snapshot validates the whole option surface)
    pub stuck_threshold: Duration,
    pub nag_interval: Duration,
    pub max_nag_duration: Duration,

    // checkpoint triggers and pacing
    pub relay_idle_threshold: Duration,
    pub session_log_stable_threshold: Duration,
    pub ack_timeout: Duration,
    pub min_checkpoint_interval: Duration,
    pub cooldown_after_checkpoint: Duration,

    // admin timer
    pub checkpoint_interval: Duration,
    pub health_check_interval: Duration,
    /// Allow-listed slash command the cycle ticker injects.
    pub checkpoint_cycle_cmd: String,

    // recycler
    pub admin_recycle_cycles: u32,
    pub admin_max_uptime: Duration,
    pub admin_relaunch_cmd: Option<String>,
    pub admin_alert_hook: Option<String>,
    pub deadman_threshold: Option<Duration>,

    // idle detector
    pub idle_backstop_interval: Duration,

    // autogen sizing
    pub autogen_input_tokens: usize,
    pub autogen_bytes_per_token: usize,

    // optional surfaces
    pub pane_tail: PaneTailConfig,
    pub llm: Option<LlmConfig>,
}

/// Default role allow-list when `RELAY_ROLES` is unset.
pub const DEFAULT_ROLES: [&str; 5] = ["oc", "cc", "cx", "vog", "admin"];

impl RelayConfig {
    /// Load from environment-overridable defaults and validate.
    pub fn from_env() -> Result<Self, ConfigError> {
        let home = std::env::var("HOME")
            .map(PathBuf::from)
            .map_err(|_| ConfigError::NoHome)?;
        let share_dir = env_path("RELAY_SHARE_DIR").unwrap_or_else(|| home.join("llm-share"));
        let state_dir = env_path("RELAY_STATE_DIR").unwrap_or_else(|| share_dir.join("state"));

        let config = Self {
            inbox_dir: env_path("RELAY_INBOX_DIR").unwrap_or_else(|| share_dir.join("inbox")),
            log_dir: env_path("RELAY_LOG_DIR").unwrap_or_else(|| share_dir.join("log")),
            attacks_dir: env_path("RELAY_ATTACKS_DIR")
                .unwrap_or_else(|| share_dir.join("attacks")),
            tmux_session: std::env::var("RELAY_TMUX_SESSION").unwrap_or_else(|_| "pod".into()),
            pane_map_path: env_path("RELAY_PANE_MAP_PATH")
                .unwrap_or_else(|| state_dir.join("panes.json")),
            roles: env_roles()?,
            worktrees: env_worktrees()?,
            claude_style_roles: env_role_list("RELAY_CLAUDE_STYLE_ROLES", &["cc"]),
            codex_style_roles: env_role_list("RELAY_CODEX_STYLE_ROLES", &["cx"]),
            prompt_gating: env_gating()?,
            vim_mode: env_bool("RELAY_VIM_MODE")?.unwrap_or(false),
            queue_max_age: env_secs("RELAY_QUEUE_MAX_AGE_SECS")?
                .unwrap_or(Duration::from_secs(5 * 60)),
            stuck_threshold: env_secs("RELAY_STUCK_THRESHOLD_SECS")?
                .unwrap_or(Duration::from_secs(5 * 60)),
            nag_interval: env_secs("RELAY_NAG_INTERVAL_SECS")?
                .unwrap_or(Duration::from_secs(5 * 60)),
            max_nag_duration: env_secs("RELAY_MAX_NAG_DURATION_SECS")?
                .unwrap_or(Duration::from_secs(30 * 60)),
            relay_idle_threshold: env_secs("RELAY_IDLE_THRESHOLD_SECS")?
                .unwrap_or(Duration::from_secs(120)),
            session_log_stable_threshold: env_secs("RELAY_LOG_STABLE_SECS")?
                .unwrap_or(Duration::from_secs(60)),
            ack_timeout: env_secs("RELAY_ACK_TIMEOUT_SECS")?.unwrap_or(Duration::from_secs(60)),
            min_checkpoint_interval: env_secs("RELAY_MIN_CHECKPOINT_INTERVAL_SECS")?
                .unwrap_or(Duration::from_secs(5 * 60)),
            cooldown_after_checkpoint: env_secs("RELAY_COOLDOWN_SECS")?
                .unwrap_or(Duration::from_secs(2 * 60)),
            checkpoint_interval: env_secs("RELAY_CHECKPOINT_INTERVAL_SECS")?
                .unwrap_or(Duration::from_secs(10 * 60)),
            health_check_interval: env_secs("RELAY_HEALTH_CHECK_INTERVAL_SECS")?
                .unwrap_or(Duration::from_secs(5 * 60)),
            checkpoint_cycle_cmd: env_opt("RELAY_CHECKPOINT_CYCLE_CMD")
                .unwrap_or_else(|| "/ack".into()),
            admin_recycle_cycles: env_u32("RELAY_ADMIN_RECYCLE_CYCLES")?.unwrap_or(6),
            admin_max_uptime: env_secs("RELAY_ADMIN_MAX_UPTIME_SECS")?
                .unwrap_or(Duration::from_secs(2 * 60 * 60)),
            admin_relaunch_cmd: env_opt("RELAY_ADMIN_RELAUNCH_CMD"),
            admin_alert_hook: env_opt("RELAY_ADMIN_ALERT_HOOK"),
            deadman_threshold: env_secs("RELAY_DEADMAN_THRESHOLD_SECS")?,
            idle_backstop_interval: env_secs("RELAY_IDLE_BACKSTOP_SECS")?
                .unwrap_or(Duration::from_secs(2 * 60 * 60)),
            autogen_input_tokens: env_u32("RELAY_AUTOGEN_INPUT_TOKENS")?.unwrap_or(8000) as usize,
            autogen_bytes_per_token: env_u32("RELAY_AUTOGEN_BYTES_PER_TOKEN")?.unwrap_or(4)
                as usize,
            pane_tail: PaneTailConfig {
                enabled: env_bool("RELAY_PANE_TAIL_ENABLED")?.unwrap_or(false),
                interval: env_secs("RELAY_PANE_TAIL_INTERVAL_SECS")?
                    .unwrap_or(Duration::from_secs(30)),
                lines: env_u32("RELAY_PANE_TAIL_LINES")?.unwrap_or(100),
                rotations: env_u32("RELAY_PANE_TAIL_ROTATIONS")?.unwrap_or(5),
                dir: env_path("RELAY_PANE_TAIL_DIR"),
            },
            llm: env_llm()?,
            share_dir,
            state_dir,
        };

        config.validate()?;
        Ok(config)
    }

    /// Cross-field validation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.roles.is_empty() {
            return Err(ConfigError::RolesEmpty);
        }
        if !self.roles.iter().any(|r| r.is_admin()) {
            return Err(ConfigError::RolesMissingAdmin);
        }
        if self.admin_recycle_cycles == 0 {
            return Err(ConfigError::InvalidValue {
                key: "RELAY_ADMIN_RECYCLE_CYCLES",
                value: "0".into(),
            });
        }
        if self.autogen_input_tokens == 0 || self.autogen_bytes_per_token == 0 {
            return Err(ConfigError::InvalidValue {
                key: "RELAY_AUTOGEN_INPUT_TOKENS",
                value: "0".into(),
            });
        }
        Ok(())
    }

    pub fn is_known_role(&self, role: &Role) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Test configuration rooted in a temp directory.
    #[cfg(any(test, feature = "test-support"))]
    pub fn for_test(root: &std::path::Path) -> Self {
        Self {
            share_dir: root.to_path_buf(),
            inbox_dir: root.join("inbox"),
            log_dir: root.join("log"),
            state_dir: root.join("state"),
            attacks_dir: root.join("attacks"),
            tmux_session: "pod".into(),
            pane_map_path: root.join("state/panes.json"),
            roles: DEFAULT_ROLES.iter().map(|r| Role::new(*r)).collect(),
            worktrees: IndexMap::new(),
            claude_style_roles: vec![Role::new("cc")],
            codex_style_roles: vec![Role::new("cx")],
            prompt_gating: PromptGating::All,
            vim_mode: false,
            queue_max_age: Duration::from_secs(5 * 60),
            stuck_threshold: Duration::from_secs(5 * 60),
            nag_interval: Duration::from_secs(5 * 60),
            max_nag_duration: Duration::from_secs(30 * 60),
            relay_idle_threshold: Duration::from_secs(120),
            session_log_stable_threshold: Duration::from_secs(60),
            ack_timeout: Duration::from_secs(60),
            min_checkpoint_interval: Duration::from_secs(5 * 60),
            cooldown_after_checkpoint: Duration::from_secs(2 * 60),
            checkpoint_interval: Duration::from_secs(10 * 60),
            health_check_interval: Duration::from_secs(5 * 60),
            checkpoint_cycle_cmd: "/ack".into(),
            admin_recycle_cycles: 6,
            admin_max_uptime: Duration::from_secs(2 * 60 * 60),
            admin_relaunch_cmd: None,
            admin_alert_hook: None,
            deadman_threshold: None,
            idle_backstop_interval: Duration::from_secs(2 * 60 * 60),
            autogen_input_tokens: 8000,
            autogen_bytes_per_token: 4,
            pane_tail: PaneTailConfig::default(),
            llm: None,
        }
    }
}

fn env_opt(key: &'static str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

fn env_path(key: &'static str) -> Option<PathBuf> {
    env_opt(key).map(PathBuf::from)
}

fn env_secs(key: &'static str) -> Result<Option<Duration>, ConfigError> {
    match env_opt(key) {
        None => Ok(None),
        Some(value) => value
            .parse::<u64>()
            .map(|s| Some(Duration::from_secs(s)))
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}

fn env_u32(key: &'static str) -> Result<Option<u32>, ConfigError> {
    match env_opt(key) {
        None => Ok(None),
        Some(value) => value
            .parse::<u32>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}

fn env_bool(key: &'static str) -> Result<Option<bool>, ConfigError> {
    match env_opt(key) {
        None => Ok(None),
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(Some(true)),
            "false" | "0" | "no" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue { key, value }),
        },
    }
}

fn env_roles() -> Result<Vec<Role>, ConfigError> {
    match env_opt("RELAY_ROLES") {
        None => Ok(DEFAULT_ROLES.iter().map(|r| Role::new(*r)).collect()),
        Some(value) => {
            let roles: Vec<Role> = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(Role::normalized)
                .collect();
            if roles.is_empty() {
                return Err(ConfigError::RolesEmpty);
            }
            Ok(roles)
        }
    }
}

fn env_worktrees() -> Result<IndexMap<Role, PathBuf>, ConfigError> {
    let Some(value) = env_opt("RELAY_WORKTREES") else {
        return Ok(IndexMap::new());
    };
    let mut map = IndexMap::new();
    for pair in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let Some((role, path)) = pair.split_once('=') else {
            return Err(ConfigError::InvalidValue {
                key: "RELAY_WORKTREES",
                value: pair.to_string(),
            });
        };
        map.insert(Role::normalized(role), PathBuf::from(path.trim()));
    }
    Ok(map)
}

fn env_role_list(key: &'static str, default: &[&str]) -> Vec<Role> {
    match env_opt(key) {
        None => default.iter().map(|r| Role::new(*r)).collect(),
        Some(value) => value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Role::normalized)
            .collect(),
    }
}

fn env_gating() -> Result<PromptGating, ConfigError> {
    match env_opt("RELAY_PROMPT_GATING") {
        None => Ok(PromptGating::All),
        Some(value) => {
            PromptGating::parse(&value).ok_or(ConfigError::InvalidValue {
                key: "RELAY_PROMPT_GATING",
                value,
            })
        }
    }
}

fn env_llm() -> Result<Option<LlmConfig>, ConfigError> {
    let Some(api_url) = env_opt("RELAY_LLM_API_URL") else {
        return Ok(None);
    };
    Ok(Some(LlmConfig {
        api_url,
        api_key: env_opt("RELAY_LLM_API_KEY").unwrap_or_default(),
        model: env_opt("RELAY_LLM_MODEL").unwrap_or_else(|| "claude-haiku-4-5".into()),
        max_retries: env_u32("RELAY_LLM_MAX_RETRIES")?.unwrap_or(3),
    }))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
