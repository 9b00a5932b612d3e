use crate::archi::PointPolicy;

use chrono::Weekday;
use chrono_tz::Tz;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Environment variable holding the bot token. Takes precedence over the
/// `token` field of the config file.
pub const TOKEN_VAR: &str = "DISCORD_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] io::Error),
    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unknown timezone `{0}`")]
    Timezone(String),
    #[error("invalid cycle time {0:02}:{1:02}")]
    CycleTime(u32, u32),
    #[error("no token given, set {} or `token` in the config file", TOKEN_VAR)]
    MissingToken,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub token: String,
    pub loglevel: LevelFilter,
    pub prefix: String,
    /// IANA name of the guild's time zone. All displayed times, day keys and
    /// the weekly cycle use it.
    pub timezone: String,
    pub state_file: PathBuf,
    /// Members always allowed to run restricted commands.
    pub admins: Vec<u64>,
    pub points: Points,
    pub announce: Announce,
    pub cycle: Cycle,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: String::new(),
            loglevel: LevelFilter::Info,
            prefix: String::from("!"),
            timezone: String::from("Europe/Paris"),
            state_file: PathBuf::from("./archis.json"),
            admins: Vec::new(),
            points: Points::default(),
            announce: Announce::default(),
            cycle: Cycle::default(),
        }
    }
}

impl Config {
    /// Loads the config file at `path`. A missing file yields the default
    /// config.
    pub fn load<P>(path: P) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
    {
        let mut file = match File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(err.into()),
        };

        let mut buf = String::new();
        file.read_to_string(&mut buf)?;

        Self::parse(&buf)
    }

    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Replaces the token with the value of [`TOKEN_VAR`] if it is set.
    /// Fails if neither source provides a token.
    pub fn resolve_token(&mut self, var: Option<String>) -> Result<(), ConfigError> {
        if let Some(token) = var.filter(|t| !t.trim().is_empty()) {
            self.token = token.trim().to_owned();
        }

        match self.token.is_empty() {
            true => Err(ConfigError::MissingToken),
            false => Ok(()),
        }
    }

    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse()
            .map_err(|_| ConfigError::Timezone(self.timezone.clone()))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.tz()?;

        if self.cycle.hour >= 24 || self.cycle.minute >= 60 {
            return Err(ConfigError::CycleTime(self.cycle.hour, self.cycle.minute));
        }

        Ok(())
    }
}

/// Scoring section.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Points {
    pub common: i64,
    pub rare: i64,
    /// Archimonsters worth `rare` points and announced with an escalated
    /// alert.
    pub rare_archis: Vec<String>,
}

impl Points {
    pub fn policy(&self) -> PointPolicy {
        PointPolicy {
            common: self.common,
            rare: self.rare,
        }
    }
}

impl Default for Points {
    fn default() -> Self {
        let policy = PointPolicy::default();

        Self {
            common: policy.common,
            rare: policy.rare,
            rare_archis: ["bulgig", "gloubibou", "kannibal", "fourbasse", "grolloum"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BroadcastMode {
    /// Stop at the first channel that accepted the message.
    First,
    /// Post to every channel.
    All,
}

impl Default for BroadcastMode {
    fn default() -> Self {
        Self::First
    }
}

/// Destinations for repop alerts and cycle announcements.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Announce {
    pub channels: Vec<u64>,
    pub mode: BroadcastMode,
}

/// The recurring weekly cycle awarding the title role.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Cycle {
    pub hour: u32,
    pub minute: u32,
    /// Days of the week the winner is drawn. Empty draws every day.
    pub weekdays: Vec<Weekday>,
    /// Guild and role of the title holder. A value of `0` disables the role
    /// transfer.
    pub guild_id: u64,
    pub role_id: u64,
    /// Number of days the daily counts are kept.
    pub retention_days: u32,
}

impl Default for Cycle {
    fn default() -> Self {
        Self {
            hour: 21,
            minute: 0,
            weekdays: vec![Weekday::Sun],
            guild_id: 0,
            role_id: 0,
            retention_days: 30,
        }
    }
}
