//! Configuration
//!
//! Settings come from a YAML file, then environment variables. Every section
//! except `auth` may be omitted; missing values take the defaults below.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "SEATDESK_CONFIG";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub booking: BookingConfig,
}

/// HTTP listener
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Tokio worker threads
    pub workers: usize,
    /// Allowed CORS origins; empty allows any origin
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5080,
            workers: num_cpus::get(),
            cors_origins: Vec::new(),
        }
    }
}

/// Bearer token settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_token_expiry")]
    pub token_expiry_hours: u64,
}

fn default_token_expiry() -> u64 {
    24
}

/// SQLite pool
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    /// How long a writer waits on a locked database
    pub busy_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./data/seatdesk.db".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
            busy_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `seatdesk=debug,sqlx=warn`
    pub level: String,
    pub format: LogFormat,
    pub target: LogTarget,
    /// Used when `target` is `file` or `both`
    pub log_dir: PathBuf,
    pub log_prefix: String,
    pub daily_rotation: bool,
    /// Rotated files to keep; 0 keeps everything
    pub max_log_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            target: LogTarget::Console,
            log_dir: PathBuf::from("/var/log/seatdesk"),
            log_prefix: "seatdesk".to_string(),
            daily_rotation: true,
            max_log_files: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    #[default]
    Console,
    File,
    Both,
}

impl FromStr for LogTarget {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "console" => Ok(LogTarget::Console),
            "file" => Ok(LogTarget::File),
            "both" => Ok(LogTarget::Both),
            other => anyhow::bail!("unknown log target '{}'", other),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            other => anyhow::bail!("unknown log format '{}'", other),
        }
    }
}

/// Booking rules shared by every library
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BookingConfig {
    /// Largest batch accepted by bulk seat creation
    pub max_bulk_seats: usize,
    /// Monthly fee given to newly registered libraries
    pub default_monthly_fee: f64,
    /// Hourly fee given to newly registered libraries
    pub default_hourly_fee: f64,
    /// Offset of library wall-clock time from UTC, used by the status sweep
    pub timezone_offset_minutes: i32,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            max_bulk_seats: 200,
            default_monthly_fee: 1000.0,
            default_hourly_fee: 20.0,
            timezone_offset_minutes: 0,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig {
                jwt_secret: "change-me-in-production-minimum-32-characters-long".to_string(),
                token_expiry_hours: default_token_expiry(),
            },
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            booking: BookingConfig::default(),
        }
    }
}

/// Overwrite `target` with the parsed value of `var`, when set and valid
fn env_override<T: FromStr>(var: &str, target: &mut T) {
    if let Some(value) = std::env::var(var).ok().and_then(|v| v.parse().ok()) {
        *target = value;
    }
}

impl AppConfig {
    /// Load configuration.
    ///
    /// Precedence, lowest first: defaults, the YAML file named by
    /// `SEATDESK_CONFIG` or found in a standard location, environment
    /// variables. A `.env` file is read first when present.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let path = std::env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .ok()
            .or_else(Self::find_config_file);

        Self::load_from(path.as_deref())
    }

    /// Load from an explicit file (or defaults), then apply env overrides
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) if path.exists() => {
                eprintln!("[CONFIG] Loading configuration from: {:?}", path);
                Self::parse_file(path)?
            }
            Some(path) => {
                eprintln!("[CONFIG] Config file not found: {:?}, using defaults", path);
                AppConfig::default()
            }
            None => {
                eprintln!("[CONFIG] No config file found, using defaults");
                AppConfig::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn parse_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        serde_norway::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    fn find_config_file() -> Option<PathBuf> {
        let user_config = dirs::config_dir().map(|dir| dir.join("seatdesk/config.yaml"));

        [
            Some(PathBuf::from("config.yaml")),
            Some(PathBuf::from("config/config.yaml")),
            Some(PathBuf::from("/etc/seatdesk/config.yaml")),
            user_config,
        ]
        .into_iter()
        .flatten()
        .find(|p| p.exists())
    }

    fn apply_env_overrides(&mut self) {
        env_override("SEATDESK_HOST", &mut self.server.host);
        env_override("SEATDESK_PORT", &mut self.server.port);
        env_override("SEATDESK_WORKERS", &mut self.server.workers);

        env_override("DATABASE_URL", &mut self.database.url);
        env_override("JWT_SECRET", &mut self.auth.jwt_secret);

        env_override("RUST_LOG", &mut self.logging.level);
        env_override("SEATDESK_LOG_FORMAT", &mut self.logging.format);
        env_override("SEATDESK_LOG_TARGET", &mut self.logging.target);
        env_override("SEATDESK_LOG_DIR", &mut self.logging.log_dir);

        env_override("SEATDESK_MAX_BULK_SEATS", &mut self.booking.max_bulk_seats);
        env_override(
            "SEATDESK_TIMEZONE_OFFSET_MINUTES",
            &mut self.booking.timezone_offset_minutes,
        );
    }

    fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.len() < 32 {
            anyhow::bail!("JWT secret must be at least 32 characters long");
        }
        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }
        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        let booking = &self.booking;
        if booking.max_bulk_seats == 0 {
            anyhow::bail!("booking.max_bulk_seats must be at least 1");
        }
        if !(booking.default_monthly_fee.is_finite() && booking.default_monthly_fee > 0.0) {
            anyhow::bail!("booking.default_monthly_fee must be greater than 0");
        }
        if !booking.default_hourly_fee.is_finite() || booking.default_hourly_fee < 0.0 {
            anyhow::bail!("booking.default_hourly_fee cannot be negative");
        }
        // UTC-14:00 .. UTC+14:00
        if booking.timezone_offset_minutes.abs() > 14 * 60 {
            anyhow::bail!(
                "booking.timezone_offset_minutes out of range: {}",
                booking.timezone_offset_minutes
            );
        }

        Ok(())
    }

    /// Write the default configuration as YAML, creating parent directories
    pub fn create_default_config(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_norway::to_string(&AppConfig::default())?;
        std::fs::write(path, yaml)?;
        Ok(())
    }
}
