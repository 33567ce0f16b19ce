use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::notify::DEFAULT_SUBJECT;
use crate::time_rule::{ClockTime, ThresholdConfig};

fn default_poll_interval_seconds() -> u64 {
    15 * 60
}

fn default_database() -> PathBuf {
    PathBuf::from("appointments.sqlite")
}

fn default_log_file() -> PathBuf {
    PathBuf::from("slot_watch.log")
}

fn default_smtp_port() -> u16 {
    587
}

/// Watcher configuration file structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Seconds to wait after a cycle finishes before starting the next (default: 900)
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,
    /// Earliest acceptable start on Monday-Friday, e.g. "04:30 PM"
    pub weekday_threshold: String,
    /// Earliest acceptable start on Saturday and Sunday, e.g. "09:00 AM"
    pub weekend_threshold: String,
    /// SQLite file holding the seen-set (default: appointments.sqlite)
    #[serde(default = "default_database")]
    pub database: PathBuf,
    /// Log file, appended to alongside stdout (default: slot_watch.log)
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    /// Booking site login (maps to [site] section in TOML)
    pub site: SiteConfig,
    /// Outgoing mail (maps to [smtp] section in TOML)
    pub smtp: SmtpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Login page of the booking site
    pub login_url: String,
    pub username: String,
    /// Credential profile name to look up the password under [site.<profile>]
    pub credential_profile: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    /// SMTP server hostname (STARTTLS)
    pub server: String,
    /// SMTP port (default: 587)
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// Sender address, also used as the SMTP username
    pub sender: String,
    /// Credential profile name to look up the password under [smtp.<profile>]
    pub credential_profile: String,
    pub recipients: Vec<String>,
    /// Email subject (default: "Driving Lesson Openings Available")
    pub subject: Option<String>,
}

impl Config {
    /// Read and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;
        Self::from_toml(&content)
            .map_err(|e| format!("Invalid config file '{}': {}", path.display(), e))
    }

    pub fn from_toml(content: &str) -> Result<Self, String> {
        let config: Config = toml::from_str(content).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot
    pub fn validate(&self) -> Result<(), String> {
        if self.poll_interval_seconds == 0 {
            return Err("poll_interval_seconds must be greater than 0".to_string());
        }
        self.thresholds()?;
        self.login_url()?;
        if self.smtp.recipients.is_empty() {
            return Err("[smtp] recipients must list at least one address".to_string());
        }
        Ok(())
    }

    pub fn thresholds(&self) -> Result<ThresholdConfig, String> {
        let weekday = ClockTime::parse_threshold(&self.weekday_threshold)
            .map_err(|e| format!("weekday_threshold: {}", e))?;
        let weekend = ClockTime::parse_threshold(&self.weekend_threshold)
            .map_err(|e| format!("weekend_threshold: {}", e))?;
        Ok(ThresholdConfig { weekday, weekend })
    }

    pub fn login_url(&self) -> Result<Url, String> {
        Url::parse(&self.site.login_url)
            .map_err(|e| format!("[site] login_url '{}': {}", self.site.login_url, e))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    pub fn subject(&self) -> &str {
        self.smtp.subject.as_deref().unwrap_or(DEFAULT_SUBJECT)
    }

    /// Lock file guarding the database against a second watcher
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.database.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
weekday_threshold = "04:30 PM"
weekend_threshold = "09:00 AM"

[site]
login_url = "https://booking.example.com/login"
username = "driver"
credential_profile = "aaa"

[smtp]
server = "smtp.gmail.com"
sender = "me@example.com"
credential_profile = "gmail"
recipients = ["a@example.com", "b@example.com"]
"#;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml(MINIMAL).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_secs(900));
        assert_eq!(config.database, PathBuf::from("appointments.sqlite"));
        assert_eq!(config.log_file, PathBuf::from("slot_watch.log"));
        assert_eq!(config.smtp.port, 587);
        assert_eq!(config.subject(), DEFAULT_SUBJECT);
        assert_eq!(config.lock_path(), PathBuf::from("appointments.sqlite.lock"));

        let th = config.thresholds().unwrap();
        assert_eq!(th.weekday, ClockTime::new(16, 30).unwrap());
        assert_eq!(th.weekend, ClockTime::new(9, 0).unwrap());
    }

    #[test]
    fn test_rejects_bad_threshold() {
        let content = MINIMAL.replace("04:30 PM", "4.30pm");
        let err = Config::from_toml(&content).unwrap_err();
        assert!(err.contains("weekday_threshold"), "{}", err);
    }

    #[test]
    fn test_rejects_zero_interval() {
        let content = format!("poll_interval_seconds = 0\n{}", MINIMAL);
        let err = Config::from_toml(&content).unwrap_err();
        assert!(err.contains("poll_interval_seconds"), "{}", err);
    }

    #[test]
    fn test_rejects_empty_recipients() {
        let content = MINIMAL.replace(r#"["a@example.com", "b@example.com"]"#, "[]");
        let err = Config::from_toml(&content).unwrap_err();
        assert!(err.contains("recipients"), "{}", err);
    }

    #[test]
    fn test_rejects_bad_login_url() {
        let content = MINIMAL.replace("https://booking.example.com/login", "not a url");
        let err = Config::from_toml(&content).unwrap_err();
        assert!(err.contains("login_url"), "{}", err);
    }

    #[test]
    fn test_missing_section() {
        let content = MINIMAL.split("[smtp]").next().unwrap();
        assert!(Config::from_toml(content).is_err());
    }
}
