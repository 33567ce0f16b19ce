use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Credentials file structure
///
/// Format:
/// ```toml
/// [site.profile_name]
/// password = "your_booking_site_password"
///
/// [smtp.profile_name]
/// password = "your_smtp_app_password"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Credentials {
    #[serde(default)]
    pub site: HashMap<String, CredentialProfile>,
    #[serde(default)]
    pub smtp: HashMap<String, CredentialProfile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CredentialProfile {
    pub password: String,
}

/// Credential type for looking up passwords
#[derive(Debug, Clone, Copy)]
pub enum CredentialType {
    Site,
    Smtp,
}

impl CredentialType {
    fn section(&self) -> &'static str {
        match self {
            CredentialType::Site => "site",
            CredentialType::Smtp => "smtp",
        }
    }
}

/// Default credentials file path: ~/.config/slot_watch/credentials.toml
pub fn get_credentials_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("slot_watch")
            .join("credentials.toml"),
    )
}

/// Load credentials from `path`
pub fn load_credentials(path: &Path) -> Result<Credentials, String> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        format!(
            "Failed to read credentials file '{}': {}",
            path.display(),
            e
        )
    })?;
    toml::from_str(&content)
        .map_err(|e| format!("Invalid credentials file '{}': {}", path.display(), e))
}

impl Credentials {
    /// Get password for a specific profile and credential type
    pub fn password(&self, cred_type: CredentialType, profile: &str) -> Result<String, String> {
        let profiles = match cred_type {
            CredentialType::Site => &self.site,
            CredentialType::Smtp => &self.smtp,
        };
        profiles
            .get(profile)
            .map(|p| p.password.clone())
            .ok_or_else(|| {
                format!(
                    "Credential profile '[{}.{}]' not found in credentials file",
                    cred_type.section(),
                    profile
                )
            })
    }
}
