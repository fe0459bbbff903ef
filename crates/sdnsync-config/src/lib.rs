//! Shared configuration for sdnsync deployments.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to the controller settings and transport config the
//! engine consumes. The job runner embedding the engine depends on this
//! crate; the engine itself never reads configuration.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use sdnsync_api::{TlsMode, TransportConfig};
use sdnsync_core::{Controller, ControllerKind, HostnamePatterns};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("unknown profile '{profile}'")]
    UnknownProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named controller profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    60
}

/// A named controller profile.
#[derive(Debug, Deserialize, Serialize)]
pub struct Profile {
    /// Controller base URL (e.g., "https://dnac.example.net").
    pub controller: String,

    /// Controller software release (selects the API revision).
    #[serde(default = "default_version")]
    pub version: String,

    /// Device family allowlist applied to the fetch pass.
    #[serde(default)]
    pub device_families: Vec<String>,

    /// Hostname-parsing regex for site inference (capture group 1 is
    /// the facility token).
    pub site_pattern: Option<String>,

    /// Hostname-parsing regex for role inference.
    pub role_pattern: Option<String>,

    /// Tenant assigned to new prototypes and created IPs.
    pub default_tenant: Option<Uuid>,

    /// Username for token acquisition.
    pub username: Option<String>,

    /// Password (plaintext — prefer keyring or env var).
    pub password: Option<String>,

    /// Pre-issued auth token (plaintext — prefer keyring or env var).
    pub token: Option<String>,

    /// Environment variable name containing the auth token.
    pub token_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout in seconds.
    pub timeout: Option<u64>,
}

fn default_version() -> String {
    "2.3.7".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("net", "sdnsync", "sdnsync").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("sdnsync");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load a Config from an explicit file path, merged over defaults and
/// under `SDNSYNC_`-prefixed environment variables.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SDNSYNC_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Profile selection ───────────────────────────────────────────────

impl Config {
    /// Look up a profile by name, falling back to the default profile.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| ConfigError::UnknownProfile {
                profile: name.to_owned(),
            })
    }
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve an auth token from the credential chain: the profile's env
/// var, then the system keyring, then plaintext in the config file.
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = profile.token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    if let Ok(entry) = keyring::Entry::new("sdnsync", &format!("{profile_name}/token")) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    if let Some(ref token) = profile.token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Resolve username + password for token acquisition.
pub fn resolve_login_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<(String, SecretString), ConfigError> {
    let username = profile
        .username
        .clone()
        .or_else(|| std::env::var("SDNSYNC_USERNAME").ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })?;

    if let Ok(pw) = std::env::var("SDNSYNC_PASSWORD") {
        return Ok((username, SecretString::from(pw)));
    }

    if let Ok(entry) = keyring::Entry::new("sdnsync", &format!("{profile_name}/password")) {
        if let Ok(pw) = entry.get_password() {
            return Ok((username, SecretString::from(pw)));
        }
    }

    if let Some(ref pw) = profile.password {
        return Ok((username, SecretString::from(pw.clone())));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

// ── Translation to engine types ─────────────────────────────────────

/// Build the transport configuration for a profile.
pub fn profile_to_transport(profile: &Profile, defaults: &Defaults) -> TransportConfig {
    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    TransportConfig {
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
    }
}

/// Build the controller settings record the engine persists prototypes
/// under. The id is freshly assigned; embedders that already store
/// controllers keep their own ids.
pub fn profile_to_controller(profile: &Profile, profile_name: &str) -> Controller {
    Controller {
        id: Uuid::new_v4(),
        name: profile_name.to_owned(),
        hostname: profile.controller.clone(),
        kind: ControllerKind::CatalystCenter,
        version: profile.version.clone(),
        device_families: profile.device_families.clone(),
        hostname_patterns: HostnamePatterns {
            site: profile.site_pattern.clone(),
            role: profile.role_pattern.clone(),
        },
        default_tenant: profile.default_tenant,
        last_fetch: None,
        last_sync: None,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;
    use std::io::Write;

    use super::*;

    const SAMPLE: &str = r#"
default_profile = "lab"

[defaults]
timeout = 30

[profiles.lab]
controller = "https://dnac.lab.example.net"
device_families = ["Switches and Hubs", "Routers"]
site_pattern = '^\w+-(\w+)-'
username = "svc-sdnsync"
password = "hunter2"
insecure = true
"#;

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = load_config_from(file.path()).unwrap();
        assert_eq!(config.default_profile.as_deref(), Some("lab"));
        assert_eq!(config.defaults.timeout, 30);

        let (name, profile) = config.profile(None).unwrap();
        assert_eq!(name, "lab");
        assert_eq!(profile.controller, "https://dnac.lab.example.net");
        assert_eq!(profile.device_families.len(), 2);
    }

    #[test]
    fn test_unknown_profile_is_an_error() {
        let config = Config::default();
        assert!(matches!(
            config.profile(Some("nope")),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn test_transport_translation() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        let (_, profile) = config.profile(Some("lab")).unwrap();

        let transport = profile_to_transport(profile, &config.defaults);
        assert!(matches!(transport.tls, TlsMode::DangerAcceptInvalid));
        assert_eq!(transport.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_controller_translation_carries_patterns() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        let (name, profile) = config.profile(None).unwrap();

        let controller = profile_to_controller(profile, name);
        assert_eq!(controller.name, "lab");
        assert_eq!(controller.kind, ControllerKind::CatalystCenter);
        assert_eq!(
            controller.hostname_patterns.site.as_deref(),
            Some(r"^\w+-(\w+)-")
        );
        assert!(controller.hostname_patterns.role.is_none());
    }

    #[test]
    fn test_plaintext_credential_fallback() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        let (name, profile) = config.profile(None).unwrap();

        let (username, _password) = resolve_login_credentials(profile, name).unwrap();
        assert_eq!(username, "svc-sdnsync");
        assert!(matches!(
            resolve_token(profile, name),
            Err(ConfigError::NoCredentials { .. })
        ));
    }
}
