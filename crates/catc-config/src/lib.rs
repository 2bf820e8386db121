//! Input document and connection profile loading for catc.
//!
//! The input document (YAML or JSON) carries the controller endpoint, the
//! run flags and the `config` list. `CATC_`-prefixed environment variables
//! override document fields, and named TOML profiles fill in whatever the
//! document leaves out. [`resolve`] turns the lot into the engine's
//! [`ControllerConfig`] and [`EngineSettings`].
//!
//! Precedence, highest first: CLI flags ([`Overrides`]), document (with its
//! environment overrides), profile, built-in defaults.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Json, Toml, Yaml},
};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use catc_core::{ControllerConfig, ControllerVersion, EngineSettings, State, TlsVerification};

/// Prefix of the environment variables that override document fields.
pub const ENV_PREFIX: &str = "CATC_";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no {field} configured; set it in the input document, a profile or {env}")]
    Missing { field: &'static str, env: &'static str },

    #[error("no password configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found (available: {available})")]
    ProfileNotFound { name: String, available: String },

    #[error("input document '{}' does not exist", .path.display())]
    DocumentNotFound { path: PathBuf },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

fn secret<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<SecretString>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

// ── Input document ──────────────────────────────────────────────────

/// One input document: endpoint, run flags and the `config` list.
#[derive(Debug, Default, Deserialize)]
pub struct Document {
    /// Controller host name, address or full URL.
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    #[serde(default, deserialize_with = "secret")]
    pub password: Option<SecretString>,
    /// `false` accepts self-signed certificates.
    pub verify: Option<bool>,
    /// Controller release, e.g. `"2.3.7.6"`; asked from the controller when absent.
    pub version: Option<String>,
    pub ca_cert: Option<PathBuf>,
    /// Per-request timeout in seconds.
    pub timeout: Option<u64>,
    /// Connection profile to fill in missing endpoint fields.
    pub profile: Option<String>,

    /// `merged` or `deleted`, any casing.
    pub state: Option<String>,
    pub config_verify: Option<bool>,
    pub fabric_vlan_batch_size: Option<usize>,
    pub anycast_gateway_batch_size: Option<usize>,
    /// Seconds between task polls.
    pub task_poll_interval: Option<u64>,
    /// Seconds before a pending task is abandoned.
    pub task_timeout: Option<u64>,

    /// The ordered list of resource specifications.
    #[serde(default)]
    pub config: Value,
}

/// Read a YAML or JSON document and apply `CATC_*` environment overrides.
///
/// Files ending in `.json` are read as JSON, everything else as YAML.
pub fn load_document(path: &Path) -> Result<Document, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::DocumentNotFound {
            path: path.to_path_buf(),
        });
    }
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let figment = if is_json {
        Figment::from(Json::file(path))
    } else {
        Figment::from(Yaml::file(path))
    };
    let document = figment
        .merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]))
        .extract()?;
    Ok(document)
}

// ── Connection profiles ─────────────────────────────────────────────

/// The profiles file (`catc/config.toml` in the platform config directory).
#[derive(Debug, Default, Deserialize)]
pub struct ProfileFile {
    /// Profile used when neither the flags nor the document name one.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

/// A named controller connection.
#[derive(Debug, Default, Deserialize)]
pub struct Profile {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    /// Plaintext password; prefer `password_env`.
    #[serde(default, deserialize_with = "secret")]
    pub password: Option<SecretString>,
    /// Environment variable holding the password.
    pub password_env: Option<String>,
    pub verify: Option<bool>,
    pub version: Option<String>,
    pub ca_cert: Option<PathBuf>,
    pub timeout: Option<u64>,
}

/// Resolve the profiles file path via platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("", "", "catc").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("catc");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Load the profiles file; a missing file yields no profiles.
pub fn load_profiles(path: &Path) -> Result<ProfileFile, ConfigError> {
    let profiles = Figment::from(Toml::file(path)).extract()?;
    Ok(profiles)
}

// ── CLI overrides ───────────────────────────────────────────────────

/// Values given on the command line; they beat everything else.
#[derive(Debug, Default)]
pub struct Overrides {
    pub profile: Option<String>,
    pub host: Option<String>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    /// Skip TLS verification.
    pub insecure: bool,
    pub version: Option<String>,
    pub state: Option<State>,
    pub config_verify: Option<bool>,
    /// Per-request timeout in seconds.
    pub timeout: Option<u64>,
}

// ── Resolution ──────────────────────────────────────────────────────

/// Everything a run needs.
#[derive(Debug)]
pub struct Resolved {
    pub controller: ControllerConfig,
    pub settings: EngineSettings,
    pub config: Value,
}

/// Merge flags, document and profile into engine inputs.
pub fn resolve(
    document: Document,
    profiles: &ProfileFile,
    overrides: &Overrides,
) -> Result<Resolved, ConfigError> {
    let profile = select_profile(profiles, &document, overrides)?;
    let controller = controller_config(&document, profile, overrides)?;
    let settings = engine_settings(&document, overrides)?;
    Ok(Resolved {
        controller,
        settings,
        config: document.config,
    })
}

/// Pick the active profile.
///
/// A profile named by a flag or the document must exist; a missing
/// `default_profile` is ignored.
pub fn select_profile<'a>(
    profiles: &'a ProfileFile,
    document: &Document,
    overrides: &Overrides,
) -> Result<Option<(&'a str, &'a Profile)>, ConfigError> {
    let requested = overrides.profile.as_ref().or(document.profile.as_ref());
    let Some(name) = requested.or(profiles.default_profile.as_ref()) else {
        return Ok(None);
    };
    match profiles.profiles.get_key_value(name) {
        Some((name, profile)) => Ok(Some((name.as_str(), profile))),
        None if requested.is_some() => {
            let mut available: Vec<&str> = profiles.profiles.keys().map(String::as_str).collect();
            available.sort_unstable();
            Err(ConfigError::ProfileNotFound {
                name: name.clone(),
                available: if available.is_empty() {
                    "none".into()
                } else {
                    available.join(", ")
                },
            })
        }
        None => Ok(None),
    }
}

/// Build the connection settings.
pub fn controller_config(
    document: &Document,
    profile: Option<(&str, &Profile)>,
    overrides: &Overrides,
) -> Result<ControllerConfig, ConfigError> {
    let (profile_name, profile) = match profile {
        Some((name, profile)) => (name, Some(profile)),
        None => ("(none)", None),
    };
    let from_profile = |pick: fn(&Profile) -> Option<&String>| profile.and_then(pick).cloned();

    let host = overrides
        .host
        .clone()
        .or_else(|| document.host.clone())
        .or_else(|| from_profile(|p| p.host.as_ref()))
        .ok_or(ConfigError::Missing {
            field: "host",
            env: "CATC_HOST",
        })?;
    let port = document.port.or_else(|| profile.and_then(|p| p.port));
    let url = controller_url(&host, port)?;

    let username = overrides
        .username
        .clone()
        .or_else(|| document.username.clone())
        .or_else(|| from_profile(|p| p.username.as_ref()))
        .ok_or(ConfigError::Missing {
            field: "username",
            env: "CATC_USERNAME",
        })?;
    let password = resolve_password(document, profile, profile_name, overrides)?;

    let verify = !overrides.insecure
        && document
            .verify
            .or_else(|| profile.and_then(|p| p.verify))
            .unwrap_or(true);
    let ca_cert = document
        .ca_cert
        .clone()
        .or_else(|| profile.and_then(|p| p.ca_cert.clone()));
    let tls = match (verify, ca_cert) {
        (false, _) => TlsVerification::DangerAcceptInvalid,
        (true, Some(path)) => TlsVerification::CustomCa(path),
        (true, None) => TlsVerification::SystemDefaults,
    };

    let version = overrides
        .version
        .clone()
        .or_else(|| document.version.clone())
        .or_else(|| from_profile(|p| p.version.as_ref()))
        .map(|raw| {
            raw.parse::<ControllerVersion>()
                .map_err(|e| invalid("version", e.to_string()))
        })
        .transpose()?;

    let timeout = overrides
        .timeout
        .or(document.timeout)
        .or_else(|| profile.and_then(|p| p.timeout))
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

    Ok(ControllerConfig {
        url,
        username,
        password,
        tls,
        timeout: Duration::from_secs(timeout),
        version,
    })
}

fn controller_url(host: &str, port: Option<u16>) -> Result<Url, ConfigError> {
    let raw = if host.contains("://") {
        host.to_owned()
    } else {
        format!("https://{host}")
    };
    let mut url = Url::parse(&raw).map_err(|e| invalid("host", format!("'{raw}': {e}")))?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("host", format!("'{raw}' has no host")));
    }
    if let Some(port) = port {
        url.set_port(Some(port))
            .map_err(|()| invalid("port", format!("cannot set port {port} on '{raw}'")))?;
    }
    Ok(url)
}

/// Flag, document (including `CATC_PASSWORD`), profile `password_env`, then
/// the profile's plaintext password.
fn resolve_password(
    document: &Document,
    profile: Option<&Profile>,
    profile_name: &str,
    overrides: &Overrides,
) -> Result<SecretString, ConfigError> {
    if let Some(password) = overrides.password.as_ref().or(document.password.as_ref()) {
        return Ok(password.clone());
    }
    if let Some(profile) = profile {
        if let Some(value) = profile
            .password_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
        {
            return Ok(SecretString::from(value));
        }
        if let Some(password) = &profile.password {
            return Ok(password.clone());
        }
    }
    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Build and check the engine pacing settings.
pub fn engine_settings(document: &Document, overrides: &Overrides) -> Result<EngineSettings, ConfigError> {
    let defaults = EngineSettings::default();

    let state = match (overrides.state, document.state.as_deref()) {
        (Some(state), _) => state,
        (None, Some(raw)) => raw
            .parse::<State>()
            .map_err(|_| invalid("state", format!("expected 'merged' or 'deleted', got '{raw}'")))?,
        (None, None) => defaults.state,
    };

    let fabric_vlan_batch_size = batch_size(
        "fabric_vlan_batch_size",
        document.fabric_vlan_batch_size,
        defaults.fabric_vlan_batch_size,
    )?;
    let anycast_gateway_batch_size = batch_size(
        "anycast_gateway_batch_size",
        document.anycast_gateway_batch_size,
        defaults.anycast_gateway_batch_size,
    )?;

    let task_poll_interval = document
        .task_poll_interval
        .map_or(defaults.task_poll_interval, Duration::from_secs);
    if task_poll_interval.is_zero() {
        return Err(invalid("task_poll_interval", "must be greater than 0"));
    }
    let task_timeout = document
        .task_timeout
        .map_or(defaults.task_timeout, Duration::from_secs);
    if task_timeout < task_poll_interval {
        return Err(invalid(
            "task_timeout",
            format!(
                "must be at least task_poll_interval ({}s)",
                task_poll_interval.as_secs()
            ),
        ));
    }

    Ok(EngineSettings {
        state,
        config_verify: overrides
            .config_verify
            .or(document.config_verify)
            .unwrap_or(defaults.config_verify),
        fabric_vlan_batch_size,
        anycast_gateway_batch_size,
        task_poll_interval,
        task_timeout,
    })
}

fn batch_size(field: &str, given: Option<usize>, default: usize) -> Result<usize, ConfigError> {
    let size = given.unwrap_or(default);
    if (1..=EngineSettings::MAX_BATCH_SIZE).contains(&size) {
        Ok(size)
    } else {
        Err(invalid(
            field,
            format!("{size} is outside 1..={}", EngineSettings::MAX_BATCH_SIZE),
        ))
    }
}
