//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.whateat/config.json`) and environment.
//! Environment variables use the names the bot has always been deployed with
//! (`ChannelSecret`, `ChannelAccessToken`, `GMAP_KEY`, `PORT`, `SWFood1`..`SWFood9`)
//! and override file values when set and non-blank.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::answers::{ANSWER_KEY_MAX, ANSWER_KEY_MIN};

pub const ENV_CONFIG_PATH: &str = "WHATEAT_CONFIG_PATH";
pub const ENV_CHANNEL_SECRET: &str = "ChannelSecret";
pub const ENV_CHANNEL_ACCESS_TOKEN: &str = "ChannelAccessToken";
pub const ENV_PLACES_API_KEY: &str = "GMAP_KEY";
pub const ENV_PORT: &str = "PORT";
/// Prefix for canned answer env vars; key `n` is read from `SWFood<n>`.
pub const ENV_ANSWER_PREFIX: &str = "SWFood";

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Gateway server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// LINE Messaging API credentials.
    #[serde(default)]
    pub line: LineConfig,

    /// Places nearby-search settings.
    #[serde(default)]
    pub places: PlacesConfig,

    /// Canned answers; `answers[0]` is key 1. Entries past key 9 are ignored.
    #[serde(default)]
    pub answers: Vec<String>,
}

/// Gateway bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for the webhook listener (default 8080). Overridden by PORT env.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "0.0.0.0"; the platform must reach the callback).
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    8080
}

fn default_gateway_bind() -> String {
    "0.0.0.0".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// LINE channel config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineConfig {
    /// Channel secret used to verify X-Line-Signature. Overridden by ChannelSecret env.
    pub channel_secret: Option<String>,
    /// Long-lived channel access token for the reply API. Overridden by ChannelAccessToken env.
    pub channel_access_token: Option<String>,
    /// Messaging API base URL (default https://api.line.me). Useful for tests and proxies.
    pub api_base: Option<String>,
}

/// Places nearby-search config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacesConfig {
    /// Google Maps API key. Overridden by GMAP_KEY env.
    pub api_key: Option<String>,
    /// Places API base URL (default https://maps.googleapis.com).
    pub api_base: Option<String>,
    /// Place type filter (default "food").
    #[serde(default = "default_place_type")]
    pub place_type: String,
    /// Result language (default "zh").
    #[serde(default = "default_language")]
    pub language: String,
    /// Reply when nothing open is nearby. Empty string suppresses the reply.
    #[serde(default = "default_empty_reply")]
    pub empty_reply: String,
}

fn default_place_type() -> String {
    "food".to_string()
}

fn default_language() -> String {
    "zh".to_string()
}

fn default_empty_reply() -> String {
    "附近找不到營業中的餐廳".to_string()
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: None,
            place_type: default_place_type(),
            language: default_language(),
            empty_reply: default_empty_reply(),
        }
    }
}

/// Credentials the gateway cannot start without.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub channel_secret: String,
    pub channel_access_token: String,
    pub places_api_key: String,
}

/// Trimmed, non-empty value of `key` from the given env lookup.
fn env_value(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    env(key).and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

/// Env value wins over the config value; blank values count as unset.
fn resolve_value(
    env: &impl Fn(&str) -> Option<String>,
    key: &str,
    configured: Option<&String>,
) -> Option<String> {
    env_value(env, key).or_else(|| {
        configured
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

/// Resolve all required credentials from the process environment and config.
pub fn resolve_credentials(config: &Config) -> Result<Credentials> {
    resolve_credentials_with(config, |k| std::env::var(k).ok())
}

/// Resolve credentials with an injected env lookup. Fails listing every missing value.
pub fn resolve_credentials_with(
    config: &Config,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Credentials> {
    let secret = resolve_value(&env, ENV_CHANNEL_SECRET, config.line.channel_secret.as_ref());
    let token = resolve_value(
        &env,
        ENV_CHANNEL_ACCESS_TOKEN,
        config.line.channel_access_token.as_ref(),
    );
    let key = resolve_value(&env, ENV_PLACES_API_KEY, config.places.api_key.as_ref());

    let mut missing = Vec::new();
    if secret.is_none() {
        missing.push(format!("line.channelSecret or {}", ENV_CHANNEL_SECRET));
    }
    if token.is_none() {
        missing.push(format!(
            "line.channelAccessToken or {}",
            ENV_CHANNEL_ACCESS_TOKEN
        ));
    }
    if key.is_none() {
        missing.push(format!("places.apiKey or {}", ENV_PLACES_API_KEY));
    }
    match (secret, token, key) {
        (Some(channel_secret), Some(channel_access_token), Some(places_api_key)) => {
            Ok(Credentials {
                channel_secret,
                channel_access_token,
                places_api_key,
            })
        }
        _ => anyhow::bail!("missing required credentials: {}", missing.join(", ")),
    }
}

/// Apply PORT env to the gateway port. Invalid values are logged and ignored.
pub fn apply_port_override(config: &mut Config, env: impl Fn(&str) -> Option<String>) {
    if let Some(raw) = env_value(&env, ENV_PORT) {
        match raw.parse::<u16>() {
            Ok(port) => config.gateway.port = port,
            Err(_) => log::warn!("ignoring invalid {}={:?}", ENV_PORT, raw),
        }
    }
}

/// Canned answers keyed 1..=9: `SWFood<n>` env overrides `answers[n-1]` from config.
pub fn resolve_answers_with(
    config: &Config,
    env: impl Fn(&str) -> Option<String>,
) -> Vec<(u32, String)> {
    (ANSWER_KEY_MIN..=ANSWER_KEY_MAX)
        .filter_map(|key| {
            let env_key = format!("{}{}", ENV_ANSWER_PREFIX, key);
            env_value(&env, &env_key).or_else(|| {
                config
                    .answers
                    .get((key - ANSWER_KEY_MIN) as usize)
                    .cloned()
            })
            .map(|answer| (key, answer))
        })
        .collect()
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var(ENV_CONFIG_PATH).map(PathBuf::from).unwrap_or_else(|_| {
        dirs::home_dir()
            .map(|h| h.join(".whateat").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    })
}

/// Load config from the given path, else WHATEAT_CONFIG_PATH, else the default. Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

/// Write a default config file (with placeholder answers) if none exists. Returns true when written.
pub fn write_default_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating config directory {}", dir.display()))?;
    }
    let config = Config {
        answers: vec![String::new(); (ANSWER_KEY_MAX - ANSWER_KEY_MIN + 1) as usize],
        ..Config::default()
    };
    let json = serde_json::to_string_pretty(&config).context("serializing default config")?;
    std::fs::write(path, json)
        .with_context(|| format!("writing default config to {}", path.display()))?;
    log::info!("created default config at {}", path.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn default_gateway_port_and_bind() {
        let g = GatewayConfig::default();
        assert_eq!(g.port, 8080);
        assert_eq!(g.bind, "0.0.0.0");
    }

    #[test]
    fn places_defaults_search_open_food_in_chinese() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.places.place_type, "food");
        assert_eq!(config.places.language, "zh");
        assert!(!config.places.empty_reply.is_empty());
    }

    #[test]
    fn credentials_from_env_override_config() {
        let mut config = Config::default();
        config.line.channel_secret = Some("file-secret".into());
        config.line.channel_access_token = Some("file-token".into());
        config.places.api_key = Some("file-key".into());
        let env = env_from(&[("ChannelSecret", "env-secret"), ("GMAP_KEY", "  ")]);
        let creds = resolve_credentials_with(&config, env).unwrap();
        assert_eq!(creds.channel_secret, "env-secret");
        assert_eq!(creds.channel_access_token, "file-token");
        assert_eq!(creds.places_api_key, "file-key");
    }

    #[test]
    fn missing_credentials_are_an_error_naming_each() {
        let mut config = Config::default();
        config.line.channel_access_token = Some("tok".into());
        let err = resolve_credentials_with(&config, env_from(&[]))
            .unwrap_err()
            .to_string();
        assert!(err.contains("ChannelSecret"), "{}", err);
        assert!(err.contains("GMAP_KEY"), "{}", err);
        assert!(!err.contains("ChannelAccessToken"), "{}", err);
    }

    #[test]
    fn answers_merge_config_and_env() {
        let config = Config {
            answers: vec!["ramen".into(), "curry".into()],
            ..Config::default()
        };
        let env = env_from(&[("SWFood2", "pho"), ("SWFood9", "tacos")]);
        let answers = resolve_answers_with(&config, env);
        assert_eq!(
            answers,
            vec![
                (1, "ramen".to_string()),
                (2, "pho".to_string()),
                (9, "tacos".to_string()),
            ]
        );
    }

    #[test]
    fn blank_answer_env_falls_back_to_config() {
        let config = Config {
            answers: vec!["ramen".into()],
            ..Config::default()
        };
        let env = env_from(&[("SWFood1", "   "), ("SWFood2", "")]);
        assert_eq!(
            resolve_answers_with(&config, env),
            vec![(1, "ramen".to_string())]
        );
    }

    #[test]
    fn port_override_ignores_garbage() {
        let mut config = Config::default();
        apply_port_override(&mut config, env_from(&[("PORT", "not-a-port")]));
        assert_eq!(config.gateway.port, 8080);
        apply_port_override(&mut config, env_from(&[("PORT", "5000")]));
        assert_eq!(config.gateway.port, 5000);
    }

    #[test]
    fn parses_camel_case_file() {
        let json = r#"{
            "gateway": { "port": 9000 },
            "line": { "channelSecret": "s", "channelAccessToken": "t" },
            "places": { "apiKey": "k", "emptyReply": "" },
            "answers": ["a"]
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.gateway.port, 9000);
        assert_eq!(config.gateway.bind, "0.0.0.0");
        assert_eq!(config.line.channel_secret.as_deref(), Some("s"));
        assert_eq!(config.places.empty_reply, "");
        assert_eq!(config.places.language, "zh");
        assert_eq!(config.answers, vec!["a".to_string()]);
    }

    #[test]
    fn write_default_config_once() {
        let dir = std::env::temp_dir().join(format!(
            "whateat-config-test-{}-{}",
            std::process::id(),
            rand::random::<u32>()
        ));
        let path = dir.join("config.json");
        assert!(write_default_config(&path).unwrap());
        assert!(!write_default_config(&path).unwrap());
        let (config, used) = load_config(Some(path.clone())).unwrap();
        assert_eq!(used, path);
        assert_eq!(config.answers.len(), 9);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
