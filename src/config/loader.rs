// Configuration loader
// Loads ~/.riffwise/config.toml (or an explicit path), then applies
// environment overrides

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::constants::{CONFIG_FILE_NAME, DATA_DIR_NAME};
use super::settings::Config;

/// Default config file location.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DATA_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load configuration.
///
/// An explicit `path` must exist. Without one, a missing
/// ~/.riffwise/config.toml means defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => {
            if !path.exists() {
                bail!("Configuration file not found: {}", path.display());
            }
            read_config_file(path)?
        }
        None => match default_config_path() {
            Some(path) if path.exists() => read_config_file(&path)?,
            _ => {
                tracing::debug!("No config file found, using defaults");
                Config::default()
            }
        },
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse configuration file {}", path.display()))?;
    tracing::info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

/// Apply environment overrides. Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |keys: &[&str]| {
        keys.iter()
            .filter_map(|k| lookup(k))
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty())
    };

    if let Some(key) = get(&["GEMINI_API_KEY", "GOOGLE_API_KEY"]) {
        config.providers.gemini.api_key = Some(key);
    }
    if let Some(key) = get(&["GROK_API_KEY", "XAI_API_KEY"]) {
        config.providers.grok.api_key = Some(key);
    }
    if let Some(bind) = get(&["RIFFWISE_BIND"]) {
        config.server.bind_address = bind;
    }
    if let Some(db) = get(&["RIFFWISE_DB"]) {
        config.database.path = Some(PathBuf::from(db));
    }
    if let Some(order) = get(&["RIFFWISE_FALLBACK_ORDER"]) {
        config.providers.fallback_order = order
            .split(',')
            .map(|name| name.trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
bind_address = "0.0.0.0:9000"

[providers]
fallback_order = ["grok", "gemini"]
probe_on_startup = false

[providers.gemini]
model = "gemini-1.5-pro"
"#
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.providers.fallback_order, vec!["grok", "gemini"]);
        assert!(!config.providers.probe_on_startup);
        assert_eq!(config.providers.gemini.model.as_deref(), Some("gemini-1.5-pro"));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load_config(Some(&missing)).is_err());
    }

    #[test]
    fn test_invalid_file_is_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[providers]\nfallback_order = []").unwrap();
        assert!(load_config(Some(file.path())).is_err());

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not = [valid").unwrap();
        assert!(load_config(Some(file.path())).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars = env(&[
            ("GOOGLE_API_KEY", "g-key"),
            ("XAI_API_KEY", "x-key"),
            ("RIFFWISE_BIND", "0.0.0.0:8080"),
            ("RIFFWISE_DB", "/tmp/test.db"),
            ("RIFFWISE_FALLBACK_ORDER", " Grok , gemini "),
        ]);
        let mut config = Config::default();
        apply_env_overrides(&mut config, |k| vars.get(k).cloned());

        assert_eq!(config.providers.gemini.key(), Some("g-key"));
        assert_eq!(config.providers.grok.key(), Some("x-key"));
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
        assert_eq!(config.database_path(), PathBuf::from("/tmp/test.db"));
        assert_eq!(config.providers.fallback_order, vec!["grok", "gemini"]);
    }

    #[test]
    fn test_primary_env_name_wins_and_blank_is_ignored() {
        let vars = env(&[
            ("GEMINI_API_KEY", "primary"),
            ("GOOGLE_API_KEY", "secondary"),
            ("GROK_API_KEY", "  "),
        ]);
        let mut config = Config::default();
        config.providers.grok.api_key = Some("from-file".to_string());
        apply_env_overrides(&mut config, |k| vars.get(k).cloned());

        assert_eq!(config.providers.gemini.key(), Some("primary"));
        assert_eq!(config.providers.grok.key(), Some("from-file"));
    }
}
