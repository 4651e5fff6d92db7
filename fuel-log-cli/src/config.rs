use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Hosted backend connection settings
#[derive(Debug, Clone, Serialize)]
pub struct SupabaseConfig {
    /// Project URL (e.g., "https://abcd.supabase.co")
    pub url: ConfigValue<Option<String>>,
    /// Public anon key; row-level security does the rest
    #[serde(serialize_with = "serialize_masked")]
    pub anon_key: ConfigValue<Option<String>>,
}

impl SupabaseConfig {
    /// Returns url and anon key, or the first missing key.
    pub fn credentials(&self) -> Result<(String, String), ConfigError> {
        let url = self
            .url
            .value
            .clone()
            .ok_or(ConfigError::Missing("supabase.url", "FUEL_SUPABASE_URL"))?;
        let anon_key = self.anon_key.value.clone().ok_or(ConfigError::Missing(
            "supabase.anon_key",
            "FUEL_SUPABASE_ANON_KEY",
        ))?;
        Ok((url, anon_key))
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub supabase: SupabaseConfig,
    /// Directory holding the saved session
    pub data_dir: ConfigValue<PathBuf>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    supabase: SupabaseFile,
    data_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SupabaseFile {
    url: Option<String>,
    anon_key: Option<String>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::load_with_env(config_path, |key| std::env::var(key).ok())
    }

    fn load_with_env(
        config_path: Option<PathBuf>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut url = ConfigValue::new(None, ConfigSource::Default);
        let mut anon_key = ConfigValue::new(None, ConfigSource::Default);
        let mut data_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut config_file = None;

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(value) = file_config.supabase.url {
                url = ConfigValue::new(Some(value), ConfigSource::File);
            }
            if let Some(value) = file_config.supabase.anon_key {
                anon_key = ConfigValue::new(Some(value), ConfigSource::File);
            }
            if let Some(dir) = file_config.data_dir {
                data_dir = ConfigValue::new(resolve_relative(&path, dir), ConfigSource::File);
            }
        }

        if let Some(value) = env("FUEL_SUPABASE_URL") {
            url = ConfigValue::new(Some(value), ConfigSource::Environment);
        }
        if let Some(value) = env("FUEL_SUPABASE_ANON_KEY") {
            anon_key = ConfigValue::new(Some(value), ConfigSource::Environment);
        }
        if let Some(dir) = env("FUEL_DATA_DIR") {
            data_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }

        Ok(Self {
            supabase: SupabaseConfig { url, anon_key },
            data_dir,
            config_file,
        })
    }

    /// Where the signed-in session is kept between runs.
    pub fn session_path(&self) -> PathBuf {
        self.data_dir.value.join("session.json")
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/fuel/
    /// - macOS: ~/Library/Application Support/fuel/
    /// - Windows: %APPDATA%/fuel/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fuel")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/fuel/
    /// - macOS: ~/Library/Application Support/fuel/
    /// - Windows: %APPDATA%/fuel/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fuel")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

/// Resolves a relative path against the config file's directory
fn resolve_relative(config_path: &Path, path: PathBuf) -> PathBuf {
    if path.is_relative() {
        config_path.parent().map(|p| p.join(&path)).unwrap_or(path)
    } else {
        path
    }
}

/// Shortens a secret for display, keeping the first and last four characters.
pub fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        "****".to_string()
    }
}

fn serialize_masked<S: serde::Serializer>(
    value: &ConfigValue<Option<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let masked = ConfigValue::new(value.value.as_deref().map(mask), value.source.clone());
    masked.serialize(serializer)
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    /// A required key is unset: (config key, environment variable)
    Missing(&'static str, &'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::Missing(key, var) => {
                write!(
                    f,
                    "{} is not configured. Set it in the config file or with {}.",
                    key, var
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_default_config() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let config = Config::load_with_env(Some(config_path), no_env).unwrap();
        assert!(config.data_dir.value.ends_with("fuel"));
        assert_eq!(config.data_dir.source, ConfigSource::Default);
        assert_eq!(config.supabase.url.value, None);
        assert_eq!(config.supabase.url.source, ConfigSource::Default);
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "supabase:").unwrap();
        writeln!(file, "  url: https://example.supabase.co").unwrap();
        writeln!(file, "  anon_key: public-anon-key").unwrap();
        writeln!(file, "data_dir: /custom/fuel").unwrap();

        let config = Config::load_with_env(Some(config_path.clone()), no_env).unwrap();
        assert_eq!(
            config.supabase.credentials().unwrap(),
            (
                "https://example.supabase.co".to_string(),
                "public-anon-key".to_string()
            )
        );
        assert_eq!(config.supabase.url.source, ConfigSource::File);
        assert_eq!(config.data_dir.value, PathBuf::from("/custom/fuel"));
        assert_eq!(config.data_dir.source, ConfigSource::File);
        assert_eq!(config.config_file, Some(config_path));
        assert_eq!(config.session_path(), PathBuf::from("/custom/fuel/session.json"));
    }

    #[test]
    fn test_relative_data_dir_resolves_against_config_dir() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "data_dir: state\n").unwrap();

        let config = Config::load_with_env(Some(config_path), no_env).unwrap();
        assert_eq!(config.data_dir.value, temp_dir.path().join("state"));
    }

    #[test]
    fn test_env_var_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(
            &config_path,
            "supabase:\n  url: https://file.supabase.co\n",
        )
        .unwrap();

        let env: HashMap<&str, &str> = [
            ("FUEL_SUPABASE_URL", "https://env.supabase.co"),
            ("FUEL_DATA_DIR", "/from/env"),
        ]
        .into_iter()
        .collect();

        let config = Config::load_with_env(Some(config_path), |key| {
            env.get(key).map(|v| v.to_string())
        })
        .unwrap();
        assert_eq!(
            config.supabase.url.value.as_deref(),
            Some("https://env.supabase.co")
        );
        assert_eq!(config.supabase.url.source, ConfigSource::Environment);
        assert_eq!(config.data_dir.value, PathBuf::from("/from/env"));
        assert_eq!(config.data_dir.source, ConfigSource::Environment);
    }

    #[test]
    fn test_missing_credentials() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "supabase:\n  url: https://x.supabase.co\n").unwrap();

        let config = Config::load_with_env(Some(config_path), no_env).unwrap();
        let err = config.supabase.credentials().unwrap_err();
        assert!(err.to_string().contains("supabase.anon_key"));
        assert!(err.to_string().contains("FUEL_SUPABASE_ANON_KEY"));
    }

    #[test]
    fn test_invalid_yaml_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = Config::load_with_env(Some(config_path), no_env);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_json_masks_anon_key() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(
            &config_path,
            "supabase:\n  anon_key: eyJhbGciOiJIUzI1NiJ9.secret\n",
        )
        .unwrap();

        let config = Config::load_with_env(Some(config_path), no_env).unwrap();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["supabase"]["anon_key"]["value"], "eyJh...cret");
        assert_eq!(json["supabase"]["anon_key"]["source"], "file");
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("short"), "****");
        assert_eq!(mask("0123456789"), "0123...6789");
    }
}
