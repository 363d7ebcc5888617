//! qrgen runtime configuration handling

use crate::error::{Error, Result};
use crate::params::{ParamValue, Parameter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default endpoint of the generator API
pub const DEFAULT_API_URI: &str = "https://api.qr-code-generator.com/v1/create?";

/// Top-level configuration structure persisted to disk or environment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QrGenConfig {
    /// Operational settings for the client
    pub settings: Settings,
    /// Logging configuration
    pub logging: LoggingOptions,
    /// Parameter overrides applied on top of the API defaults
    pub parameters: BTreeMap<String, ParamValue>,
}

impl QrGenConfig {
    /// Load configuration from an explicit path or fall back to discovered defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = explicit_path {
            Self::from_file(path)?
        } else if let Some(path) = Self::discover_file()? {
            tracing::info!("Using configuration file: {}", path.display());
            Self::from_file(&path)?
        } else {
            tracing::debug!("No qrgen.toml / qrgen.yaml / qrgen.ini found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Attempt to locate a configuration file in common locations.
    fn discover_file() -> Result<Option<PathBuf>> {
        let cwd =
            env::current_dir().map_err(|e| Error::Config(format!("Failed to read cwd: {e}")))?;
        let xdg_config = env::var_os("XDG_CONFIG_HOME").map(PathBuf::from);
        Ok(Self::discover_in(&cwd, xdg_config.as_deref()))
    }

    /// First config file found in `cwd`, then under `xdg_config/qrgen`.
    fn discover_in(cwd: &Path, xdg_config: Option<&Path>) -> Option<PathBuf> {
        for candidate in ["qrgen.toml", "qrgen.yaml", "qrgen.yml", "qrgen.ini"] {
            let path = cwd.join(candidate);
            if path.exists() {
                return Some(path);
            }
        }

        if let Some(xdg_config) = xdg_config {
            let base = xdg_config.join("qrgen");
            for candidate in ["config.toml", "config.yaml"] {
                let path = base.join(candidate);
                if path.exists() {
                    return Some(path);
                }
            }
        }

        None
    }

    /// Read configuration from a concrete file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;

        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_ascii_lowercase()
            .as_str()
        {
            "toml" => toml::from_str(&contents).map_err(|e| {
                Error::Config(format!("Failed to parse TOML {}: {e}", path.display()))
            }),
            "yaml" | "yml" => serde_yaml::from_str(&contents).map_err(|e| {
                Error::Config(format!("Failed to parse YAML {}: {e}", path.display()))
            }),
            "ini" => Ok(Self {
                settings: Settings::from_ini(&contents)?,
                ..Self::default()
            }),
            other => Err(Error::Config(format!(
                "Unsupported config format '{}', expected toml/yaml/ini",
                other
            ))),
        }
    }

    /// Apply environment variable overrides after file/default loading.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|var| env::var(var).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        self.settings.apply_overrides(&lookup);
        self.logging.apply_overrides(&lookup);
    }
}

/// Operational settings, distinct from the rendering parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Base endpoint the query string is appended to
    pub api_uri: String,
    /// Overwrite existing non-empty output files
    pub force_overwrite: bool,
    /// Parameters that must hold a value before a request is sent
    pub required_parameters: Vec<Parameter>,
    /// Output root directory
    pub out_folder: String,
    /// Sub-folder of `out_folder` receiving generated files
    pub output_folder: String,
    /// Log every step at debug level
    pub verbose: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_uri: DEFAULT_API_URI.to_string(),
            force_overwrite: false,
            required_parameters: vec![Parameter::AccessToken, Parameter::QrCodeText],
            out_folder: "out".to_string(),
            output_folder: "output".to_string(),
            verbose: false,
        }
    }
}

impl Settings {
    /// Directory generated files are written to
    pub fn output_dir(&self) -> PathBuf {
        Path::new(&self.out_folder).join(&self.output_folder)
    }

    /// Set a setting by its key name (`API_URI`, `force_overwrite`, ...).
    ///
    /// Keys are case-insensitive. `true`/`false` are coerced to booleans.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "api_uri" => self.api_uri = value.to_string(),
            "force_overwrite" => self.force_overwrite = parse_bool(key, value)?,
            "required_parameters" => {
                self.required_parameters = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::parse::<Parameter>)
                    .collect::<Result<Vec<_>>>()?;
            }
            "out_folder" => self.out_folder = value.to_string(),
            "output_folder" => self.output_folder = value.to_string(),
            "verbose" => self.verbose = parse_bool(key, value)?,
            _ => return Err(Error::UnknownSetting(key.to_string())),
        }
        Ok(())
    }

    /// Parse `KEY=value` lines into settings layered over the defaults.
    pub fn from_ini(contents: &str) -> Result<Self> {
        let mut settings = Self::default();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if line.starts_with('[') && line.ends_with(']') {
                continue;
            }
            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| Error::Config(format!("Malformed ini line '{line}'")))?;
            settings.set(key, value)?;
        }
        Ok(settings)
    }

    /// Apply `QRGEN_*` overrides; values that fail to parse are logged and skipped.
    pub(crate) fn apply_overrides(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        for (var, key) in [
            ("QRGEN_API_URI", "api_uri"),
            ("QRGEN_FORCE_OVERWRITE", "force_overwrite"),
            ("QRGEN_REQUIRED_PARAMETERS", "required_parameters"),
            ("QRGEN_OUT_FOLDER", "out_folder"),
            ("QRGEN_OUTPUT_FOLDER", "output_folder"),
            ("QRGEN_VERBOSE", "verbose"),
        ] {
            if let Some(value) = lookup(var) {
                if let Err(err) = self.set(key, &value) {
                    tracing::warn!("Ignoring {var}: {err}");
                }
            }
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "on" => Ok(true),
        "false" | "0" | "off" => Ok(false),
        _ => Err(Error::Config(format!(
            "Expected a boolean for '{key}', got '{value}'"
        ))),
    }
}

/// Structured logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Default log level (overridable via `QRGEN_LOG_LEVEL`)
    pub level: String,
    /// Optional log file path for teeing structured logs
    pub file: Option<PathBuf>,
    /// Force ANSI colors in terminal logging
    pub color: bool,
    /// Optional log rotation strategy applied to `file`
    pub rotation: Option<LogRotation>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
            color: true,
            rotation: None,
        }
    }
}

impl LoggingOptions {
    pub(crate) fn apply_overrides(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        if let Some(level) = lookup("QRGEN_LOG_LEVEL") {
            self.level = level;
        }
        if let Some(file) = lookup("QRGEN_LOG_FILE") {
            self.file = Some(PathBuf::from(file));
        }
        if let Some(color) = lookup("QRGEN_LOG_COLOR") {
            match color.to_ascii_lowercase().as_str() {
                "0" | "false" | "off" => self.color = false,
                "1" | "true" | "on" => self.color = true,
                _ => {}
            }
        }
        if let Some(rotation) = lookup("QRGEN_LOG_ROTATION") {
            if let Some(parsed) = LogRotation::parse(&rotation) {
                self.rotation = Some(parsed);
            }
        }
    }
}

/// Supported log rotation policies for file sinks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    /// Rotate log files once per hour
    Hourly,
    /// Rotate log files once per day
    Daily,
}

impl LogRotation {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "hourly" => Some(Self::Hourly),
            "daily" => Some(Self::Daily),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.api_uri, DEFAULT_API_URI);
        assert!(!settings.force_overwrite);
        assert_eq!(
            settings.required_parameters,
            vec![Parameter::AccessToken, Parameter::QrCodeText]
        );
        assert_eq!(settings.output_dir(), Path::new("out").join("output"));
    }

    #[test]
    fn test_set_rejects_unknown_key() {
        let mut settings = Settings::default();
        let err = settings.set("OUTPUT_COLOR", "red").unwrap_err();
        assert!(matches!(err, Error::UnknownSetting(ref k) if k == "OUTPUT_COLOR"));
    }

    #[test]
    fn test_ini_coerces_booleans() {
        let ini = "[settings]\nFORCE_OVERWRITE=True\nOUT_FOLDER=build\n; comment\nVERBOSE=false\n";
        let settings = Settings::from_ini(ini).unwrap();
        assert!(settings.force_overwrite);
        assert!(!settings.verbose);
        assert_eq!(settings.out_folder, "build");
        assert_eq!(settings.output_folder, "output");
    }

    #[test]
    fn test_ini_value_may_contain_equals() {
        let settings = Settings::from_ini("API_URI=https://example.test/create?x=1").unwrap();
        assert_eq!(settings.api_uri, "https://example.test/create?x=1");
    }

    #[test]
    fn test_ini_rejects_bad_boolean_and_unknown_parameter() {
        assert!(Settings::from_ini("VERBOSE=maybe").is_err());
        let err = Settings::from_ini("REQUIRED_PARAMETERS=qr_code_text,bogus").unwrap_err();
        assert!(matches!(err, Error::UnknownParameter(ref k) if k == "bogus"));
    }

    #[test]
    fn test_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qrgen.toml");
        fs::write(
            &path,
            r##"
[settings]
out_folder = "codes"
required_parameters = ["qr_code_text"]

[logging]
level = "debug"

[parameters]
image_width = 300
foreground_color = "#FF0000"
"##,
        )
        .unwrap();

        let config = QrGenConfig::from_file(&path).unwrap();
        assert_eq!(config.settings.out_folder, "codes");
        assert_eq!(config.settings.required_parameters, vec![Parameter::QrCodeText]);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.parameters["image_width"], ParamValue::Int(300));
        assert_eq!(config.parameters["foreground_color"], ParamValue::from("#FF0000"));
    }

    #[test]
    fn test_yaml_rejects_unknown_setting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qrgen.yaml");
        fs::write(&path, "settings:\n  bogus: 1\n").unwrap();
        assert!(matches!(
            QrGenConfig::from_file(&path),
            Err(Error::Config(_))
        ));
    }

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn test_env_overrides_apply() {
        let mut config = QrGenConfig::default();
        config.apply_overrides(lookup_from(&[
            ("QRGEN_API_URI", "http://localhost:8080/create?"),
            ("QRGEN_FORCE_OVERWRITE", "true"),
            ("QRGEN_REQUIRED_PARAMETERS", "qr_code_text, image_format"),
            ("QRGEN_OUT_FOLDER", "build"),
            ("QRGEN_OUTPUT_FOLDER", "codes"),
            ("QRGEN_VERBOSE", "1"),
            ("QRGEN_LOG_LEVEL", "trace"),
            ("QRGEN_LOG_FILE", "logs/qrgen.log"),
            ("QRGEN_LOG_COLOR", "off"),
            ("QRGEN_LOG_ROTATION", "Daily"),
        ]));

        let settings = &config.settings;
        assert_eq!(settings.api_uri, "http://localhost:8080/create?");
        assert!(settings.force_overwrite);
        assert_eq!(
            settings.required_parameters,
            vec![Parameter::QrCodeText, Parameter::ImageFormat]
        );
        assert_eq!(settings.output_dir(), Path::new("build").join("codes"));
        assert!(settings.verbose);

        assert_eq!(config.logging.level, "trace");
        assert_eq!(config.logging.file, Some(PathBuf::from("logs/qrgen.log")));
        assert!(!config.logging.color);
        assert_eq!(config.logging.rotation, Some(LogRotation::Daily));
    }

    #[test]
    fn test_bad_env_values_are_ignored() {
        let mut config = QrGenConfig::default();
        config.apply_overrides(lookup_from(&[
            ("QRGEN_FORCE_OVERWRITE", "sometimes"),
            ("QRGEN_REQUIRED_PARAMETERS", "qr_code_text,bogus"),
            ("QRGEN_VERBOSE", "yes please"),
            ("QRGEN_OUT_FOLDER", "kept"),
            ("QRGEN_LOG_COLOR", "purple"),
            ("QRGEN_LOG_ROTATION", "weekly"),
        ]));

        let defaults = Settings::default();
        assert_eq!(config.settings.force_overwrite, defaults.force_overwrite);
        assert_eq!(config.settings.required_parameters, defaults.required_parameters);
        assert_eq!(config.settings.verbose, defaults.verbose);
        assert_eq!(config.settings.out_folder, "kept");
        assert!(config.logging.color);
        assert_eq!(config.logging.rotation, None);
    }

    #[test]
    fn test_discovery_prefers_cwd_then_xdg() {
        let cwd = tempfile::tempdir().unwrap();
        let xdg = tempfile::tempdir().unwrap();
        assert_eq!(QrGenConfig::discover_in(cwd.path(), Some(xdg.path())), None);

        let xdg_file = xdg.path().join("qrgen").join("config.yaml");
        fs::create_dir_all(xdg_file.parent().unwrap()).unwrap();
        fs::write(&xdg_file, "settings:\n  out_folder: from-xdg\n").unwrap();
        assert_eq!(
            QrGenConfig::discover_in(cwd.path(), Some(xdg.path())),
            Some(xdg_file.clone())
        );
        assert_eq!(QrGenConfig::discover_in(cwd.path(), None), None);

        let ini = cwd.path().join("qrgen.ini");
        fs::write(&ini, "OUT_FOLDER=from-cwd\n").unwrap();
        assert_eq!(
            QrGenConfig::discover_in(cwd.path(), Some(xdg.path())),
            Some(ini.clone())
        );
        assert_eq!(QrGenConfig::from_file(&ini).unwrap().settings.out_folder, "from-cwd");
    }

    #[test]
    fn test_load_explicit_path_keeps_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.yaml");
        fs::write(&path, "parameters:\n  qr_code_text: from-file\n  image_width: 250\n").unwrap();

        let config = QrGenConfig::load(Some(&path)).unwrap();
        assert_eq!(config.parameters["qr_code_text"], ParamValue::from("from-file"));
        assert_eq!(config.parameters["image_width"], ParamValue::Int(250));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qrgen.json");
        fs::write(&path, "{}").unwrap();
        assert!(QrGenConfig::from_file(&path).is_err());
    }
}
