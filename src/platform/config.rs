// PacketSleuth - platform/config.rs
//
// Platform config directory resolution and config.toml loading with
// validation. Configuration problems never abort the program: each one
// becomes a warning and the affected value falls back to its default.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::app::pipeline::PipelineConfig;
use crate::core::export::OutputFormat;
use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for PacketSleuth configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/packetsleuth/ or %APPDATA%\PacketSleuth\config\)
    pub config_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined,
    /// returning a warning for the caller to log once logging is up.
    pub fn resolve() -> (Self, Option<String>) {
        match ProjectDirs::from("", "", constants::APP_ID) {
            Some(proj_dirs) => (
                Self {
                    config_dir: proj_dirs.config_dir().to_path_buf(),
                },
                None,
            ),
            None => (
                Self {
                    config_dir: PathBuf::from("."),
                },
                Some(
                    "Could not determine platform directories, using current directory"
                        .to_string(),
                ),
            ),
        }
    }

    /// Default location of config.toml.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[logging]` section.
    pub logging: LoggingSection,
    /// `[output]` section.
    pub output: OutputSection,
    /// `[scan]` section.
    pub scan: ScanSection,
    /// `[scratch]` section.
    pub scratch: ScratchSection,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// `[output]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// "text", "json" or "csv".
    pub format: Option<String>,
}

/// `[scan]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ScanSection {
    /// Cap on matched entries held for one run.
    pub max_results: Option<usize>,
}

/// `[scratch]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ScratchSection {
    /// Directory under which run-scoped scratch directories are created.
    /// Empty or absent means the system temp directory.
    pub directory: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Cap on matched entries held for one run.
    pub max_results: usize,

    /// Default output format.
    pub output_format: OutputFormat,

    /// Scratch root override.
    pub scratch_root: Option<PathBuf>,

    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
}

impl AppConfig {
    /// Per-run pipeline settings taken from this configuration.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            scratch_root: self.scratch_root.clone(),
            max_results: self.max_results,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_results: constants::DEFAULT_MAX_RESULTS,
            output_format: OutputFormat::default(),
            scratch_root: None,
            log_level: None,
        }
    }
}

/// Load and validate `config.toml` at `config_path`.
///
/// Returns `AppConfig` with validated values and a list of non-fatal warnings.
/// If the file does not exist, returns defaults with no warnings.
///
/// Called before logging is initialised, so warnings are returned for the
/// caller to report rather than logged here.
pub fn load_config(config_path: &Path) -> (AppConfig, Vec<String>) {
    match read_raw_config(config_path) {
        Ok(Some(raw)) => validate(raw),
        Ok(None) => (AppConfig::default(), Vec::new()),
        Err(e) => (AppConfig::default(), vec![format!("{e}. Using defaults.")]),
    }
}

/// Read and parse the config file. `Ok(None)` when it does not exist.
fn read_raw_config(config_path: &Path) -> Result<Option<RawConfig>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(config_path).map_err(|e| ConfigError::Io {
        path: config_path.to_path_buf(),
        source: e,
    })?;
    toml::from_str(&content)
        .map(Some)
        .map_err(|e| ConfigError::TomlParse {
            path: config_path.to_path_buf(),
            source: e,
        })
}

/// Validate each field, accumulating warnings for every rejected value.
pub fn validate(raw: RawConfig) -> (AppConfig, Vec<String>) {
    let mut config = AppConfig::default();
    let mut warnings: Vec<String> = Vec::new();

    // -- Scan: max_results --
    if let Some(max) = raw.scan.max_results {
        if (constants::MIN_MAX_RESULTS..=constants::ABSOLUTE_MAX_RESULTS).contains(&max) {
            config.max_results = max;
        } else {
            let e = ConfigError::ValueOutOfRange {
                field: "scan.max_results".to_string(),
                value: max.to_string(),
                expected: format!(
                    "{}-{}",
                    constants::MIN_MAX_RESULTS,
                    constants::ABSOLUTE_MAX_RESULTS
                ),
            };
            warnings.push(format!(
                "{e}. Using default ({}).",
                constants::DEFAULT_MAX_RESULTS
            ));
        }
    }

    // -- Output: format --
    if let Some(ref format) = raw.output.format {
        match format.parse::<OutputFormat>() {
            Ok(f) => config.output_format = f,
            Err(reason) => {
                warnings.push(format!("[output] {reason}. Using default (text)."));
            }
        }
    }

    // -- Scratch: directory --
    if let Some(ref dir) = raw.scratch.directory {
        if !dir.is_empty() {
            config.scratch_root = Some(PathBuf::from(dir));
        }
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default (info).",
            ));
        }
    }

    (config, warnings)
}
