//! Optional config file with defaults for the CLI.
//!
//! The file lives at `$XDG_CONFIG_HOME/ecodms-export/config.toml` (or
//! `$HOME/.config/ecodms-export/config.toml`) and uses a flat TOML subset:
//!
//! ```toml
//! host = "dms.example.lan"
//! port = 8180
//! user = "export"
//! cache_dir = "/var/cache/ecodms"
//! export_json = true   # comments are allowed
//! ```
//!
//! The password is not a config key.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while loading the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but cannot be read.
    #[error("failed to read config file '{path}': {source}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A line is not `key = value`.
    #[error("invalid config syntax on line {line}: expected key = value")]
    Syntax {
        /// 1-based line number.
        line: usize,
    },

    /// The key is not recognized.
    #[error("unknown configuration key '{key}' on line {line}")]
    UnknownKey {
        /// The key as written.
        key: String,
        /// 1-based line number.
        line: usize,
    },

    /// The value does not parse or is out of range.
    #[error("invalid `{key}` value on line {line}: {reason}")]
    InvalidValue {
        /// The key.
        key: &'static str,
        /// 1-based line number.
        line: usize,
        /// What is wrong with the value.
        reason: String,
    },
}

/// Values read from the config file. Unset keys are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// ecoDMS hostname.
    pub host: Option<String>,
    /// ecoDMS API port.
    pub port: Option<u16>,
    /// ecoDMS user name.
    pub user: Option<String>,
    /// Archive id.
    pub archive_id: Option<u32>,
    /// Cache directory.
    pub cache_dir: Option<PathBuf>,
    /// Name template.
    pub name_template: Option<String>,
    /// Write JSON sidecars.
    pub export_json: Option<bool>,
    /// Debug logging.
    pub debug: Option<bool>,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// HTTP read timeout in seconds.
    pub read_timeout_secs: Option<u64>,
}

/// Loaded config metadata.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists.
    pub config: Option<FileConfig>,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/ecodms-export/config.toml`
/// 2. `$HOME/.config/ecodms-export/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("ecodms-export")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("ecodms-export")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from the default path if present.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file exists but cannot be read or parsed.
pub fn load_default_file_config() -> Result<LoadedConfig, ConfigError> {
    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(p) if p.exists() => Some(load_file_config(p)?),
        _ => None,
    };
    Ok(LoadedConfig { path, config })
}

/// Loads and parses a config file.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read or parsed.
pub fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config_str(&raw)
}

/// Parses config file content.
///
/// # Errors
///
/// Returns [`ConfigError`] for bad syntax, unknown keys, or invalid values.
pub fn parse_config_str(raw: &str) -> Result<FileConfig, ConfigError> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_no = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            return Err(ConfigError::Syntax { line: line_no });
        };
        let value = raw_value.trim();

        match raw_key.trim() {
            "host" => {
                let host = parse_string_literal(value).map_err(invalid("host", line_no))?;
                if host.trim().is_empty() {
                    return Err(invalid("host", line_no)("must not be empty".to_string()));
                }
                cfg.host = Some(host);
            }
            "port" => {
                let port = parse_integer(value, 1, u64::from(u16::MAX))
                    .map_err(invalid("port", line_no))?;
                cfg.port = u16::try_from(port).ok();
            }
            "user" => {
                cfg.user = Some(parse_string_literal(value).map_err(invalid("user", line_no))?);
            }
            "archive_id" => {
                let id = parse_integer(value, 0, u64::from(u32::MAX))
                    .map_err(invalid("archive_id", line_no))?;
                cfg.archive_id = u32::try_from(id).ok();
            }
            "cache_dir" => {
                let dir = parse_string_literal(value).map_err(invalid("cache_dir", line_no))?;
                cfg.cache_dir = Some(PathBuf::from(dir));
            }
            "name_template" => {
                cfg.name_template = Some(
                    parse_string_literal(value).map_err(invalid("name_template", line_no))?,
                );
            }
            "export_json" => {
                cfg.export_json =
                    Some(parse_boolean(value).map_err(invalid("export_json", line_no))?);
            }
            "debug" => {
                cfg.debug = Some(parse_boolean(value).map_err(invalid("debug", line_no))?);
            }
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs = Some(
                    parse_integer(value, 1, 3600)
                        .map_err(invalid("connect_timeout_secs", line_no))?,
                );
            }
            "read_timeout_secs" => {
                cfg.read_timeout_secs = Some(
                    parse_integer(value, 1, 3600).map_err(invalid("read_timeout_secs", line_no))?,
                );
            }
            unknown => {
                return Err(ConfigError::UnknownKey {
                    key: unknown.to_string(),
                    line: line_no,
                });
            }
        }
    }
    Ok(cfg)
}

fn invalid(key: &'static str, line: usize) -> impl Fn(String) -> ConfigError {
    move |reason| ConfigError::InvalidValue { key, line, reason }
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String, String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        return Err("expected double-quoted string".to_string());
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer(raw_value: &str, min: u64, max: u64) -> Result<u64, String> {
    let value = raw_value
        .trim()
        .parse::<u64>()
        .map_err(|_| "expected non-negative integer".to_string())?;
    if !(min..=max).contains(&value) {
        return Err(format!("{value} outside expected range {min}..={max}"));
    }
    Ok(value)
}

fn parse_boolean(raw_value: &str) -> Result<bool, String> {
    match raw_value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err("expected true or false".to_string()),
    }
}
