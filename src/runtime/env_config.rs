//! Environment variable and config file support for [`RuntimeBuilder`](super::builder::RuntimeBuilder).
//!
//! # Configuration Precedence
//!
//! Settings are resolved in this order (highest priority first):
//!
//! 1. **Programmatic**: values set via builder methods (`max_steps(500)`)
//! 2. **Environment variables**: values from `COOP_TIMEOUT_*` env vars
//! 3. **Config file**: values loaded from a TOML file (requires `config-file` feature)
//! 4. **Defaults**: built-in defaults from [`RuntimeConfig::default()`]
//!
//! # Supported Environment Variables
//!
//! | Variable | Type | Maps to |
//! |----------|------|---------|
//! | `COOP_TIMEOUT_CLOCK` | `virtual` \| `wall` | `clock` |
//! | `COOP_TIMEOUT_MAX_STEPS` | `u64`, `0` or `none` disables | `max_steps` |

use crate::runtime::config::{ClockKind, ConfigError, RuntimeConfig};

/// Environment variable name for the clock selection.
pub const ENV_CLOCK: &str = "COOP_TIMEOUT_CLOCK";
/// Environment variable name for the per-run step limit.
pub const ENV_MAX_STEPS: &str = "COOP_TIMEOUT_MAX_STEPS";

/// Apply environment variable overrides to a [`RuntimeConfig`].
///
/// Only variables that are set in the environment are applied.
///
/// # Errors
///
/// [`ConfigError::InvalidEnv`] if a variable is set but unparseable.
pub fn apply_env_overrides(config: &mut RuntimeConfig) -> Result<(), ConfigError> {
    if let Some(val) = read_env(ENV_CLOCK) {
        config.clock = parse_clock(ENV_CLOCK, &val)?;
    }
    if let Some(val) = read_env(ENV_MAX_STEPS) {
        config.max_steps = parse_step_limit(ENV_MAX_STEPS, &val)?;
    }
    Ok(())
}

/// Read an environment variable, returning `None` if unset.
fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn parse_clock(var: &'static str, val: &str) -> Result<ClockKind, ConfigError> {
    val.parse::<ClockKind>().map_err(|e| ConfigError::InvalidEnv {
        var,
        reason: e.to_string(),
    })
}

/// `0` and `none` both mean "no limit".
fn parse_step_limit(var: &'static str, val: &str) -> Result<Option<u64>, ConfigError> {
    let trimmed = val.trim();
    if trimmed.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    match trimmed.parse::<u64>() {
        Ok(0) => Ok(None),
        Ok(n) => Ok(Some(n)),
        Err(e) => Err(ConfigError::InvalidEnv {
            var,
            reason: format!("expected unsigned integer or \"none\", got {val:?} ({e})"),
        }),
    }
}

// =========================================================================
// TOML config file support (feature-gated)
// =========================================================================

/// TOML-deserializable runtime configuration.
///
/// ```toml
/// [runtime]
/// clock = "wall"
/// max_steps = 50000
/// ```
///
/// `max_steps = 0` disables the limit, matching the environment variable.
#[cfg(feature = "config-file")]
#[derive(serde::Deserialize, Default, Debug)]
pub struct RuntimeTomlConfig {
    /// Runtime settings.
    #[serde(default)]
    pub runtime: RuntimeToml,
}

/// `[runtime]` section of the TOML config.
#[cfg(feature = "config-file")]
#[derive(serde::Deserialize, Default, Debug)]
pub struct RuntimeToml {
    /// Clock selection.
    pub clock: Option<ClockKind>,
    /// Step limit; 0 disables.
    pub max_steps: Option<u64>,
}

/// Apply a parsed TOML config to a [`RuntimeConfig`].
///
/// Only fields present in the file override the config.
#[cfg(feature = "config-file")]
pub fn apply_toml_config(config: &mut RuntimeConfig, toml: &RuntimeTomlConfig) {
    if let Some(clock) = toml.runtime.clock {
        config.clock = clock;
    }
    if let Some(steps) = toml.runtime.max_steps {
        config.max_steps = (steps != 0).then_some(steps);
    }
}

/// Parse a TOML string into a [`RuntimeTomlConfig`].
///
/// # Errors
///
/// [`ConfigError::File`] on malformed TOML or wrongly typed fields.
#[cfg(feature = "config-file")]
pub fn parse_toml_str(toml_str: &str) -> Result<RuntimeTomlConfig, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::File(format!("failed to parse TOML: {e}")))
}

/// Read and parse a TOML file into a [`RuntimeTomlConfig`].
///
/// # Errors
///
/// [`ConfigError::File`] if the file cannot be read or parsed.
#[cfg(feature = "config-file")]
pub fn parse_toml_file(path: &std::path::Path) -> Result<RuntimeTomlConfig, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::File(format!("failed to read {}: {e}", path.display())))?;
    parse_toml_str(&content)
}

// =========================================================================
// Tests
// =========================================================================


#[cfg(all(test, feature = "config-file"))]
mod toml_tests {
    use super::*;

    #[test]
    fn parse_toml_full_config() {
        let parsed = parse_toml_str(
            r#"
[runtime]
clock = "wall"
max_steps = 2048
"#,
        )
        .unwrap();
        assert_eq!(parsed.runtime.clock, Some(ClockKind::Wall));
        assert_eq!(parsed.runtime.max_steps, Some(2048));
    }

    #[test]
    fn parse_toml_empty_config() {
        let parsed = parse_toml_str("").unwrap();
        assert!(parsed.runtime.clock.is_none());
        assert!(parsed.runtime.max_steps.is_none());
    }

    #[test]
    fn parse_toml_rejects_bad_input() {
        assert!(parse_toml_str("not valid toml {{{{").is_err());
        assert!(parse_toml_str("[runtime]\nclock = \"sundial\"\n").is_err());
    }

    #[test]
    fn apply_toml_overrides_only_present_fields() {
        let parsed = parse_toml_str("[runtime]\nmax_steps = 0\n").unwrap();
        let mut config = RuntimeConfig::default();
        apply_toml_config(&mut config, &parsed);
        assert_eq!(config.max_steps, None);
        assert_eq!(config.clock, ClockKind::Virtual);
    }

    #[test]
    fn toml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runtime.toml");
        std::fs::write(&path, "[runtime]\nclock = \"virtual\"\nmax_steps = 64\n").unwrap();

        let parsed = parse_toml_file(&path).unwrap();
        let mut config = RuntimeConfig::default();
        apply_toml_config(&mut config, &parsed);
        assert_eq!(config.max_steps, Some(64));
    }

    #[test]
    fn toml_file_not_found() {
        let err = parse_toml_file(std::path::Path::new("/nonexistent/runtime.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
