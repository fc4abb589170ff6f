//! `~/.matchbot/config.toml` – robot tuning and simulator settings.

use std::fs;
use std::path::{Path, PathBuf};

use matchbot_runtime::{CorrectionConfig, RoutineId};
use matchbot_types::DriveTuning;
use serde::{Deserialize, Serialize};

/// Settings for runs against the simulated robot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Constant reading of the simulated distance sensor.
    pub range_mm: i32,
    /// Simulated time each drivetrain motion takes to settle.
    pub motion_time_ms: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            range_mm: 600,
            motion_time_ms: 0,
        }
    }
}

/// Persisted configuration.  Every field has a default, so a partial file
/// (or none at all) is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Routine the selector starts on.
    pub default_routine: RoutineId,
    /// Drivetrain PID, exit and slew constants.
    pub tuning: DriveTuning,
    pub correction: CorrectionConfig,
    pub sim: SimConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_routine: RoutineId::LeftAwp,
            tuning: DriveTuning::default(),
            correction: CorrectionConfig::default(),
            sim: SimConfig::default(),
        }
    }
}

/// Return the path to `~/.matchbot/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".matchbot").join("config.toml")
}

/// Load from `path`.  `Ok(None)` when the file does not exist.
pub fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    Ok(Some(cfg))
}

/// Apply `MATCHBOT_*` environment overrides.  Unparseable values are ignored.
///
/// | Variable | Config field |
/// |---|---|
/// | `MATCHBOT_ROUTINE` | `default_routine` |
/// | `MATCHBOT_SIM_RANGE_MM` | `sim.range_mm` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("MATCHBOT_ROUTINE")
        && let Ok(id) = v.parse::<RoutineId>()
    {
        cfg.default_routine = id;
    }
    if let Ok(v) = std::env::var("MATCHBOT_SIM_RANGE_MM")
        && let Ok(mm) = v.trim().parse::<i32>()
    {
        cfg.sim.range_mm = mm;
    }
}

/// Save to `path`, creating the parent directory if necessary.
pub fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}
