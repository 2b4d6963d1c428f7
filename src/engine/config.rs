// Application configuration loaded from TOML.
//
// Every field defaults to the tuned constant, so a config file only needs
// the keys it wants to change. Lookup order for the file:
//   1. first command-line argument
//   2. $HAND_PARTICLES_CONFIG
//   3. ./hand_particles.toml
//   4. built-in defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_ENV_VAR: &str = "HAND_PARTICLES_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "hand_particles.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config validation error: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// ============================================================================
// SECTIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Hand Particles".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    pub count: usize,
    /// Template the cloud flies to at startup.
    pub initial_template: String,
    /// World-space size of a scale-1.0 particle billboard.
    pub point_size: f32,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            count: 15_000,
            initial_template: "sphere".to_string(),
            point_size: 0.06,
        }
    }
}

/// Thresholds used when turning a landmark set into a hand signal.
/// Distances are in normalized image units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandConfig {
    /// Thumb tip to index tip distance below which the hand is pinching.
    pub pinch_threshold: f32,
    /// Per-frame palm x movement that counts as a swipe.
    pub swipe_threshold: f32,
    /// Wrist to middle-MCP distance that maps to proximity 0.
    pub proximity_offset: f32,
    pub proximity_gain: f32,
}

impl Default for HandConfig {
    fn default() -> Self {
        Self {
            pinch_threshold: 0.05,
            swipe_threshold: 0.03,
            proximity_offset: 0.1,
            proximity_gain: 3.0,
        }
    }
}

/// Per-call behavior constants. None of these are scaled by frame time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Fraction of the remaining distance closed per update.
    pub ease: f32,
    pub glow_smoothing: f32,
    pub wave_phase_step: f32,
    pub wave_duration_secs: f32,
    pub wave_amplitude: f32,
    pub wave_frequency: f32,
    pub expand_factor: f32,
    /// Template shrink applied around the attraction point.
    pub attract_scale: f32,
    pub repel_radius: f32,
    pub repel_strength: f32,
    /// Red channel drop per update while a particle is "hot".
    pub heat_decay: f32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            ease: 0.05,
            glow_smoothing: 0.1,
            wave_phase_step: 0.1,
            wave_duration_secs: 1.5,
            wave_amplitude: 2.0,
            wave_frequency: 0.5,
            expand_factor: 2.0,
            attract_scale: 0.1,
            repel_radius: 2.0,
            repel_strength: 0.15,
            heat_decay: 0.02,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Minimum seconds between two template switches triggered by swipes.
    pub swipe_cooldown_secs: f32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self { swipe_cooldown_secs: 0.8 }
    }
}

// ============================================================================
// APP CONFIG
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub particles: ParticleConfig,
    pub hand: HandConfig,
    pub behavior: BehaviorConfig,
    pub driver: DriverConfig,
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Resolve the config path from the CLI argument, the environment and the
    /// working directory, in that order. An explicitly named file that fails to
    /// load is an error; a missing default file is not.
    pub fn load(cli_path: Option<PathBuf>) -> ConfigResult<Self> {
        let explicit = cli_path.or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));
        if let Some(path) = explicit {
            log::info!("Loading config from {}", path.display());
            return Self::from_toml_file(path);
        }

        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            log::info!("Loading config from {}", default_path.display());
            return Self::from_toml_file(default_path);
        }

        log::warn!("No {} found, using built-in defaults", DEFAULT_CONFIG_FILE);
        Ok(Self::default())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.particles.count == 0 {
            return Err(ConfigError::Invalid("particles.count must be > 0".into()));
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid("window size must be non-zero".into()));
        }

        let positive = [
            ("particles.point_size", self.particles.point_size),
            ("hand.pinch_threshold", self.hand.pinch_threshold),
            ("hand.swipe_threshold", self.hand.swipe_threshold),
            ("hand.proximity_gain", self.hand.proximity_gain),
            ("behavior.wave_duration_secs", self.behavior.wave_duration_secs),
            ("behavior.repel_radius", self.behavior.repel_radius),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be > 0, got {value}")));
            }
        }

        let fractions = [
            ("behavior.ease", self.behavior.ease),
            ("behavior.glow_smoothing", self.behavior.glow_smoothing),
        ];
        for (name, value) in fractions {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::Invalid(format!("{name} must be in (0, 1], got {value}")));
            }
        }

        if self.driver.swipe_cooldown_secs < 0.0 {
            return Err(ConfigError::Invalid("driver.swipe_cooldown_secs must be >= 0".into()));
        }
        Ok(())
    }
}
