use crate::pharmacokinetics::Metabolism;
use crate::store::{BioState, BioStore};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CircaConfig {
    pub clock: ClockConfig,
    pub biology: BiologyConfig,
}

impl CircaConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: CircaConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if file doesn't exist, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    /// Apply environment variable overrides on top of file-based config.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("CIRCA_TICK_MS") {
            if let Ok(n) = v.parse() {
                self.clock.tick_interval_ms = n;
            }
        }
        if let Ok(v) = std::env::var("CIRCA_SPEED") {
            if let Ok(n) = v.parse() {
                self.clock.speed = n;
            }
        }
        if let Ok(v) = std::env::var("CIRCA_METABOLISM") {
            match v.parse() {
                Ok(m) => self.biology.metabolism = m,
                Err(e) => tracing::warn!("Ignoring CIRCA_METABOLISM: {}", e),
            }
        }
        if let Ok(v) = std::env::var("CIRCA_WAKE_HOUR") {
            if let Ok(n) = v.parse() {
                self.biology.wake_hour = n;
            }
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Wall-clock period between ticks
    pub tick_interval_ms: u64,
    /// Time dilation factor: 1, 60 or 3600
    pub speed: u32,
    /// Start running as soon as the engine is up
    pub autostart: bool,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            speed: 1,
            autostart: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BiologyConfig {
    pub metabolism: Metabolism,
    pub wake_hour: u8,
    pub heart_rate_variability_ms: f64,
    pub cognitive_load_pct: f64,
}

impl Default for BiologyConfig {
    fn default() -> Self {
        let state = BioState::default();
        Self {
            metabolism: Metabolism::Normal,
            wake_hour: state.wake_hour,
            heart_rate_variability_ms: state.heart_rate_variability_ms,
            cognitive_load_pct: state.cognitive_load_pct,
        }
    }
}

impl BiologyConfig {
    /// Fresh store seeded with these defaults
    pub fn build_store(&self) -> BioStore {
        let state = BioState {
            wake_hour: self.wake_hour,
            heart_rate_variability_ms: self.heart_rate_variability_ms,
            cognitive_load_pct: self.cognitive_load_pct,
            ..BioState::default()
        };
        BioStore::new(state, self.metabolism)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = CircaConfig::default();
        assert_eq!(cfg.clock.tick_interval_ms, 1000);
        assert_eq!(cfg.clock.speed, 1);
        assert!(cfg.clock.autostart);
        assert_eq!(cfg.biology.metabolism, Metabolism::Normal);
        assert_eq!(cfg.biology.wake_hour, 7);
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
[clock]
speed = 60
"#;
        let cfg: CircaConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.clock.speed, 60);
        // Defaults for unspecified fields
        assert_eq!(cfg.clock.tick_interval_ms, 1000);
        assert_eq!(cfg.biology.heart_rate_variability_ms, 65.0);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[clock]
tick_interval_ms = 250
speed = 3600
autostart = false

[biology]
metabolism = "slow"
wake_hour = 6
heart_rate_variability_ms = 48.0
cognitive_load_pct = 70.0
"#;
        let cfg: CircaConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.clock.tick_interval_ms, 250);
        assert_eq!(cfg.clock.speed, 3600);
        assert!(!cfg.clock.autostart);
        assert_eq!(cfg.biology.metabolism, Metabolism::Slow);

        let store = cfg.biology.build_store();
        assert_eq!(store.metabolism(), Metabolism::Slow);
        assert_eq!(store.state().wake_hour, 6);
        assert_eq!(store.state().heart_rate_variability_ms, 48.0);
        assert_eq!(store.state().cognitive_load_pct, 70.0);
        assert_eq!(store.state().event_log.len(), 1);
    }

    #[test]
    fn test_unknown_metabolism_rejected() {
        let toml_str = r#"
[biology]
metabolism = "turbo"
"#;
        assert!(toml::from_str::<CircaConfig>(toml_str).is_err());
    }

    #[test]
    fn test_env_overrides_and_defaults() {
        // Part 1: env overrides
        std::env::set_var("CIRCA_SPEED", "60");
        std::env::set_var("CIRCA_METABOLISM", "fast");

        let mut cfg = CircaConfig::default();
        cfg.apply_env_overrides();

        assert_eq!(cfg.clock.speed, 60);
        assert_eq!(cfg.biology.metabolism, Metabolism::Fast);

        // Clean up env vars before testing defaults
        std::env::remove_var("CIRCA_SPEED");
        std::env::remove_var("CIRCA_METABOLISM");

        // Part 2: nonexistent path returns defaults (no env interference)
        let cfg = CircaConfig::load_or_default("/nonexistent/path.toml");
        assert_eq!(cfg.clock.speed, 1);
        assert_eq!(cfg.biology.metabolism, Metabolism::Normal);
    }
}
