//! Surface configuration
//!
//! Configuration is stored as YAML in the user's config directory.
//! Default location: ~/.config/mixdeck/surface.yaml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Screen size and strip count
    pub layout: LayoutConfig,
    /// Touch/pointer gesture thresholds
    pub gesture: GestureConfig,
    /// Rotary and arrow step sizes
    pub nudge: NudgeConfig,
    /// Role of each rotary encoder, by encoder index
    pub encoders: Vec<EncoderRole>,
    /// Peak meter polling
    pub meters: MeterConfig,
}

/// Layout section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Number of chain strips shown besides the master strip.
    /// 0 selects a count from the screen width.
    pub visible_strips: usize,
    pub screen_width: u32,
    pub screen_height: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            visible_strips: 0,
            screen_width: 480,
            screen_height: 320,
        }
    }
}

impl LayoutConfig {
    /// Effective strip count (excluding master)
    pub fn strip_count(&self) -> usize {
        if self.visible_strips > 0 {
            return self.visible_strips;
        }
        match self.screen_width {
            0..=400 => 6,
            401..=600 => 8,
            601..=800 => 10,
            801..=1024 => 12,
            1025..=1280 => 14,
            _ => 16,
        }
    }

    /// Width of one strip in pixels (master strip included in the division)
    pub fn strip_width(&self) -> f32 {
        (self.screen_width as f32 - 6.0) / (self.strip_count() + 1) as f32
    }
}

/// Gesture section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Motion ignored this long after a fader press
    pub drag_debounce_ms: u64,
    /// Displacement needed before a fader drag locks to an axis
    pub axis_lock_px: f32,
    /// Strip label press at least this long counts as a long press
    pub label_hold_ms: u64,
    /// Pad press at least this long opens the pattern editor
    pub pad_hold_ms: u64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            drag_debounce_ms: 100,
            axis_lock_px: 2.0,
            label_hold_ms: 400,
            pad_hold_ms: 1400,
        }
    }
}

impl GestureConfig {
    pub fn drag_debounce(&self) -> Duration {
        Duration::from_millis(self.drag_debounce_ms)
    }

    pub fn label_hold(&self) -> Duration {
        Duration::from_millis(self.label_hold_ms)
    }

    pub fn pad_hold(&self) -> Duration {
        Duration::from_millis(self.pad_hold_ms)
    }
}

/// Nudge section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NudgeConfig {
    pub level_step: f32,
    pub balance_step: f32,
}

impl Default for NudgeConfig {
    fn default() -> Self {
        Self {
            level_step: 0.01,
            balance_step: 0.02,
        }
    }
}

/// What a rotary encoder adjusts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderRole {
    /// Level of the highlighted strip
    ActiveLevel,
    /// Balance of the highlighted strip
    ActiveBalance,
    /// Level of the master strip
    MasterLevel,
    /// Select (or, in move mode, move) the active chain
    SelectChain,
}

/// Encoder layout of the four-knob control panel
pub const DEFAULT_ENCODERS: [EncoderRole; 4] = [
    EncoderRole::ActiveLevel,
    EncoderRole::ActiveBalance,
    EncoderRole::MasterLevel,
    EncoderRole::SelectChain,
];

/// Meter section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterConfig {
    pub enabled: bool,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl SurfaceConfig {
    /// Role of encoder `index`, falling back to the default panel layout
    pub fn encoder_role(&self, index: usize) -> Option<EncoderRole> {
        if self.encoders.is_empty() {
            DEFAULT_ENCODERS.get(index).copied()
        } else {
            self.encoders.get(index).copied()
        }
    }
}

/// Get the default config file path
///
/// Returns: ~/.config/mixdeck/surface.yaml
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("mixdeck")
        .join("surface.yaml")
}

/// Load configuration from a YAML file
///
/// If the file doesn't exist, returns default config.
/// If the file exists but is invalid, logs a warning and returns default config.
pub fn load_config(path: &Path) -> SurfaceConfig {
    log::info!("load_config: Loading from {:?}", path);

    if !path.exists() {
        log::info!("load_config: Config file doesn't exist, using defaults");
        return SurfaceConfig::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<SurfaceConfig>(&contents) {
            Ok(config) => {
                log::info!(
                    "load_config: Loaded config ({} strips, {}x{})",
                    config.layout.strip_count(),
                    config.layout.screen_width,
                    config.layout.screen_height
                );
                config
            }
            Err(e) => {
                log::warn!("load_config: Failed to parse config: {}", e);
                SurfaceConfig::default()
            }
        },
        Err(e) => {
            log::warn!("load_config: Failed to read config file: {}", e);
            SurfaceConfig::default()
        }
    }
}

/// Save configuration to a YAML file
///
/// Creates parent directories if they don't exist.
pub fn save_config(config: &SurfaceConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config")?;
    std::fs::write(path, yaml).with_context(|| format!("Failed to write config: {:?}", path))?;

    log::info!("save_config: Saved to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_strip_count() {
        let mut layout = LayoutConfig::default();
        assert_eq!(layout.strip_count(), 8);
        layout.screen_width = 400;
        assert_eq!(layout.strip_count(), 6);
        layout.screen_width = 1920;
        assert_eq!(layout.strip_count(), 16);
        layout.visible_strips = 4;
        assert_eq!(layout.strip_count(), 4);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "layout:\n  visible_strips: 6\nnudge:\n  level_step: 0.05\n";
        let config: SurfaceConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.layout.strip_count(), 6);
        assert_eq!(config.layout.screen_width, 480);
        assert_eq!(config.nudge.level_step, 0.05);
        assert_eq!(config.nudge.balance_step, 0.02);
        assert_eq!(config.gesture.drag_debounce(), Duration::from_millis(100));
    }

    #[test]
    fn test_encoder_roles() {
        let mut config = SurfaceConfig::default();
        assert_eq!(config.encoder_role(3), Some(EncoderRole::SelectChain));
        assert_eq!(config.encoder_role(4), None);

        config.encoders = vec![EncoderRole::MasterLevel];
        assert_eq!(config.encoder_role(0), Some(EncoderRole::MasterLevel));
        assert_eq!(config.encoder_role(1), None);
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("mixdeck-config-{}", std::process::id()));
        let path = dir.join("nested").join("surface.yaml");
        let mut config = SurfaceConfig::default();
        config.layout.visible_strips = 10;
        config.encoders = vec![EncoderRole::SelectChain, EncoderRole::ActiveLevel];

        save_config(&config, &path).unwrap();
        assert_eq!(load_config(&path), config);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let dir = std::env::temp_dir().join(format!("mixdeck-bad-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("surface.yaml");
        std::fs::write(&path, "layout: [not, a, map]").unwrap();
        assert_eq!(load_config(&path), SurfaceConfig::default());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
