use std::path::Path;
use std::time::Duration;

use crate::foundation::core::{Alignment, Color, Extent, FitType};
use crate::foundation::error::{BridgeError, BridgeResult};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
/// Renderer-wide configuration.
///
/// Every field has a default, so a JSON document only needs the keys it overrides.
pub struct BridgeConfig {
    /// Advance state machines and dispatch events in the caller instead of the
    /// submission context.
    pub run_simulation_inline: bool,
    /// Untouched render targets older than this are recreated on the next submit.
    pub stale_target_window_ms: u64,
    /// Clear color used by new render targets.
    pub clear_color: Color,
    /// Fit applied when initialization does not name one.
    pub default_fit: FitType,
    /// Alignment applied when initialization does not name one.
    pub default_alignment: Alignment,
    /// Size of render targets created without explicit dimensions.
    pub default_target_size: Extent,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            run_simulation_inline: true,
            stale_target_window_ms: 20_000,
            clear_color: Color::TRANSPARENT,
            default_fit: FitType::Contain,
            default_alignment: Alignment::Center,
            default_target_size: Extent::new(500, 500),
        }
    }
}

impl BridgeConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(s: &str) -> BridgeResult<Self> {
        let cfg: Self = serde_json::from_str(s).map_err(|e| BridgeError::serde(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> BridgeResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| BridgeError::config(format!("read {}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    /// Reject values the renderer cannot operate with.
    pub fn validate(&self) -> BridgeResult<()> {
        if self.stale_target_window_ms == 0 {
            return Err(BridgeError::config("stale_target_window_ms must be > 0"));
        }
        if self.default_target_size.is_empty() {
            return Err(BridgeError::config(
                "default_target_size width/height must be > 0",
            ));
        }
        Ok(())
    }

    /// Staleness window as a [`Duration`].
    pub fn stale_target_window(&self) -> Duration {
        Duration::from_millis(self.stale_target_window_ms)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
