use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{LoopError, LoopResult};

/// Render loop settings.
///
/// Every field has a default, so a partial TOML file is fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderLoopConfig {
    #[serde(default = "default_thread_name")]
    pub thread_name: String,

    /// `false` runs the loop on the thread calling `start()`.
    #[serde(default = "default_use_thread")]
    pub use_thread: bool,

    #[serde(default = "default_stop_on_last_close")]
    pub stop_on_last_close: bool,

    /// How often `wait_for_stopped()` pumps the surfaces' native events.
    #[serde(default = "default_stop_poll_interval_ms")]
    pub stop_poll_interval_ms: u64,

    /// Delay before a pass declined by `acquire()` is retried.
    #[serde(default = "default_acquire_retry_interval_ms")]
    pub acquire_retry_interval_ms: u64,

    /// Submit once right after every resize, before the next draw.
    #[serde(default = "default_submit_after_resize")]
    pub submit_after_resize: bool,

    /// -1: vsync, 0: manual `update()`, >0: frames per second. Hint only.
    #[serde(default)]
    pub frame_rate: f32,
}

fn default_thread_name() -> String {
    "surfloop.render".to_string()
}
fn default_use_thread() -> bool {
    true
}
fn default_stop_on_last_close() -> bool {
    true
}
fn default_stop_poll_interval_ms() -> u64 {
    10
}
fn default_acquire_retry_interval_ms() -> u64 {
    2
}
fn default_submit_after_resize() -> bool {
    // first post-resize frame must go through the compositor before drawing again
    cfg!(target_os = "android")
}

impl Default for RenderLoopConfig {
    fn default() -> Self {
        Self {
            thread_name: default_thread_name(),
            use_thread: default_use_thread(),
            stop_on_last_close: default_stop_on_last_close(),
            stop_poll_interval_ms: default_stop_poll_interval_ms(),
            acquire_retry_interval_ms: default_acquire_retry_interval_ms(),
            submit_after_resize: default_submit_after_resize(),
            frame_rate: 0.0,
        }
    }
}

impl RenderLoopConfig {
    pub fn from_toml_str(s: &str) -> LoopResult<Self> {
        toml::from_str(s).map_err(|e| LoopError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> LoopResult<String> {
        toml::to_string(self).map_err(|e| LoopError::Config(e.to_string()))
    }

    /// Missing file means defaults; a file that does not parse is an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> LoopResult<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(s) => Self::from_toml_str(&s)
                .map_err(|e| LoopError::Config(format!("parse {}: {}", path.display(), e))),
            Err(_) => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = RenderLoopConfig::from_toml_str("stop_on_last_close = false\nframe_rate = 60.0\n")
            .unwrap();
        assert!(!cfg.stop_on_last_close);
        assert_eq!(cfg.frame_rate, 60.0);
        assert_eq!(cfg.thread_name, "surfloop.render");
        assert_eq!(cfg.stop_poll_interval_ms, 10);
        assert_eq!(cfg.acquire_retry_interval_ms, 2);
        assert!(cfg.use_thread);
    }

    #[test]
    fn serialized_config_parses_back() {
        let cfg = RenderLoopConfig {
            thread_name: "gl".into(),
            use_thread: false,
            ..RenderLoopConfig::default()
        };
        let s = cfg.to_toml_string().unwrap();
        assert_eq!(RenderLoopConfig::from_toml_str(&s).unwrap(), cfg);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = RenderLoopConfig::load_or_default("/nonexistent/surfloop.toml").unwrap();
        assert_eq!(cfg, RenderLoopConfig::default());
    }

    #[test]
    fn garbage_is_a_config_error() {
        let err = RenderLoopConfig::from_toml_str("use_thread = \"maybe\"").unwrap_err();
        assert!(matches!(err, LoopError::Config(_)));
    }
}
