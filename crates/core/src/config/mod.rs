use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{scene::SceneKind, CaptureError, Result};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub render: RenderConfig,
    pub upload: UploadConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Reads a JSON configuration file. Missing sections fall back to their
    /// defaults.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|err| CaptureError::Config(format!("read {}: {err}", path.display())))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|err| CaptureError::Config(err.to_string()))
    }
}

/// Configuration for the render driver and its virtual timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    /// Frames per virtual time-unit; the clock step is `1 / fps`.
    pub fps: u32,
    /// Virtual time at which the run stops.
    pub horizon: f64,
    pub scene: SceneKind,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
            fps: 60,
            horizon: 20.0,
            scene: SceneKind::Nebula,
        }
    }
}

/// Where the upload client sends frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub endpoint: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3000/saveFrame".to_string(),
        }
    }
}

/// Capture server listener and storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Frames are written to `<root>/frames`.
    pub root: PathBuf,
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            root: PathBuf::from("."),
            body_limit_bytes: 50 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = AppConfig::from_json(r#"{ "render": { "width": 32, "horizon": 1.5 } }"#)
            .expect("config should parse");

        assert_eq!(config.render.width, 32);
        assert_eq!(config.render.height, 360);
        assert_eq!(config.render.fps, 60);
        assert_eq!(config.render.horizon, 1.5);
        assert_eq!(config.server.port, 3000);
        assert!(config.upload.endpoint.ends_with("/saveFrame"));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = AppConfig::from_json("{ render: ").unwrap_err();
        assert!(matches!(err, CaptureError::Config(_)));
    }

    #[test]
    fn parses_scene_names() {
        let config = AppConfig::from_json(r#"{ "render": { "scene": "gradient" } }"#).unwrap();
        assert_eq!(config.render.scene, SceneKind::Gradient);
    }
}
