//! Core library for the frame capture pipeline.
//!
//! A run renders a procedurally generated animation one frame at a time over a
//! fixed virtual timeline. Each frame is encoded as PNG, posted to a capture
//! server and written to a flat frame directory; the next frame is only
//! rendered once the previous upload has been acknowledged.

pub mod config;
pub mod driver;
pub mod encode;
pub mod error;
pub mod raster;
pub mod scene;
pub mod server;
pub mod store;
pub mod timeline;
pub mod upload;

pub use config::{AppConfig, RenderConfig, ServerConfig, UploadConfig};
pub use driver::{RenderDriver, RunState, RunSummary};
pub use encode::{encode_png, to_data_url};
pub use error::{CaptureError, Result};
pub use raster::{ComputePass, FixedSurface, RasterBuffer, Surface, Viewport};
pub use scene::{Gradient, Nebula, SceneKind};
pub use server::CaptureServer;
pub use store::FrameStore;
pub use timeline::{Frame, VirtualClock};
pub use upload::{Ack, HttpUploadClient, UploadClient};
