//! Capture server: a single `POST /saveFrame` route that validates an upload,
//! decodes its data URL and hands the bytes to the [`FrameStore`].

use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{config::ServerConfig, store::FrameStore, CaptureError, Result};

pub const SAVE_FRAME_ROUTE: &str = "/saveFrame";

const MISSING_FIELDS: &str = "Missing frameData or frameNumber";
const SAVED: &str = "Frame saved successfully";
const SAVE_FAILED: &str = "Error saving frame";

/// A validated upload ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub number: u64,
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

/// Builds the capture router around `store`.
pub fn router(store: FrameStore, body_limit_bytes: usize) -> Router {
    Router::new()
        .route(SAVE_FRAME_ROUTE, post(save_frame))
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(Arc::new(store))
}

async fn save_frame(State(store): State<Arc<FrameStore>>, body: Bytes) -> Response {
    match store_upload(store, &body).await {
        Ok(()) => (StatusCode::OK, SAVED).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn store_upload(store: Arc<FrameStore>, body: &[u8]) -> Result<()> {
    let frame = parse_request(body)?;
    let number = frame.number;

    tokio::task::spawn_blocking(move || {
        store.write(frame.number, frame.extension, &frame.bytes)
    })
    .await
    .map_err(|err| CaptureError::msg(format!("frame writer panicked: {err}")))??;

    tracing::info!(frame = number, "frame saved");
    Ok(())
}

/// Validates a JSON upload body and decodes its payload.
pub fn parse_request(body: &[u8]) -> Result<DecodedFrame> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|err| CaptureError::validation(format!("malformed JSON body: {err}")))?;

    let frame_data = value
        .get("frameData")
        .and_then(Value::as_str)
        .filter(|data| !data.is_empty());
    let frame_number = value.get("frameNumber").filter(|number| !number.is_null());

    let (Some(frame_data), Some(frame_number)) = (frame_data, frame_number) else {
        return Err(CaptureError::validation(MISSING_FIELDS));
    };

    let number = frame_number
        .as_u64()
        .ok_or_else(|| CaptureError::validation("frameNumber must be a non-negative integer"))?;
    let (extension, bytes) = decode_data_url(frame_data)?;

    Ok(DecodedFrame {
        number,
        extension,
        bytes,
    })
}

/// Strips a `data:<mime>;base64,` prefix when present and decodes the rest as
/// base64. The MIME type picks the file extension, defaulting to `png`.
pub fn decode_data_url(data: &str) -> Result<(&'static str, Vec<u8>)> {
    let (mime, encoded) = match data
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
    {
        Some((mime, encoded)) => (Some(mime), encoded),
        None => (None, data),
    };

    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|err| CaptureError::validation(format!("frameData is not valid base64: {err}")))?;
    if bytes.is_empty() {
        return Err(CaptureError::validation("frameData decodes to an empty payload"));
    }

    Ok((mime.map_or("png", extension_for), bytes))
}

fn extension_for(mime: &str) -> &'static str {
    match mime.to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        _ => "png",
    }
}

impl IntoResponse for CaptureError {
    fn into_response(self) -> Response {
        match self {
            CaptureError::Validation(message) => {
                tracing::warn!(%message, "rejected frame upload");
                (StatusCode::BAD_REQUEST, message).into_response()
            }
            err => {
                tracing::error!(error = %err, "failed to save frame");
                (StatusCode::INTERNAL_SERVER_ERROR, SAVE_FAILED).into_response()
            }
        }
    }
}

/// Bound capture server, ready to accept uploads.
#[derive(Debug)]
pub struct CaptureServer {
    listener: TcpListener,
    router: Router,
}

impl CaptureServer {
    /// Binds the configured address and prepares the router.
    pub async fn bind(config: &ServerConfig) -> Result<Self> {
        let listener = TcpListener::bind(config.bind_address()).await?;
        let store = FrameStore::new(&config.root);
        Ok(Self {
            listener,
            router: router(store, config.body_limit_bytes),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Endpoint URL an upload client should post to.
    pub fn endpoint(&self) -> Result<String> {
        Ok(format!("http://{}{SAVE_FRAME_ROUTE}", self.local_addr()?))
    }

    /// Serves until the process is terminated.
    pub async fn serve(self) -> Result<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Serves until `shutdown` resolves.
    pub async fn serve_with_shutdown(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        tracing::info!(addr = %self.local_addr()?, "capture server running");
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}
