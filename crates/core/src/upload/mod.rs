use std::future::Future;

use serde::Serialize;

use crate::{encode::to_data_url, CaptureError, Result};

/// Acknowledgment returned by the capture server once a frame is on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack(pub String);

impl Ack {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// JSON body of a frame upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveFrameRequest {
    pub frame_data: String,
    pub frame_number: u64,
}

/// Transmits one encoded frame and resolves once the outcome is known.
///
/// Callers keep at most one `send` outstanding; implementations hold no queue
/// and never retry.
pub trait UploadClient {
    fn send(&self, frame_number: u64, payload: &[u8]) -> impl Future<Output = Result<Ack>> + Send;
}

/// Posts frames to a capture server over HTTP.
#[derive(Debug, Clone)]
pub struct HttpUploadClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpUploadClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl UploadClient for HttpUploadClient {
    async fn send(&self, frame_number: u64, payload: &[u8]) -> Result<Ack> {
        let body = SaveFrameRequest {
            frame_data: to_data_url(payload),
            frame_number,
        };

        let response = self.client.post(&self.endpoint).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(CaptureError::Protocol {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(Ack(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_camel_case_field_names() {
        let request = SaveFrameRequest {
            frame_data: "data:image/png;base64,AAAA".to_string(),
            frame_number: 5,
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["frameNumber"], 5);
        assert_eq!(json["frameData"], "data:image/png;base64,AAAA");
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HttpUploadClient::new(format!("http://{addr}/saveFrame"));
        let err = client.send(0, &[1, 2, 3]).await.unwrap_err();

        assert!(matches!(err, CaptureError::Transport(_)));
    }
}
