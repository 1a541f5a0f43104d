//! Newline-delimited JSON transport
//!
//! One envelope per line in each direction:
//!
//! ```text
//! → {"id": 1, "method": "Deserialize", "params": {"source": "IyBIaQo="}}
//! ← {"id": 1, "result": {"notebook": {...}}}
//! ← {"id": 2, "error": {"code": "unimplemented", "message": "..."}}
//! ```
//!
//! Requests on one connection are answered in order.

use crate::http::SharedService;
use mdnb_serializer::{dispatch, Method, ServiceError};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

/// Request envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Caller-chosen correlation id, echoed back
    #[serde(default)]
    pub id: serde_json::Value,
    /// `Serialize` or `Deserialize`
    pub method: String,
    /// Request message
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Id of the request
    pub id: serde_json::Value,
    /// Response message on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Failure details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

/// Error payload of a [`Response`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorObject {
    /// Stable error code
    pub code: String,
    /// Human readable message
    pub message: String,
}

impl Response {
    fn failure(id: serde_json::Value, code: &str, message: String) -> Self {
        Self {
            id,
            result: None,
            error: Some(ErrorObject {
                code: code.to_string(),
                message,
            }),
        }
    }
}

/// Answer one raw line
pub fn handle_line(service: &SharedService, raw: &str) -> Response {
    let request: Request = match serde_json::from_str(raw) {
        Ok(request) => request,
        Err(e) => {
            return Response::failure(
                serde_json::Value::Null,
                "invalid_request",
                format!("invalid envelope: {e}"),
            );
        }
    };

    let outcome = request
        .method
        .parse::<Method>()
        .and_then(|method| dispatch(service.as_ref(), method, request.params));

    match outcome {
        Ok(result) => Response {
            id: request.id,
            result: Some(result),
            error: None,
        },
        Err(err) => {
            tracing::debug!("{} failed: {err}", request.method);
            Response {
                id: request.id,
                result: None,
                error: Some(err.into()),
            }
        }
    }
}

/// Serve envelopes on one connection until EOF
///
/// # Errors
/// Propagates IO errors of the underlying stream.
pub async fn handle_connection<S>(service: SharedService, stream: S) -> std::io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let response = handle_line(&service, trimmed);
        let mut bytes = serde_json::to_vec(&response).map_err(std::io::Error::other)?;
        bytes.push(b'\n');
        writer.write_all(&bytes).await?;
        writer.flush().await?;
    }

    Ok(())
}

/// Accept connections until `shutdown` resolves
///
/// # Errors
/// Returns the error of reading the listener's local address.
pub async fn serve<F>(
    listener: TcpListener,
    service: SharedService,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()>,
{
    tracing::info!("parser service (stream) listening on {}", listener.local_addr()?);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    tracing::debug!("connection from {peer}");
                    let service = Arc::clone(&service);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(service, stream).await {
                            tracing::warn!("connection error: {e}");
                        }
                    });
                }
                Err(e) => tracing::error!("accept error: {e}"),
            },
        }
    }

    tracing::info!("parser service (stream) stopped");
    Ok(())
}

impl From<ServiceError> for ErrorObject {
    fn from(err: ServiceError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}
