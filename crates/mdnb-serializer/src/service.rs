//! Parser service contract
//!
//! [`ParserService`] is the transport-independent request/response pair.
//! Transports decode a method name and JSON params, call [`dispatch`], and
//! encode the JSON result; one request always yields one response.

use crate::error::SerializerError;
use crate::layer::SerializationLayer;
use crate::wire::{
    DeserializeRequest, DeserializeResponse, SerializeRequest, SerializeResponse, WireNotebook,
};
use mdnb_document::Document;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Fully qualified service name, used as the HTTP path prefix
pub const SERVICE_NAME: &str = "runme.parser.v1.ParserService";

/// Serialize/Deserialize contract
///
/// Implementations must be callable concurrently; each call owns its
/// document value.
pub trait ParserService: Send + Sync {
    /// Parse markdown bytes into a notebook
    ///
    /// # Errors
    /// `SerializerError::Parse` with the byte offset of the failure.
    fn deserialize(
        &self,
        request: DeserializeRequest,
    ) -> Result<DeserializeResponse, SerializerError>;

    /// Flatten a notebook into markdown bytes
    ///
    /// # Errors
    /// `SerializerError::Serialize` if the notebook cannot be written.
    fn serialize(&self, request: SerializeRequest) -> Result<SerializeResponse, SerializerError>;
}

impl ParserService for SerializationLayer {
    fn deserialize(
        &self,
        request: DeserializeRequest,
    ) -> Result<DeserializeResponse, SerializerError> {
        let document = self.parse_document(&request.source)?;
        Ok(DeserializeResponse {
            notebook: WireNotebook::from(&document),
        })
    }

    fn serialize(&self, request: SerializeRequest) -> Result<SerializeResponse, SerializerError> {
        let document = Document::from(request.notebook);
        let result = self.render_document(&document)?;
        Ok(SerializeResponse { result })
    }
}

/// Service method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `Deserialize`
    Deserialize,
    /// `Serialize`
    Serialize,
}

impl Method {
    /// Method name as it appears on the wire
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Deserialize => "Deserialize",
            Self::Serialize => "Serialize",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ServiceError;

    /// Accepts `Serialize`, `Deserialize` and their fully qualified forms
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s
            .strip_prefix(SERVICE_NAME)
            .map_or(s, |rest| rest.trim_start_matches(|c: char| c == '/' || c == '.'));
        match name {
            "Deserialize" => Ok(Self::Deserialize),
            "Serialize" => Ok(Self::Serialize),
            _ => Err(ServiceError::UnknownMethod(s.to_string())),
        }
    }
}

/// Errors surfaced by [`dispatch`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// Method name not part of the service
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    /// Params did not decode into the request message
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// The call itself failed
    #[error(transparent)]
    Failed(#[from] SerializerError),
}

impl ServiceError {
    /// Stable error code for transports
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnknownMethod(_) => "unimplemented",
            Self::InvalidParams(_) | Self::Failed(_) => "invalid_argument",
        }
    }
}

/// Decode params, call the service, encode the response
///
/// # Errors
/// - `ServiceError::InvalidParams` if `params` does not match the request
/// - `ServiceError::Failed` if the call fails
pub fn dispatch(
    service: &dyn ParserService,
    method: Method,
    params: serde_json::Value,
) -> Result<serde_json::Value, ServiceError> {
    tracing::debug!("dispatching {method}");
    match method {
        Method::Deserialize => encode(&service.deserialize(decode(params)?)?),
        Method::Serialize => encode(&service.serialize(decode(params)?)?),
    }
}

fn decode<T: DeserializeOwned>(params: serde_json::Value) -> Result<T, ServiceError> {
    serde_json::from_value(params).map_err(|e| ServiceError::InvalidParams(e.to_string()))
}

fn encode<T: Serialize>(response: &T) -> Result<serde_json::Value, ServiceError> {
    serde_json::to_value(response).map_err(|e| ServiceError::InvalidParams(e.to_string()))
}
