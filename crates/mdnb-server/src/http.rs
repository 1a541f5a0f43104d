//! HTTP/JSON transport
//!
//! Unary calls at `POST /runme.parser.v1.ParserService/{Method}` with the
//! request message as the JSON body. Failures are answered with
//! `{"code": ..., "message": ...}`.

use mdnb_serializer::{dispatch, Method, ParserService, ServiceError, SERVICE_NAME};
use serde::Serialize;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

/// Shared service handle
pub type SharedService = Arc<dyn ParserService>;

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

/// Routes of the parser service
pub fn routes(
    service: SharedService,
    body_limit: u64,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let service = warp::any().map(move || Arc::clone(&service));

    warp::post()
        .and(warp::path(SERVICE_NAME))
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::body::content_length_limit(body_limit))
        .and(warp::body::json::<serde_json::Value>())
        .and(service)
        .and_then(handle)
}

async fn handle(
    method: String,
    params: serde_json::Value,
    service: SharedService,
) -> Result<warp::reply::Response, Infallible> {
    let outcome = method
        .parse::<Method>()
        .and_then(|method| dispatch(service.as_ref(), method, params));

    Ok(match outcome {
        Ok(value) => warp::reply::json(&value).into_response(),
        Err(err) => {
            tracing::debug!("{method} failed: {err}");
            let status = match &err {
                ServiceError::UnknownMethod(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::BAD_REQUEST,
            };
            let body = ErrorBody {
                code: err.code(),
                message: err.to_string(),
            };
            warp::reply::with_status(warp::reply::json(&body), status).into_response()
        }
    })
}

/// Serve until `shutdown` resolves
///
/// # Errors
/// Returns the bind error if `address` cannot be bound.
pub async fn serve<F>(
    address: SocketAddr,
    service: SharedService,
    body_limit: u64,
    shutdown: F,
) -> Result<(), warp::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (bound, server) = warp::serve(routes(service, body_limit))
        .try_bind_with_graceful_shutdown(address, shutdown)?;
    tracing::info!("parser service (http) listening on {bound}");
    server.await;
    tracing::info!("parser service (http) stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdnb_serializer::SerializationLayer;
    use serde_json::json;

    fn service() -> SharedService {
        Arc::new(SerializationLayer::new())
    }

    #[tokio::test]
    async fn deserialize_call() {
        let response = warp::test::request()
            .method("POST")
            .path("/runme.parser.v1.ParserService/Deserialize")
            .json(&json!({ "source": "IyBIaQo=" }))
            .reply(&routes(service(), 1024))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["notebook"]["cells"][0]["value"], json!("# Hi"));
    }

    #[tokio::test]
    async fn unknown_method_is_not_found() {
        let response = warp::test::request()
            .method("POST")
            .path("/runme.parser.v1.ParserService/Execute")
            .json(&json!({}))
            .reply(&routes(service(), 1024))
            .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["code"], json!("unimplemented"));
    }

    #[tokio::test]
    async fn parse_error_is_bad_request() {
        // "```sh\nls\n"
        let response = warp::test::request()
            .method("POST")
            .path("/runme.parser.v1.ParserService/Deserialize")
            .json(&json!({ "source": "YGBgc2gKbHMK" }))
            .reply(&routes(service(), 1024))
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert!(body["message"].as_str().unwrap().contains("byte 0"));
    }

    #[tokio::test]
    async fn get_is_rejected() {
        let response = warp::test::request()
            .method("GET")
            .path("/runme.parser.v1.ParserService/Deserialize")
            .reply(&routes(service(), 1024))
            .await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let response = warp::test::request()
            .method("POST")
            .path("/runme.parser.v1.ParserService/Deserialize")
            .json(&json!({ "source": "A".repeat(64) }))
            .reply(&routes(service(), 16))
            .await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
