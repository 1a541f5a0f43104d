//! mdnb Server
//!
//! Serves the parser service contract over two transports and backs the
//! `mdnb` command-line tool.
//!
//! # Transports
//!
//! - **HTTP** ([`http`]): `POST /runme.parser.v1.ParserService/{Serialize,Deserialize}`
//! - **Stream** ([`stream`]): newline-delimited JSON envelopes over TCP
//!
//! Both decode into the same request messages and go through
//! [`mdnb_serializer::dispatch`], so responses are identical.
//!
//! # Example
//!
//! ```rust,ignore
//! use mdnb_server::{run, ServerConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ServerConfig::load(None)?;
//! run(config, async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod commands;
pub mod config;
pub mod http;
pub mod stream;

pub use config::{ConfigError, Protocol, ServerConfig};
pub use http::SharedService;

use anyhow::Context;
use mdnb_serializer::SerializationLayer;
use std::future::Future;
use std::sync::Arc;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Serve the configured transport until `shutdown` resolves
///
/// # Errors
/// Fails if the listen address cannot be bound.
pub async fn run<F>(config: ServerConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    config.validate()?;
    let service: SharedService = Arc::new(SerializationLayer::with_config(config.layer.clone()));

    match config.protocol {
        Protocol::Http => http::serve(config.address, service, config.body_limit, shutdown)
            .await
            .with_context(|| format!("failed to serve http on {}", config.address)),
        Protocol::Stream => {
            let listener = tokio::net::TcpListener::bind(config.address)
                .await
                .with_context(|| format!("failed to bind {}", config.address))?;
            stream::serve(listener, service, shutdown).await?;
            Ok(())
        }
    }
}
