use crate::api::{self, Mode};
use crate::commands::Out;
use crate::{server, ProxyConfig, Result};
use anyhow::Context;
use std::net::SocketAddr;

/// Runs the proxy server until Ctrl-C.
///
/// # Arguments
/// - `addr` - Where to listen.
/// - `mode` - Whether to forward to the backend or to serve from memory.
/// - `event_limit` - The most events a day may hold in the in-memory backend.
///
/// # Errors
/// - Returns an error if a configured endpoint is not a valid URL.
/// - Returns an error if `addr` cannot be bound.
pub async fn serve(addr: SocketAddr, mode: Mode, event_limit: usize) -> Result<Out<()>> {
    let config = ProxyConfig::from_env().context("The proxy configuration is invalid")?;
    let upstream = api::upstream(config, mode, event_limit)?;
    server::serve(addr, upstream).await?;
    Ok("The proxy server has stopped".into())
}
