pub mod api;
pub mod args;
pub mod calendar;
pub mod client;
pub mod commands;
mod config;
mod error;
pub mod model;
pub mod server;
pub mod ui;
mod utils;

#[cfg(test)]
mod test;

pub use api::Mode;
pub use config::{ClientConfig, ProxyConfig};
pub use error::Error;
pub use error::Result;
