/*
 * Responsibility
 * - tokio runtime startup
 * - app::run() only (no logic here)
 */
use anyhow::Result;

mod api;
mod app;
mod config;
mod error;
#[cfg(test)]
mod log_capture;
mod middleware;
mod repos;
mod services;
mod state;

#[tokio::main]
async fn main() -> Result<()> {
    app::run().await
}
