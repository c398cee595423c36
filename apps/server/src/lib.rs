//! # Forum Server
//!
//! Serves the forum routes behind the error-handling middleware from `forum-errors`.
//!
//! ## Example
//! ```no_run
//! use forum_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Server::builder()
//!         .port(4567)
//!         .relative_path("/forum")
//!         .build()?
//!         .run()
//!         .await
//! }
//! ```

mod router;

pub use router::app;

use anyhow::{Context, Result};
use axum::Router;
use axum_server::Handle;
use forum_domain::config::ForumConfig;
use forum_errors::{ErrorHandling, HookRegistry};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// A fluent builder for configuring and initializing the [`Server`].
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct ServerBuilder {
    cfg: ForumConfig,
    hooks: HookRegistry,
}

impl ServerBuilder {
    /// Set up the server's configuration.
    pub fn config(mut self, cfg: ForumConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.cfg.server.port = port;
        self
    }

    /// Mount prefix of the forum routes; normalized like the config value.
    pub fn relative_path(mut self, path: &str) -> Self {
        let site = self.cfg.site.clone().with_relative_path(path);
        self.cfg.site = site;
        self
    }

    /// Plugin listeners for `filter:error.handle`.
    pub fn hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = hooks;
        self
    }

    /// Consumes the builder and wires the error handling services.
    ///
    /// # Errors
    /// Returns an error if the site section cannot configure error handling.
    pub fn build(self) -> Result<Server> {
        let errors = ErrorHandling::builder()
            .relative_path(self.cfg.site.relative_path.as_str())
            .site_title(self.cfg.site.title.as_str())
            .hooks(self.hooks)
            .build()
            .context("Failed to configure error handling")?;

        info!(
            relative_path = errors.relative_path(),
            hooks = errors.hooks().len(),
            "Error handling ready"
        );

        Ok(Server { cfg: self.cfg, errors })
    }
}

/// A fully initialized server instance ready to run.
#[must_use = "call .run().await to start the server"]
#[derive(Debug)]
pub struct Server {
    cfg: ForumConfig,
    errors: ErrorHandling,
}

impl Server {
    /// Returns a new [`ServerBuilder`] to configure the server.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    #[must_use]
    pub const fn config(&self) -> &ForumConfig {
        &self.cfg
    }

    #[must_use]
    pub const fn errors(&self) -> &ErrorHandling {
        &self.errors
    }

    /// The complete application router, as [`Self::run`] serves it.
    #[must_use]
    pub fn router(&self) -> Router {
        router::app(&self.errors)
    }

    /// Starts the server and runs until the shutdown signal is received.
    ///
    /// # Errors
    /// Returns an error if the server fails to bind to the configured address.
    pub async fn run(self) -> Result<()> {
        let address = SocketAddr::new(self.cfg.server.address, self.cfg.server.port);
        let app = self.router();

        let handle = Handle::<SocketAddr>::new();
        let shutdown_handle = handle.clone();

        tokio::spawn(async move {
            if let Err(e) = shutdown_signal().await {
                error!("Error while waiting for shutdown signal: {e}");
                return;
            }
            info!("Shutdown signal received, starting graceful shutdown...");
            shutdown_handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
        });

        info!(
            relative_path = self.errors.relative_path(),
            "Starting HTTP server on http://{address}"
        );

        axum_server::bind(address)
            .handle(handle)
            .serve(app.into_make_service())
            .await
            .context("HTTP server failed")?;

        info!("Server shutdown complete");
        Ok(())
    }
}

/// Waits for Ctrl+C or SIGTERM.
async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("Failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        res = ctrl_c => res?,
        res = terminate => res?,
    }

    Ok(())
}
