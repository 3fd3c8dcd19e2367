//! Preview server for a built style guide.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::Router;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

/// Configuration for the preview server.
#[derive(Debug, Clone)]
pub struct PreviewConfig {
    /// Built guide directory
    pub root: PathBuf,

    /// Port to listen on
    pub port: u16,

    /// Host to bind to
    pub host: String,

    /// Open browser on start
    pub open: bool,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("guide"),
            port: 4000,
            host: "127.0.0.1".to_string(),
            open: true,
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Directory not found: {0}. Run 'specimen build' first.")]
    MissingRoot(PathBuf),

    #[error("Invalid address {0}")]
    InvalidAddress(String),

    #[error("Failed to bind to {0}: {1}")]
    Bind(SocketAddr, String),

    #[error("Server error: {0}")]
    Serve(String),
}

/// Static preview server.
pub struct PreviewServer {
    config: PreviewConfig,
}

impl PreviewServer {
    pub fn new(config: PreviewConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    /// Bind and serve until the process is stopped.
    pub async fn start(self) -> Result<(), ServerError> {
        if !self.config.root.is_dir() {
            return Err(ServerError::MissingRoot(self.config.root.clone()));
        }

        let raw = format!("{}:{}", self.config.host, self.config.port);
        let addr: SocketAddr = raw.parse().map_err(|_| ServerError::InvalidAddress(raw))?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(addr, e.to_string()))?;

        tracing::info!("Serving {} at http://{}", self.config.root.display(), addr);

        if self.config.open {
            let url = format!("http://{}", addr);
            if let Err(e) = open::that(&url) {
                tracing::warn!("Failed to open browser: {}", e);
            }
        }

        axum::serve(listener, router(&self.config.root))
            .await
            .map_err(|e| ServerError::Serve(e.to_string()))
    }
}

/// Router serving the files below `root`, with `index.html` for directories.
pub fn router(root: &Path) -> Router {
    Router::new().fallback_service(ServeDir::new(root).append_index_html_on_directories(true))
}
