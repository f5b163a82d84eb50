//! HTTP server for the Arcjet content store and metadata index.
//!
//! Routes:
//!
//! - `POST /store`: store raw bytes, `201 {"contentHash": hex}`
//! - `GET /store/{contentHash}`: fetch bytes with their `Content-Type`, `404` if absent
//! - `POST /index`: register `{"metadata": entry}`, `400` if derived fields are missing
//! - `POST /find`: JSON query object, returns the matching entries
//!
//! Blobs live under a data directory when one is configured, in memory
//! otherwise. The index is held in memory.

mod error;
mod handlers;


use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use arcjet_store::{FsStore, IndexClient, MemoryIndex, MemoryStore, StoreClient, StoreError};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;

pub use error::ServerError;

/// Default listen address.
pub const DEFAULT_LISTEN: &str = "127.0.0.1:3000";

/// Shared application state for all handlers.
#[derive(Clone)]
pub(crate) struct AppState {
    pub store: Arc<dyn StoreClient>,
    pub index: Arc<dyn IndexClient>,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub listen: SocketAddr,

    /// Blob directory. `None` keeps blobs in memory.
    pub data_dir: Option<PathBuf>,

    /// Largest accepted request body.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 3000)),
            data_dir: None,
            max_body_bytes: 64 * 1024 * 1024,
        }
    }
}

/// The Arcjet HTTP server.
pub struct ArcjetServer {
    router: Router,
}

impl ArcjetServer {
    /// Create a server over the given store and index.
    pub fn new(
        store: Arc<dyn StoreClient>,
        index: Arc<dyn IndexClient>,
        max_body_bytes: usize,
    ) -> Self {
        let state = AppState { store, index };
        Self {
            router: Self::build_router(state, max_body_bytes),
        }
    }

    /// Create a server from configuration, opening the blob directory if set.
    pub async fn open(config: &ServerConfig) -> Result<Self, StoreError> {
        let store: Arc<dyn StoreClient> = match &config.data_dir {
            Some(dir) => {
                tracing::info!(dir = %dir.display(), "using filesystem store");
                Arc::new(FsStore::open(dir.clone()).await?)
            }
            None => {
                tracing::info!("using in-memory store");
                Arc::new(MemoryStore::new())
            }
        };
        Ok(Self::new(
            store,
            Arc::new(MemoryIndex::new()),
            config.max_body_bytes,
        ))
    }

    fn build_router(state: AppState, max_body_bytes: usize) -> Router {
        Router::new()
            .route("/store", post(handlers::put_store))
            .route("/store/{hash}", get(handlers::get_store))
            .route("/index", post(handlers::put_index))
            .route("/find", post(handlers::find))
            .layer(DefaultBodyLimit::max(max_body_bytes))
            .with_state(state)
    }

    /// Return the inner [`Router`] (useful for testing with `tower::ServiceExt`).
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Serve on an already bound listener until `shutdown` completes.
    ///
    /// In-flight requests finish before this returns.
    pub async fn serve_with_shutdown(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> std::io::Result<()> {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(%addr, "arcjet server listening");
        }
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
    }
}
