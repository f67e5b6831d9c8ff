//! ServerBuilder for fluent API to build HTTP servers

use super::entity_registry::EntityRegistry;
use super::handlers::AppState;
use super::router::build_search_routes;
use crate::config::{SearchConfig, check_plural};
use crate::core::entity::EntityDescriptor;
use crate::core::executor::{QueryBackend, QueryExecutor};
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Builder for creating HTTP servers with search routes for every entity
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_config(SearchConfig::from_yaml_file("config/search.yaml")?)
///     .with_backend(InMemoryStore::new())
///     .build()?;
/// ```
pub struct ServerBuilder {
    backend: Option<Arc<dyn QueryBackend>>,
    config: SearchConfig,
    extra_entities: Vec<EntityDescriptor>,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self {
            backend: None,
            config: SearchConfig::default(),
            extra_entities: Vec::new(),
            custom_routes: Vec::new(),
        }
    }

    /// Use `config` for pagination, server settings and entities
    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Register an entity in addition to those declared in the config
    pub fn with_entity(mut self, descriptor: EntityDescriptor) -> Self {
        self.extra_entities.push(descriptor);
        self
    }

    /// Set the query backend (required)
    pub fn with_backend(mut self, backend: impl QueryBackend + 'static) -> Self {
        self.backend = Some(Arc::new(backend));
        self
    }

    /// Set a query backend that is also used elsewhere (e.g. for seeding)
    pub fn with_shared_backend(mut self, backend: Arc<dyn QueryBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Add custom routes to the server
    ///
    /// Use this for endpoints outside the search surface, such as
    /// authentication or write operations.
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Validate the configuration and assemble the shared handler state
    pub fn build_state(&self) -> Result<AppState> {
        self.config.validate_config()?;
        for entity in &self.extra_entities {
            check_plural(entity.plural())?;
        }

        let backend = self
            .backend
            .clone()
            .ok_or_else(|| anyhow::anyhow!("QueryBackend is required. Call .with_backend()"))?;

        let registry: EntityRegistry = self
            .config
            .descriptors()
            .into_iter()
            .chain(self.extra_entities.iter().cloned())
            .collect();

        Ok(AppState {
            executor: QueryExecutor::from_shared(backend),
            registry: Arc::new(registry),
            pagination: self.config.pagination,
            base_url: self.config.server.base_url.clone(),
        })
    }

    /// Build the final REST router
    ///
    /// This generates the search, list and health routes, then merges the
    /// custom routes and applies tracing and CORS layers.
    pub fn build(self) -> Result<Router> {
        let state = self.build_state()?;

        tracing::debug!(
            backend = state.executor.backend().name(),
            entities = ?state.registry.plurals(),
            "Building search router"
        );

        let mut app = build_search_routes(state);
        for custom_router in self.custom_routes {
            app = app.merge(custom_router);
        }

        Ok(app.layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        ))
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to the provided address
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    ///
    /// # Example
    ///
    /// ```ignore
    /// ServerBuilder::new()
    ///     .with_config(config)
    ///     .with_backend(store)
    ///     .serve("127.0.0.1:3000").await?;
    /// ```
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
