use crate::{
    config::{Config, CorsConfig},
    forwarder::InferenceForwarder,
    lifecycle::ModelLifecycleProxy,
    rekognition::RekognitionService,
    routes::api_routes,
    telemetry::Metrics,
};
use axum::Router;
use axum_otel_metrics::HttpMetricsLayerBuilder;
use std::sync::Arc;
use tokio::{net::TcpListener, sync::broadcast::Receiver, task::JoinHandle};
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};

pub struct SharedState<R: RekognitionService> {
    pub lifecycle: Arc<ModelLifecycleProxy<R>>,
    pub forwarder: Arc<InferenceForwarder<R>>,
    pub metrics: Arc<Metrics>,
}

impl<R: RekognitionService> Clone for SharedState<R> {
    fn clone(&self) -> Self {
        Self {
            lifecycle: self.lifecycle.clone(),
            forwarder: self.forwarder.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

/// One frontend origin, any method and header, credentials allowed.
pub fn cors_layer(config: &CorsConfig) -> anyhow::Result<CorsLayer> {
    config.validate().map_err(anyhow::Error::msg)?;
    let origin = config.get_origin().map_err(anyhow::Error::msg)?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

pub fn build_router<R: RekognitionService>(
    state: SharedState<R>,
    cors: &CorsConfig,
) -> anyhow::Result<Router> {
    let metrics_layer = HttpMetricsLayerBuilder::new().build();

    let router = Router::new()
        .merge(api_routes::<R>())
        .with_state(state)
        .layer(metrics_layer)
        .layer(cors_layer(cors)?);

    Ok(router)
}

pub struct HttpServer {
    router: Router,
    listener: TcpListener,
}

impl HttpServer {
    pub async fn new<R: RekognitionService>(
        state: SharedState<R>,
        config: &Config,
    ) -> anyhow::Result<Self> {
        let addr = config.server.get_address();
        let router = build_router(state, &config.cors)?;
        let listener = TcpListener::bind(addr).await?;

        Ok(Self { router, listener })
    }

    pub async fn run(
        self,
        mut shutdown_rx: Receiver<()>,
    ) -> anyhow::Result<JoinHandle<anyhow::Result<()>>> {
        tracing::info!("Starting app on {}", self.listener.local_addr()?);

        let listener = self.listener;
        let router = self.router;
        let server_handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    shutdown_rx.recv().await.ok();
                })
                .await?;
            tracing::info!("Server stopped");
            Ok::<(), anyhow::Error>(())
        });

        Ok(server_handle)
    }
}
