use crate::aws_service::AwsRekognition;
use crate::config::Config;
use crate::forwarder::{DetectionSettings, InferenceForwarder};
use crate::images::ImageStore;
use crate::lifecycle::ModelLifecycleProxy;
use crate::model::ModelResource;
use crate::server::{HttpServer, SharedState};
use crate::telemetry::Metrics;

use std::{error::Error, sync::Arc};
use tokio::{signal, sync::broadcast};

pub async fn start_app(config: Config) -> Result<(), Box<dyn Error>> {
    let resource = ModelResource::from_config(&config.rekognition)?;
    let rekognition = Arc::new(AwsRekognition::new(&config.rekognition).await);

    let images_dir = config.storage.get_images_dir();
    if !images_dir.is_dir() {
        tracing::warn!(
            "Images directory {} does not exist yet, batch requests will find nothing",
            images_dir.display()
        );
    }

    let metrics = match Metrics::new() {
        Ok(metrics) => Arc::new(metrics),
        Err(e) => {
            tracing::error!("Failed to initialize metrics: {:?}", e);
            return Err(e.into());
        }
    };

    let lifecycle = ModelLifecycleProxy::new(
        rekognition.clone(),
        resource.clone(),
        config.rekognition.min_inference_units,
        metrics.clone(),
    );
    let forwarder = InferenceForwarder::new(
        rekognition,
        ImageStore::from_config(&config.storage),
        resource,
        DetectionSettings {
            max_labels: config.rekognition.max_labels,
            min_confidence: config.rekognition.min_confidence,
        },
        metrics.clone(),
    );

    let state = SharedState {
        lifecycle: Arc::new(lifecycle),
        forwarder: Arc::new(forwarder),
        metrics,
    };
    let server = HttpServer::new(state, &config).await?;

    let (shutdown_tx, _) = broadcast::channel(1);
    let server_handle = server.run(shutdown_tx.subscribe()).await?;

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown.");

    let _ = shutdown_tx.send(());
    match server_handle.await {
        Ok(Err(e)) => tracing::error!("Server exited with error: {:?}", e),
        Err(e) => tracing::error!("Server task panicked: {:?}", e),
        Ok(Ok(())) => {}
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
