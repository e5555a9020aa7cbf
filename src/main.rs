use anyhow::Result;
use axum::Router;
use lambda_runtime::{LambdaEvent, service_fn};
use serde_json::Value;
use std::{fs, io::ErrorKind, path::Path, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;

use config::{AppConfig, Backend};
use services::{
    local_store::LocalObjectStore, s3_store::S3ObjectStore, storage::ObjectStore,
    upload_service::UploadContext,
};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config ---
    let cfg = AppConfig::from_env_and_args()?;

    tracing::info!("Starting upload-function with config: {:?}", cfg);
    if cfg.bucket.is_none() {
        tracing::warn!(
            "{} is not set; every upload will fail until it is configured",
            config::BUCKET_ENV
        );
    }

    // --- Initialize storage collaborator once, shared by all invocations ---
    let store: Arc<dyn ObjectStore> = match cfg.backend {
        Backend::S3 => Arc::new(S3ObjectStore::from_env().await),
        Backend::Local => {
            if !Path::new(&cfg.storage_dir).exists() {
                fs::create_dir_all(&cfg.storage_dir)?;
                tracing::info!("Created storage directory at {}", cfg.storage_dir);
            }
            Arc::new(LocalObjectStore::new(&cfg.storage_dir))
        }
    };

    let ctx = UploadContext::new(store, cfg.bucket.clone(), cfg.decode_policy);

    if cfg.serve {
        serve(&cfg, ctx).await
    } else {
        tracing::info!("Running under the Lambda runtime");
        lambda_runtime::run(service_fn(|event: LambdaEvent<Value>| {
            handlers::lambda_handler::function_handler(&ctx, event)
        }))
        .await
        .map_err(|err| anyhow::anyhow!(err))
    }
}

/// Serve the upload route and health probes over HTTP.
async fn serve(cfg: &AppConfig, ctx: UploadContext) -> Result<()> {
    let app: Router = routes::routes::routes().with_state(ctx);

    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
