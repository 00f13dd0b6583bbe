mod cli;

use crate::cli::{StorageBackendArg, CLI, LOG_FORMAT_ENV};
use anyhow::Context;
use clap::Parser;
use shortlink_core::{LinkSettings, LinkStorage};
use shortlink_proto_schema::v1::link_shortener_server::LinkShortenerServer;
use shortlink_proto_schema::FILE_DESCRIPTOR_SET;
use shortlink_shortener::{LinkService, LinkShortenerGrpcServer};
use shortlink_storage::{InMemoryStorage, PostgresStorage};
use std::net::SocketAddr;
use tonic::transport::Server;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loaded before the subscriber so `.env` can set RUST_LOG.
    let dotenv = dotenvy::dotenv();
    init_tracing();

    match dotenv {
        Ok(path) => debug!(path = %path.display(), "loaded environment file"),
        Err(err) if err.not_found() => debug!("no .env file found"),
        Err(err) => warn!(error = %err, "failed to load .env file"),
    }

    let config = CLI::try_parse()?;
    let settings = config.link_settings();

    info!(
        listen_addr = %config.listen_addr(),
        storage_backend = %config.storage,
        url_domain = %settings.domain,
        short_len = settings.short_len,
        check_urls = settings.check_urls,
        "starting shortener gRPC server"
    );

    match config.storage {
        StorageBackendArg::InMemory => {
            run_server(config.listen_addr(), InMemoryStorage::new(), settings).await?;
        }
        StorageBackendArg::Postgres => {
            let options = config
                .postgres_options()
                .context("postgres credentials are required when storage backend is postgres")?;
            let storage = PostgresStorage::connect_with(options)
                .await
                .context("failed to connect to postgres")?;
            storage
                .migrate()
                .await
                .context("failed to create the urls table")?;
            run_server(config.listen_addr(), storage, settings).await?;
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

async fn run_server<S: LinkStorage>(
    listen_addr: SocketAddr,
    storage: S,
    settings: LinkSettings,
) -> anyhow::Result<()> {
    let service = LinkService::new(storage, settings).context("invalid link settings")?;

    let (health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<LinkShortenerServer<LinkShortenerGrpcServer<LinkService<S>>>>()
        .await;

    let reflection_service = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .register_encoded_file_descriptor_set(tonic_health::pb::FILE_DESCRIPTOR_SET)
        .build_v1()
        .context("failed to build the reflection service")?;

    Server::builder()
        .add_service(health_service)
        .add_service(reflection_service)
        .add_service(LinkShortenerServer::new(LinkShortenerGrpcServer::new(
            service.clone(),
        )))
        .serve_with_shutdown(listen_addr, shutdown_signal())
        .await
        .context("gRPC server failed")?;

    service
        .shutdown()
        .await
        .context("failed to shut down storage")?;
    info!("shortener gRPC server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
