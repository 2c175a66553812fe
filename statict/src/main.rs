mod args;
mod config;

use args::Args;
use clap::Parser;
use config::{StatictConfig, StorageBackend};
use eyre::{Context, eyre};
use statict_core::{
    Appender, DedupStorage, IssuerStorage, SctSigner, SubmissionCoordinator, SystemTimeSource, TrustPool,
    ValidationOpts,
};
use statict_server::AppState;
use statict_storage::{FileAppender, FileDedupStore, FileIssuerStore, MemoryAppender, MemoryDedupStore, MemoryIssuerStore};
use std::{sync::Arc, time::Duration};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = Args::parse();
    let config = StatictConfig::load(args.config.as_deref()).wrap_err("failed to load configuration")?;

    init_tracing(&config.log_filter, args.debug);

    let trust_pool = load_trust_pool(&config)?;
    let policy = build_policy(&config)?;
    let signer = load_signer(&config)?;

    let deadline = Duration::from_millis(config.http_deadline_ms);
    let origin = config.origin.clone();
    let mask_internal_errors = config.mask_internal_errors;
    let listen_addr = config.listen_addr.clone();

    match config.storage_backend {
        StorageBackend::Memory => {
            let coordinator = SubmissionCoordinator {
                trust_pool,
                policy,
                signer,
                dedup: MemoryDedupStore::default(),
                issuers: MemoryIssuerStore::default(),
                appender: MemoryAppender::default(),
                time_source: Box::new(SystemTimeSource),
                deadline,
            };
            serve(&origin, &listen_addr, mask_internal_errors, coordinator).await
        }
        StorageBackend::File => {
            let data_dir = config
                .data_dir
                .clone()
                .ok_or_else(|| eyre!("data_dir is required when storage_backend is \"file\""))?;

            let coordinator = SubmissionCoordinator {
                trust_pool,
                policy,
                signer,
                dedup: FileDedupStore::open(data_dir.join("dedup")).wrap_err("failed to open dedup store")?,
                issuers: FileIssuerStore::open(data_dir.join("issuers")).wrap_err("failed to open issuer store")?,
                appender: FileAppender::open(data_dir.join("entries")).wrap_err("failed to open appender")?,
                time_source: Box::new(SystemTimeSource),
                deadline,
            };
            serve(&origin, &listen_addr, mask_internal_errors, coordinator).await
        }
    }
}

fn init_tracing(configured_filter: &str, debug_count: u8) {
    let filter = if debug_count > 0 { "debug" } else { configured_filter };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

fn load_trust_pool(config: &StatictConfig) -> eyre::Result<TrustPool> {
    let pem = std::fs::read_to_string(&config.roots_pem_file)
        .wrap_err_with(|| format!("failed to read roots PEM file {:?}", config.roots_pem_file))?;
    TrustPool::from_pem(&pem).wrap_err("failed to build trust pool")
}

fn build_policy(config: &StatictConfig) -> eyre::Result<ValidationOpts> {
    ValidationOpts::new(
        config.reject_expired,
        config.reject_unexpired,
        config.not_after_start,
        config.not_after_limit,
        &config.ext_key_usages,
        &config.reject_extensions,
    )
    .wrap_err("invalid validation policy")
}

fn load_signer(config: &StatictConfig) -> eyre::Result<SctSigner> {
    let pem = std::fs::read_to_string(&config.signing_key_pem_file)
        .wrap_err_with(|| format!("failed to read signing key file {:?}", config.signing_key_pem_file))?;
    SctSigner::from_pkcs8_pem(&pem).wrap_err("invalid signing key: only ECDSA P-256 PKCS#8 keys are accepted")
}

async fn serve<D, I, A>(origin: &str, listen_addr: &str, mask_internal_errors: bool, coordinator: SubmissionCoordinator<D, I, A>) -> eyre::Result<()>
where
    D: DedupStorage + 'static,
    I: IssuerStorage + 'static,
    A: Appender + 'static,
{
    let state = Arc::new(AppState { coordinator, mask_internal_errors });
    let app = statict_server::router(origin, state);

    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .wrap_err_with(|| format!("failed to bind {listen_addr}"))?;

    tracing::info!(%listen_addr, %origin, "listening");
    axum::serve(listener, app).await.wrap_err("server error")
}
