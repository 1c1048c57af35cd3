use anyhow::Result;
use asset_archive::{
    config::{AppConfig, RunMode},
    db,
    handlers::AppState,
    routes,
    services::{
        archive_store::{ArchiveStore, StreamingCopier},
        expander::CollectionExpander,
        migrator::ArchiveMigrator,
        pipeline::{ArchivePipeline, RunScope},
        record_store::RecordStore,
        recovery::RecoveryReconstructor,
        resolver::AssetResolver,
        transport::ByteTransport,
    },
};
use axum::Router;
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + run mode ---
    let (cfg, mode) = AppConfig::from_env_and_args()?;

    tracing::info!("Starting asset-archive with config: {:?}", cfg);

    // --- Ensure backend directories exist ---
    for dir in [&cfg.origin_dir, &cfg.archive_dir, &cfg.staging_dir] {
        if !Path::new(dir).exists() {
            fs::create_dir_all(dir)?;
            tracing::info!("Created directory at {}", dir);
        }
    }

    // --- Initialize SQLite connection ---
    let db_url = &cfg.database_url;
    tracing::debug!("Connecting using raw URL => {}", db_url);

    // Extract the local file path SQLx will use
    let db_path = db_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("file:");

    // Create parent directory and the file itself if needed
    let db_path_obj = Path::new(db_path);
    if let Some(parent) = db_path_obj.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
            tracing::info!("Created missing directory {:?}", parent);
        }
    }
    match fs::OpenOptions::new().create(true).write(true).open(db_path) {
        Ok(_) => tracing::debug!("Database file can be created/opened successfully."),
        Err(e) => tracing::warn!("Failed to open database file manually: {}", e),
    }

    let db = db::connect(db_url).await?;

    // --- Initialize core services ---
    let store = RecordStore::new(db.clone());
    let transport = ByteTransport::new(&cfg.origin_dir, &cfg.archive_dir);
    let copier = StreamingCopier::new(&cfg.staging_dir);
    let archive = ArchiveStore::new(&cfg.archive_dir);
    let migrator = ArchiveMigrator::new(
        store.clone(),
        transport.clone(),
        copier,
        archive,
        &cfg.archive_base_url,
        cfg.worker_count,
    );
    let expander = CollectionExpander::new(store.clone());
    let resolver = AssetResolver::new(store.clone());
    let pipeline = ArchivePipeline::new(
        expander,
        resolver,
        migrator,
        cfg.container_models.clone(),
    );
    let recovery = RecoveryReconstructor::new(
        store,
        transport,
        &cfg.staging_dir,
        &cfg.archive_base_url,
    );

    match mode {
        // --- Handle migration mode ---
        RunMode::Migrate => {
            db::run_migrations(&db).await?;
            tracing::info!("Database migration complete.");
            Ok(())
        }

        // --- One-shot archival runs (Ctrl-C abandons the remaining queue) ---
        RunMode::ArchiveAll => {
            run_batch(&pipeline, RunScope::All).await
        }
        RunMode::ArchiveRoots(roots) => {
            run_batch(&pipeline, RunScope::Roots(roots)).await
        }

        // --- One-shot recovery ---
        RunMode::Recover(container_id) => {
            let asset_id = recovery.recover(container_id).await?;
            println!("recovered container {} as asset {}", container_id, asset_id);
            Ok(())
        }

        // --- Serve the admin API ---
        RunMode::Serve => {
            let state = AppState {
                db,
                pipeline,
                recovery,
                staging_dir: PathBuf::from(&cfg.staging_dir),
            };
            let app: Router = routes::routes::routes().with_state(state);

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
    }
}

/// Run one archival batch from the CLI, with Ctrl-C abandoning the remaining
/// queue (in-flight candidates finish their current steps).
async fn run_batch(pipeline: &ArchivePipeline, scope: RunScope) -> Result<()> {
    let cancel = CancellationToken::new();
    let stop = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("stop requested; in-flight candidates will finish");
            stop.cancel();
        }
    });

    let summary = pipeline.run(scope, &cancel).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
