//! Shared harness: a throwaway SQLite database plus origin/archive/staging
//! directories under one tempdir, wired into the real services.
#![allow(dead_code)]

use asset_archive::db;
use asset_archive::models::{asset::Asset, file::StoredFile};
use asset_archive::services::{
    archive_store::{ArchiveStore, StreamingCopier},
    expander::CollectionExpander,
    migrator::ArchiveMigrator,
    pipeline::ArchivePipeline,
    record_store::RecordStore,
    recovery::RecoveryReconstructor,
    resolver::AssetResolver,
    transport::ByteTransport,
};
use sqlx::SqlitePool;
use std::{fs, path::PathBuf, sync::Arc};
use tempfile::TempDir;

pub const BASE_URL: &str = "https://archive.example.org";

pub struct TestEnv {
    // Held so the directories outlive the test body.
    pub tmp: TempDir,
    pub db: Arc<SqlitePool>,
    pub store: RecordStore,
    pub transport: ByteTransport,
    pub expander: CollectionExpander,
    pub resolver: AssetResolver,
    pub migrator: ArchiveMigrator,
    pub recovery: RecoveryReconstructor,
    pub pipeline: ArchivePipeline,
}

impl TestEnv {
    pub fn origin_dir(&self) -> PathBuf {
        self.tmp.path().join("origin")
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.tmp.path().join("archive")
    }

    /// Place payload bytes at `origin://{rel}`.
    pub fn write_origin(&self, rel: &str, bytes: &[u8]) {
        let path = self.origin_dir().join(rel);
        fs::create_dir_all(path.parent().unwrap()).expect("mkdir origin subdir");
        fs::write(&path, bytes).expect("write origin payload");
    }

    /// Seed one container with an asset/file pair in the given role.
    pub async fn seed_asset(
        &self,
        container_id: i64,
        role: &str,
        uri: &str,
        filename: &str,
    ) -> (Asset, StoredFile) {
        let file = self
            .store
            .create_file(uri, filename)
            .await
            .expect("create file record");
        let asset = self
            .store
            .create_asset(container_id, role, file.id, filename)
            .await
            .expect("create asset record");
        (asset, file)
    }
}

pub async fn setup() -> TestEnv {
    let tmp = tempfile::tempdir().expect("tempdir");
    for sub in ["origin", "archive", "staging"] {
        fs::create_dir_all(tmp.path().join(sub)).expect("mkdir backend dir");
    }

    let db_url = format!("sqlite://{}?mode=rwc", tmp.path().join("records.db").display());
    let db = db::connect(&db_url).await.expect("connect sqlite");
    db::run_migrations(&db).await.expect("run migrations");

    let store = RecordStore::new(db.clone());
    let transport = ByteTransport::new(tmp.path().join("origin"), tmp.path().join("archive"));
    let copier = StreamingCopier::new(tmp.path().join("staging"));
    let archive = ArchiveStore::new(tmp.path().join("archive"));
    let migrator = ArchiveMigrator::new(
        store.clone(),
        transport.clone(),
        copier,
        archive,
        BASE_URL,
        2,
    );
    let expander = CollectionExpander::new(store.clone());
    let resolver = AssetResolver::new(store.clone());
    let pipeline = ArchivePipeline::new(
        expander.clone(),
        resolver.clone(),
        migrator.clone(),
        vec!["collection".to_string()],
    );
    let recovery = RecoveryReconstructor::new(
        store.clone(),
        transport.clone(),
        tmp.path().join("staging"),
        BASE_URL,
    );

    TestEnv {
        tmp,
        db,
        store,
        transport,
        expander,
        resolver,
        migrator,
        recovery,
        pipeline,
    }
}
