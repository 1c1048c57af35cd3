//! Recovery round-trip tests: archived containers get a fresh local copy
//! and a replacement "original" asset.

mod common;

use asset_archive::models::asset::ROLE_ORIGINAL;
use asset_archive::services::{record_store::Scope, recovery::RecoveryError};
use std::fs;

const COLLECTION: &str = "collection";

#[tokio::test]
async fn recovery_round_trips_a_migrated_container() {
    let env = common::setup().await;

    let container = env.store.create_container("c", COLLECTION, None).await.unwrap();
    env.seed_asset(container.id, ROLE_ORIGINAL, "origin://bucket/x.tif", "x.tif")
        .await;
    env.write_origin("bucket/x.tif", b"original tif content");

    let candidates = env.resolver.resolve(&Scope::All).await.unwrap();
    env.migrator.migrate_one(&candidates[0]).await.unwrap();

    let asset_id = env.recovery.recover(container.id).await.unwrap();

    // title carries the filename component of the archive link
    let asset = env.store.load_asset(asset_id).await.unwrap();
    assert_eq!(asset.title, "x.tif");
    assert_eq!(asset.use_role, ROLE_ORIGINAL);
    assert_eq!(asset.container_id, container.id);

    // the new file record points at a readable local copy, byte-identical
    // to what was migrated
    let file = env.store.load_file(asset.file_id).await.unwrap();
    assert_eq!(file.filename, "x.tif");
    assert_eq!(fs::read(&file.uri).unwrap(), b"original tif content");

    // the archive link stays populated; recovery adds, it does not unarchive
    let rewritten = env.store.load_container(container.id).await.unwrap();
    assert!(!rewritten.archive_link.is_empty());
}

#[tokio::test]
async fn recovered_copy_is_a_valid_candidate_for_a_later_run() {
    let env = common::setup().await;

    let container = env.store.create_container("c", COLLECTION, None).await.unwrap();
    env.seed_asset(container.id, ROLE_ORIGINAL, "origin://bucket/x.tif", "x.tif")
        .await;
    env.write_origin("bucket/x.tif", b"bytes");

    let candidates = env.resolver.resolve(&Scope::All).await.unwrap();
    env.migrator.migrate_one(&candidates[0]).await.unwrap();
    env.recovery.recover(container.id).await.unwrap();

    // the replacement asset shows up in a fresh resolver scan
    let candidates = env.resolver.resolve(&Scope::All).await.unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].container_id, container.id);
}

#[tokio::test]
async fn recovering_an_unarchived_container_fails_without_side_effects() {
    let env = common::setup().await;

    let container = env.store.create_container("c", COLLECTION, None).await.unwrap();
    let err = env.recovery.recover(container.id).await.unwrap_err();
    assert!(matches!(err, RecoveryError::NotArchived(_)));

    let candidates = env.resolver.resolve(&Scope::All).await.unwrap();
    assert!(candidates.is_empty(), "no replacement asset may be created");
}

#[tokio::test]
async fn unreachable_archive_creates_no_partial_records() {
    let env = common::setup().await;

    let container = env.store.create_container("c", COLLECTION, None).await.unwrap();
    let mut rec = env.store.load_container(container.id).await.unwrap();
    // a link minted under our base URL, but the payload was never written
    rec.archive_link = format!("{}/bucket/n_{}-x.tif", common::BASE_URL, container.id);
    env.store.save_container(&rec).await.unwrap();

    let err = env.recovery.recover(container.id).await.unwrap_err();
    assert!(matches!(err, RecoveryError::ArchiveUnreachable { .. }));

    let candidates = env.resolver.resolve(&Scope::All).await.unwrap();
    assert!(candidates.is_empty());
}
