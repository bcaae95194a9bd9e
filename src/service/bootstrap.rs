// service/bootstrap.rs
use std::path::Path;

use crate::{
    db::{
        db::DBClient,
        snapshot::{parse_snapshot, seed_snapshot, Snapshot, SnapshotExt},
    },
    service::error::ServiceError,
};

/// Where the store's starting data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOrigin {
    Existing,
    Snapshot,
    Seed,
}

/// Fills an empty store from the snapshot at `snapshot_path` when one is
/// present and non-empty, otherwise from the built-in seed. A populated
/// store is left alone.
pub async fn prepare_store(
    db_client: &DBClient,
    snapshot_path: Option<&Path>,
) -> Result<StoreOrigin, ServiceError> {
    if !db_client.is_store_empty().await? {
        tracing::info!("using existing store");
        return Ok(StoreOrigin::Existing);
    }

    if let Some(path) = snapshot_path {
        if let Some(snapshot) = read_snapshot(path).await? {
            db_client.import_snapshot(&snapshot).await?;
            tracing::info!(path = %path.display(), "store loaded from snapshot");
            return Ok(StoreOrigin::Snapshot);
        }
        tracing::warn!(path = %path.display(), "snapshot missing or empty, seeding instead");
    }

    db_client.import_snapshot(&seed_snapshot()).await?;
    tracing::info!("store seeded with built-in data");
    Ok(StoreOrigin::Seed)
}

async fn read_snapshot(path: &Path) -> Result<Option<Snapshot>, ServiceError> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ServiceError::Other(format!(
                "failed to read snapshot {}: {}",
                path.display(),
                e
            )))
        }
    };

    if raw.trim().is_empty() {
        return Ok(None);
    }

    let snapshot = parse_snapshot(&raw).map_err(|e| {
        ServiceError::Other(format!("invalid snapshot {}: {}", path.display(), e))
    })?;

    Ok((!snapshot.is_empty()).then_some(snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{snapshot::SnapshotFile, userdb::UserExt};

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("linkauthority-{}-{}.json", name, uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn empty_store_is_seeded() {
        let db = DBClient::in_memory().await.unwrap();
        assert_eq!(prepare_store(&db, None).await.unwrap(), StoreOrigin::Seed);
        assert_eq!(db.get_users().await.unwrap().len(), 3);

        // Second start keeps what is there.
        assert_eq!(prepare_store(&db, None).await.unwrap(), StoreOrigin::Existing);
        assert_eq!(db.get_users().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn snapshot_file_wins_over_seed() {
        let mut snapshot = seed_snapshot();
        snapshot.users.truncate(1);
        snapshot.websites.truncate(1);
        let path = temp_path("import");
        tokio::fs::write(&path, serde_json::to_string(&snapshot).unwrap())
            .await
            .unwrap();

        let db = DBClient::in_memory().await.unwrap();
        let origin = prepare_store(&db, Some(path.as_path())).await.unwrap();
        let _ = tokio::fs::remove_file(&path).await;

        assert_eq!(origin, StoreOrigin::Snapshot);
        assert_eq!(db.get_users().await.unwrap(), snapshot.users);
    }

    #[tokio::test]
    async fn exported_document_restores_into_a_fresh_store() {
        let source = DBClient::in_memory().await.unwrap();
        prepare_store(&source, None).await.unwrap();
        let exported = SnapshotFile {
            linkauthority_db: source.export_snapshot().await.unwrap(),
        };

        let path = temp_path("export");
        tokio::fs::write(&path, serde_json::to_string(&exported).unwrap())
            .await
            .unwrap();

        let db = DBClient::in_memory().await.unwrap();
        let origin = prepare_store(&db, Some(path.as_path())).await;
        let _ = tokio::fs::remove_file(&path).await;

        assert_eq!(origin.unwrap(), StoreOrigin::Snapshot);
        assert_eq!(db.export_snapshot().await.unwrap(), exported.linkauthority_db);
    }

    #[tokio::test]
    async fn missing_or_blank_snapshot_falls_back_to_seed() {
        let db = DBClient::in_memory().await.unwrap();
        let missing = temp_path("missing");
        assert_eq!(prepare_store(&db, Some(missing.as_path())).await.unwrap(), StoreOrigin::Seed);

        let blank = temp_path("blank");
        tokio::fs::write(&blank, "  \n").await.unwrap();
        let db = DBClient::in_memory().await.unwrap();
        let origin = prepare_store(&db, Some(blank.as_path())).await.unwrap();
        let _ = tokio::fs::remove_file(&blank).await;
        assert_eq!(origin, StoreOrigin::Seed);
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_an_error() {
        let path = temp_path("corrupt");
        tokio::fs::write(&path, "{not json").await.unwrap();

        let db = DBClient::in_memory().await.unwrap();
        let result = prepare_store(&db, Some(path.as_path())).await;
        let _ = tokio::fs::remove_file(&path).await;

        assert!(matches!(result, Err(ServiceError::Other(_))));
        assert!(db.is_store_empty().await.unwrap());
    }
}
