//! RecordStore — typed load/save/delete over the SQLite metadata tables,
//! plus the two set-membership queries the traversal and resolution stages
//! need (child-container lookup, original-asset join).
//!
//! Callers never hold a long-lived reference into the store: records are
//! loaded as values, mutated, and saved back. This keeps batch workers free
//! of aliasing concerns.

use crate::models::{
    asset::{Asset, ROLE_ORIGINAL},
    candidate::Candidate,
    container::Container,
    file::StoredFile,
};
use chrono::Utc;
use sqlx::{QueryBuilder, SqlitePool, sqlite::Sqlite};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("container `{0}` not found")]
    ContainerNotFound(i64),
    #[error("asset `{0}` not found")]
    AssetNotFound(i64),
    #[error("file `{0}` not found")]
    FileNotFound(i64),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type RecordResult<T> = Result<T, RecordError>;

/// Scope of a resolver query: the entire corpus, or an explicit container set.
#[derive(Clone, Debug)]
pub enum Scope {
    All,
    Containers(Vec<i64>),
}

#[derive(Clone)]
pub struct RecordStore {
    /// Shared SQLite connection pool used for all record operations.
    pub db: Arc<SqlitePool>,
}

impl RecordStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Load one container by id.
    pub async fn load_container(&self, id: i64) -> RecordResult<Container> {
        sqlx::query_as::<_, Container>(
            "SELECT id, title, model, parent_id, archive_link, created_at
             FROM containers WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => RecordError::ContainerNotFound(id),
            other => RecordError::Sqlx(other),
        })
    }

    /// Persist the mutable fields of a container.
    pub async fn save_container(&self, container: &Container) -> RecordResult<()> {
        let result = sqlx::query(
            "UPDATE containers SET title = ?, model = ?, parent_id = ?, archive_link = ?
             WHERE id = ?",
        )
        .bind(&container.title)
        .bind(&container.model)
        .bind(container.parent_id)
        .bind(&container.archive_link)
        .bind(container.id)
        .execute(&*self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RecordError::ContainerNotFound(container.id));
        }
        Ok(())
    }

    /// Insert a container, returning the stored record.
    pub async fn create_container(
        &self,
        title: &str,
        model: &str,
        parent_id: Option<i64>,
    ) -> RecordResult<Container> {
        let row = sqlx::query_as::<_, Container>(
            "INSERT INTO containers (title, model, parent_id, archive_link, created_at)
             VALUES (?, ?, ?, '', ?)
             RETURNING id, title, model, parent_id, archive_link, created_at",
        )
        .bind(title)
        .bind(model)
        .bind(parent_id)
        .bind(Utc::now())
        .fetch_one(&*self.db)
        .await?;
        Ok(row)
    }

    pub async fn load_asset(&self, id: i64) -> RecordResult<Asset> {
        sqlx::query_as::<_, Asset>(
            "SELECT id, container_id, use_role, file_id, title, created_at
             FROM assets WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => RecordError::AssetNotFound(id),
            other => RecordError::Sqlx(other),
        })
    }

    pub async fn create_asset(
        &self,
        container_id: i64,
        use_role: &str,
        file_id: i64,
        title: &str,
    ) -> RecordResult<Asset> {
        let row = sqlx::query_as::<_, Asset>(
            "INSERT INTO assets (container_id, use_role, file_id, title, created_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id, container_id, use_role, file_id, title, created_at",
        )
        .bind(container_id)
        .bind(use_role)
        .bind(file_id)
        .bind(title)
        .bind(Utc::now())
        .fetch_one(&*self.db)
        .await?;
        Ok(row)
    }

    pub async fn delete_asset(&self, id: i64) -> RecordResult<()> {
        let result = sqlx::query("DELETE FROM assets WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RecordError::AssetNotFound(id));
        }
        Ok(())
    }

    pub async fn load_file(&self, id: i64) -> RecordResult<StoredFile> {
        sqlx::query_as::<_, StoredFile>(
            "SELECT id, uri, filename, created_at FROM files WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => RecordError::FileNotFound(id),
            other => RecordError::Sqlx(other),
        })
    }

    pub async fn create_file(&self, uri: &str, filename: &str) -> RecordResult<StoredFile> {
        let row = sqlx::query_as::<_, StoredFile>(
            "INSERT INTO files (uri, filename, created_at)
             VALUES (?, ?, ?)
             RETURNING id, uri, filename, created_at",
        )
        .bind(uri)
        .bind(filename)
        .bind(Utc::now())
        .fetch_one(&*self.db)
        .await?;
        Ok(row)
    }

    pub async fn delete_file(&self, id: i64) -> RecordResult<()> {
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RecordError::FileNotFound(id));
        }
        Ok(())
    }

    /// Identifiers of containers whose parent is in `parents` and whose type
    /// marker is in `markers`. One BFS round of the collection traversal.
    pub async fn child_containers(
        &self,
        parents: &[i64],
        markers: &[String],
    ) -> RecordResult<Vec<i64>> {
        if parents.is_empty() || markers.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder =
            QueryBuilder::<Sqlite>::new("SELECT id FROM containers WHERE parent_id IN (");
        {
            let mut separated = builder.separated(", ");
            for parent in parents {
                separated.push_bind(*parent);
            }
        }
        builder.push(") AND model IN (");
        {
            let mut separated = builder.separated(", ");
            for marker in markers {
                separated.push_bind(marker.as_str());
            }
        }
        builder.push(") ORDER BY id ASC");

        let ids: Vec<i64> = builder.build_query_scalar().fetch_all(&*self.db).await?;
        Ok(ids)
    }

    /// The migration working set: one row per "original"-role asset whose
    /// owning container is directly in scope. Ordered by asset id so a fixed
    /// snapshot always yields the same sequence.
    pub async fn candidates(&self, scope: &Scope) -> RecordResult<Vec<Candidate>> {
        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT a.container_id AS container_id, a.id AS asset_id, a.file_id AS file_id, \
             f.uri AS uri, f.filename AS filename \
             FROM assets a JOIN files f ON f.id = a.file_id \
             WHERE a.use_role = ",
        );
        builder.push_bind(ROLE_ORIGINAL);

        match scope {
            Scope::All => {}
            Scope::Containers(ids) => {
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                builder.push(" AND a.container_id IN (");
                {
                    let mut separated = builder.separated(", ");
                    for id in ids {
                        separated.push_bind(*id);
                    }
                }
                builder.push(")");
            }
        }

        builder.push(" ORDER BY a.id ASC");

        let rows: Vec<Candidate> = builder.build_query_as().fetch_all(&*self.db).await?;
        Ok(rows)
    }
}
