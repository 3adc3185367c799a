use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use serde::Deserialize;
use sqlx::{
    PgPool, Row,
    postgres::{PgListener, PgRow},
};

use crate::{
    CollectionPath, Document, DocumentPath, Query, Result, merge_fields,
    store::{DocumentStore, SetMode, WriteBatch, WriteOp, validate_batch},
    watch::{ChangeEvent, ChangeKind, Notification, Subscription, WatchTarget},
};

/// Channel the `documents` trigger publishes change notices on.
pub const CHANGE_CHANNEL: &str = "document_changes";

/// PostgreSQL-backed document store implementation.
///
/// Documents are rows of a single `documents` table keyed by
/// `(collection, id)` with a JSONB field map. Change notifications come from
/// `LISTEN/NOTIFY` and carry only the path; subscribers re-read the data.
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

/// Payload published by the `notify_document_change` trigger.
#[derive(Debug, Deserialize)]
struct ChangeNotice {
    op: String,
    collection: String,
    id: String,
}

impl ChangeNotice {
    fn into_event(self) -> Option<ChangeEvent> {
        let kind = match self.op.as_str() {
            "INSERT" => ChangeKind::Added,
            "UPDATE" => ChangeKind::Modified,
            "DELETE" => ChangeKind::Removed,
            _ => return None,
        };
        let collection = CollectionPath::parse(&self.collection).ok()?;
        Some(ChangeEvent {
            kind,
            path: collection.doc(self.id),
            data: None,
        })
    }
}

impl PostgresDocumentStore {
    /// Creates a new PostgreSQL document store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database at `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        Ok(Self::new(PgPool::connect(url).await?))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_document(row: PgRow) -> Result<Document> {
        let collection: String = row.try_get("collection")?;
        let id: String = row.try_get("id")?;

        Ok(Document {
            path: CollectionPath::parse(&collection)?.doc(id),
            data: row.try_get("data")?,
            update_time: row.try_get::<DateTime<Utc>, _>("update_time")?,
        })
    }

    async fn upsert(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        path: &DocumentPath,
        data: &serde_json::Value,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data, update_time)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (collection, id) DO UPDATE SET
                data = EXCLUDED.data,
                update_time = EXCLUDED.update_time
            "#,
        )
        .bind(path.parent().as_str())
        .bind(path.id())
        .bind(data)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT collection, id, data, update_time
            FROM documents
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(path.parent().as_str())
        .bind(path.id())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_document).transpose()
    }

    async fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>> {
        let rows = sqlx::query(
            r#"
            SELECT collection, id, data, update_time
            FROM documents
            WHERE collection = $1
            ORDER BY id ASC
            "#,
        )
        .bind(collection.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_document).collect()
    }

    async fn query(&self, collection: &CollectionPath, query: &Query) -> Result<Vec<Document>> {
        let mut sql = String::from(
            "SELECT collection, id, data, update_time FROM documents WHERE collection = $1",
        );
        let mut param_count = 1;

        // Build dynamic query
        for _ in &query.filters {
            sql.push_str(&format!(
                " AND data #> ${} = ${}",
                param_count + 1,
                param_count + 2
            ));
            param_count += 2;
        }

        sql.push_str(" ORDER BY id ASC");

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }

        let mut sqlx_query = sqlx::query(&sql).bind(collection.as_str());
        for filter in &query.filters {
            sqlx_query = sqlx_query.bind(filter.segments()).bind(&filter.value);
        }
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(limit as i64);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_document).collect()
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        validate_batch(&batch)?;

        let mut tx = self.pool.begin().await?;

        for op in batch.into_ops() {
            match op {
                WriteOp::Set {
                    path,
                    data,
                    mode: SetMode::Replace,
                } => Self::upsert(&mut tx, &path, &data).await?,
                WriteOp::Set {
                    path,
                    data,
                    mode: SetMode::Merge,
                } => {
                    let existing: Option<serde_json::Value> = sqlx::query_scalar(
                        "SELECT data FROM documents WHERE collection = $1 AND id = $2 FOR UPDATE",
                    )
                    .bind(path.parent().as_str())
                    .bind(path.id())
                    .fetch_optional(&mut *tx)
                    .await?;

                    let merged = match existing {
                        Some(mut current) => {
                            merge_fields(&mut current, data);
                            current
                        }
                        None => data,
                    };
                    Self::upsert(&mut tx, &path, &merged).await?;
                }
                WriteOp::Delete { path } => {
                    sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
                        .bind(path.parent().as_str())
                        .bind(path.id())
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn subscribe(&self, target: WatchTarget) -> Result<Subscription> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;

        let filter_target = target.clone();
        let stream = listener
            .into_stream()
            .take_while(|result| {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "Change listener closed");
                }
                futures_util::future::ready(result.is_ok())
            })
            .filter_map(move |result| {
                let event = result
                    .ok()
                    .and_then(|n| serde_json::from_str::<ChangeNotice>(n.payload()).ok())
                    .and_then(ChangeNotice::into_event)
                    .filter(|event| filter_target.matches(&event.path));
                futures_util::future::ready(event.map(Notification::Changed))
            });

        Ok(Subscription::new(target, Box::pin(stream)))
    }
}
