use std::sync::Arc;

use chemviz_core::model::{Summary, UploadRecord};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::entity::upload_history::{self, Column, Entity as UploadHistory};

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Record {0} not found")]
    NotFound(i32),
    #[error("Value cannot be stored: {0}")]
    InvalidValue(String),
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// How many uploads the history keeps. Older ones are deleted every time a
/// new one is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    keep: usize,
}

impl RetentionPolicy {
    pub const DEFAULT_KEEP: usize = 5;

    /// A policy that keeps the `keep` most recent uploads. At least one is
    /// always kept, otherwise an upload could never be reported on.
    pub fn new(keep: usize) -> Self {
        Self { keep: keep.max(1) }
    }

    pub fn keep(&self) -> usize {
        self.keep
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_KEEP)
    }
}

/// The bounded history of uploads. Cheap to clone; clones share the
/// connection and the write lock.
#[derive(Clone)]
pub struct HistoryStore {
    conn: DatabaseConnection,
    policy: RetentionPolicy,
    /// Serializes "insert + trim" so that two concurrent uploads never trim
    /// against a stale view of the table.
    write_lock: Arc<Mutex<()>>,
}

impl HistoryStore {
    pub fn new(conn: DatabaseConnection, policy: RetentionPolicy) -> Self {
        Self {
            conn,
            policy,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    /// Saves the summary of an upload, then deletes everything outside the
    /// retention window. Both happen in one transaction: if either fails,
    /// nothing changes.
    #[instrument(skip(self, summary))]
    pub async fn record(
        &self,
        summary: &Summary,
        filename: &str,
    ) -> Result<UploadRecord, HistoryError> {
        let total_equipment = i64::try_from(summary.total_equipment)
            .map_err(|err| HistoryError::InvalidValue(err.to_string()))?;

        // The timestamp is taken under the lock so that upload order and id
        // order agree.
        let _guard = self.write_lock.lock().await;
        let row = upload_history::ActiveModel {
            filename: ActiveValue::Set(filename.to_string()),
            total_equipment: ActiveValue::Set(total_equipment),
            avg_flowrate: ActiveValue::Set(summary.avg_flowrate),
            avg_pressure: ActiveValue::Set(summary.avg_pressure),
            avg_temperature: ActiveValue::Set(summary.avg_temperature),
            uploaded_at: ActiveValue::Set(Utc::now()),
            ..Default::default()
        };

        let txn = self.conn.begin().await?;
        let model = row.insert(&txn).await?;
        let removed = retain_within(&txn, self.policy.keep).await?;
        txn.commit().await?;

        info!(
            "Recorded upload {} of {filename:?}, {removed} old record(s) removed",
            model.id
        );
        Ok(model.into())
    }

    /// Deletes all but the `keep` most recent records, returning how many were
    /// deleted. [`record`](Self::record) already does this with the store's
    /// own policy.
    #[instrument(skip(self))]
    pub async fn retain(&self, keep: usize) -> Result<u64, HistoryError> {
        let _guard = self.write_lock.lock().await;
        let txn = self.conn.begin().await?;
        let removed = retain_within(&txn, keep).await?;
        txn.commit().await?;
        Ok(removed)
    }

    /// Returns up to `n` of the most recent records, newest first.
    pub async fn list(&self, n: usize) -> Result<Vec<UploadRecord>, HistoryError> {
        let limit = u64::try_from(n).unwrap_or(u64::MAX);
        let models = UploadHistory::find()
            .order_by_desc(Column::UploadedAt)
            .order_by_desc(Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    pub async fn get(&self, id: i32) -> Result<UploadRecord, HistoryError> {
        UploadHistory::find_by_id(id)
            .one(&self.conn)
            .await?
            .map(Into::into)
            .ok_or(HistoryError::NotFound(id))
    }
}

/// Deletes the records that fall outside the `keep` most recent. "Most
/// recent" is by upload time, with the later insert winning a tie.
async fn retain_within<C: ConnectionTrait>(conn: &C, keep: usize) -> Result<u64, DbErr> {
    let ids: Vec<i32> = UploadHistory::find()
        .select_only()
        .column(Column::Id)
        .order_by_desc(Column::UploadedAt)
        .order_by_desc(Column::Id)
        .into_tuple()
        .all(conn)
        .await?;

    let stale: Vec<i32> = ids.into_iter().skip(keep).collect();
    if stale.is_empty() {
        return Ok(0);
    }

    debug!("Deleting history records {:?}", stale);
    let result = UploadHistory::delete_many()
        .filter(Column::Id.is_in(stale))
        .exec(conn)
        .await?;

    Ok(result.rows_affected)
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::initialise_in_memory_database;

    async fn make_store(keep: usize) -> HistoryStore {
        let conn = initialise_in_memory_database().await.unwrap();
        HistoryStore::new(conn, RetentionPolicy::new(keep))
    }

    fn summary(total_equipment: usize, avg_flowrate: f64) -> Summary {
        Summary {
            total_equipment,
            avg_flowrate,
            avg_pressure: 5.33,
            avg_temperature: 70.0,
            equipment_type_distribution: IndexMap::new(),
            table_data: Vec::new(),
        }
    }

    #[tokio::test]
    async fn record_then_get() {
        let store = make_store(5).await;
        let recorded = store.record(&summary(3, 15.0), "test.csv").await.unwrap();

        let fetched = store.get(recorded.id).await.unwrap();
        assert_eq!(fetched.filename, "test.csv");
        assert_eq!(fetched.total_equipment, 3);
        assert_eq!(fetched.avg_flowrate, 15.0);
        assert_eq!(fetched.avg_pressure, 5.33);
        assert_eq!(fetched.avg_temperature, 70.0);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let store = make_store(5).await;
        let result = store.get(42).await;
        assert!(matches!(result, Err(HistoryError::NotFound(42))));
    }

    #[tokio::test]
    async fn keeps_only_the_five_most_recent() {
        let store = make_store(5).await;

        let mut ids = Vec::new();
        for i in 0..7 {
            let record = store
                .record(&summary(i, i as f64), &format!("upload-{i}.csv"))
                .await
                .unwrap();
            ids.push(record.id);
        }

        let listed: Vec<i32> = store.list(5).await.unwrap().iter().map(|r| r.id).collect();
        let expected: Vec<i32> = ids[2..].iter().rev().copied().collect();
        assert_eq!(listed, expected);

        for oldest in &ids[..2] {
            let result = store.get(*oldest).await;
            assert!(matches!(result, Err(HistoryError::NotFound(_))));
        }

        // Nothing beyond the window survives, even when asking for more.
        assert_eq!(store.list(100).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = make_store(5).await;
        store.record(&summary(1, 1.0), "a.csv").await.unwrap();
        store.record(&summary(2, 2.0), "b.csv").await.unwrap();
        store.record(&summary(3, 3.0), "c.csv").await.unwrap();

        let names: Vec<String> = store
            .list(2)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.filename)
            .collect();
        assert_eq!(names, ["c.csv", "b.csv"]);
    }

    #[tokio::test]
    async fn retain_trims_to_a_smaller_window() {
        let store = make_store(5).await;
        for i in 0..4 {
            store.record(&summary(i, 1.0), "x.csv").await.unwrap();
        }

        let removed = store.retain(1).await.unwrap();
        assert_eq!(removed, 3);
        assert_eq!(store.list(5).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_uploads_respect_the_window() {
        let store = make_store(5).await;

        let handles: Vec<_> = (0..12)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .record(&summary(i, 1.0), &format!("{i}.csv"))
                        .await
                        .map(|r| r.id)
                })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap());
        }
        ids.sort_unstable();

        let mut listed: Vec<i32> = store.list(100).await.unwrap().iter().map(|r| r.id).collect();
        listed.sort_unstable();
        assert_eq!(listed, ids[ids.len() - 5..]);
    }

    #[test]
    fn policy_keeps_at_least_one() {
        assert_eq!(RetentionPolicy::new(0).keep(), 1);
        assert_eq!(RetentionPolicy::default().keep(), 5);
    }
}
