use std::sync::Arc;

use tracing::info;

use crate::domain::{models::ProviderStatusUpdate, repositories::MessageRepository};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Applied,
    /// No record carries the provider id. A benign race: the provider can
    /// call back before the local commit becomes visible, or for an id that
    /// was never ours.
    Dropped,
}

/// Merges asynchronous provider callbacks into message records. Runs
/// concurrently with dispatch; the record store serializes writers per row.
/// Callbacks are applied in arrival order, with no logical status ranking.
pub struct StatusReconciler {
    messages: Arc<dyn MessageRepository>,
}

impl StatusReconciler {
    pub fn new(messages: Arc<dyn MessageRepository>) -> Self {
        Self { messages }
    }

    pub async fn apply_callback(
        &self,
        update: ProviderStatusUpdate,
    ) -> anyhow::Result<ReconcileOutcome> {
        let applied = self.messages.apply_provider_status(&update).await?;
        if applied {
            info!(
                provider_id = %update.provider_id,
                status = update.status.as_str(),
                "status callback applied"
            );
            Ok(ReconcileOutcome::Applied)
        } else {
            info!(
                provider_id = %update.provider_id,
                status = update.status.as_str(),
                "dropping callback for unknown provider id"
            );
            Ok(ReconcileOutcome::Dropped)
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::{
        domain::models::{DeliveryStatus, MessageRecord},
        infrastructure::repositories::in_memory::InMemoryMessageRepository,
    };

    async fn seeded_repo(provider_id: &str) -> (Arc<InMemoryMessageRepository>, MessageRecord) {
        let repo = Arc::new(InMemoryMessageRepository::new());
        let record = repo
            .insert(
                "+15550001111".to_string(),
                "hello".to_string(),
                serde_json::Value::Null,
            )
            .await
            .unwrap();
        repo.mark_sent(record.id, provider_id, Utc::now())
            .await
            .unwrap();
        let record = repo.get(record.id).await.unwrap().unwrap();
        (repo, record)
    }

    fn update(provider_id: &str, status: DeliveryStatus) -> ProviderStatusUpdate {
        ProviderStatusUpdate {
            provider_id: provider_id.to_string(),
            status,
            error_code: None,
            error_message: None,
        }
    }

    #[tokio::test]
    async fn delivered_callback_updates_status_without_touching_sent_at() {
        let (repo, before) = seeded_repo("SM123").await;
        let reconciler = StatusReconciler::new(repo.clone());

        let outcome = reconciler
            .apply_callback(update("SM123", DeliveryStatus::Delivered))
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Applied);
        let after = repo.get(before.id).await.unwrap().unwrap();
        assert_eq!(after.status, DeliveryStatus::Delivered);
        assert_eq!(after.sent_at, before.sent_at);
    }

    #[tokio::test]
    async fn unknown_provider_id_is_dropped_without_creating_a_record() {
        let repo = Arc::new(InMemoryMessageRepository::new());
        let reconciler = StatusReconciler::new(repo.clone());

        let outcome = reconciler
            .apply_callback(update(&Uuid::new_v4().to_string(), DeliveryStatus::Delivered))
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Dropped);
        let (records, _) = repo.list(None, None, None).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn applying_the_same_callback_twice_is_idempotent() {
        let (repo, before) = seeded_repo("SM123").await;
        let reconciler = StatusReconciler::new(repo.clone());
        let callback = ProviderStatusUpdate {
            provider_id: "SM123".to_string(),
            status: DeliveryStatus::Undelivered,
            error_code: Some("30003".to_string()),
            error_message: Some("unreachable handset".to_string()),
        };

        reconciler.apply_callback(callback.clone()).await.unwrap();
        let once = repo.get(before.id).await.unwrap().unwrap();
        reconciler.apply_callback(callback).await.unwrap();
        let twice = repo.get(before.id).await.unwrap().unwrap();

        assert_eq!(once.status, twice.status);
        assert_eq!(once.error_code, twice.error_code);
        assert_eq!(once.error_message, twice.error_message);
        assert_eq!(once.sent_at, twice.sent_at);
    }

    #[tokio::test]
    async fn out_of_order_callbacks_apply_arrival_order() {
        let (repo, before) = seeded_repo("SM123").await;
        let reconciler = StatusReconciler::new(repo.clone());

        reconciler
            .apply_callback(update("SM123", DeliveryStatus::Delivered))
            .await
            .unwrap();
        reconciler
            .apply_callback(update("SM123", DeliveryStatus::Sent))
            .await
            .unwrap();

        let after = repo.get(before.id).await.unwrap().unwrap();
        assert_eq!(after.status, DeliveryStatus::Sent);
    }

    #[tokio::test]
    async fn concurrent_callbacks_leave_one_of_the_two_states() {
        let (repo, before) = seeded_repo("SM123").await;
        let reconciler = Arc::new(StatusReconciler::new(repo.clone()));

        let a = {
            let reconciler = reconciler.clone();
            tokio::spawn(async move {
                reconciler
                    .apply_callback(update("SM123", DeliveryStatus::Delivered))
                    .await
            })
        };
        let b = {
            let reconciler = reconciler.clone();
            tokio::spawn(async move {
                reconciler
                    .apply_callback(update("SM123", DeliveryStatus::Read))
                    .await
            })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let after = repo.get(before.id).await.unwrap().unwrap();
        assert!(matches!(
            after.status,
            DeliveryStatus::Delivered | DeliveryStatus::Read
        ));
    }
}
