//! Read-only access to the movement log for audit and reporting.

use chrono::{DateTime, Utc};
use tracing::instrument;

use stockledger_core::VariantId;

use super::InventoryService;
use crate::error::LedgerResult;
use crate::store::{InventoryStore, Pagination, TransactionFilter, TransactionPage};

impl<S: InventoryStore> InventoryService<S> {
    /// Filtered log read. `None` pagination uses the configured default page.
    #[instrument(skip(self, filter), err)]
    pub async fn query_transactions(
        &self,
        filter: TransactionFilter,
        pagination: Option<Pagination>,
    ) -> LedgerResult<TransactionPage> {
        let pagination = pagination
            .unwrap_or_else(|| Pagination::new(Some(self.config.default_page_size), None))
            .capped(self.config.max_page_size);
        Ok(self.store.query(filter, pagination).await?)
    }

    pub async fn transactions_for_variant(
        &self,
        variant_id: VariantId,
        pagination: Option<Pagination>,
    ) -> LedgerResult<TransactionPage> {
        self.query_transactions(TransactionFilter::for_variant(variant_id), pagination)
            .await
    }

    /// Entries created in `[from, to]`.
    pub async fn transactions_in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        pagination: Option<Pagination>,
    ) -> LedgerResult<TransactionPage> {
        self.query_transactions(TransactionFilter::between(from, to), pagination)
            .await
    }

    pub async fn transactions_for_batch(
        &self,
        batch_id: &str,
        pagination: Option<Pagination>,
    ) -> LedgerResult<TransactionPage> {
        self.query_transactions(TransactionFilter::for_batch(batch_id), pagination)
            .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use stockledger_core::UserId;
    use stockledger_inventory::TransactionType;

    use super::*;
    use crate::config::LedgerConfig;
    use crate::service::fixtures::Fixture;
    use crate::service::{
        Actor, AdjustRequest, InventoryService, ReceiveRequest, ReserveRequest,
    };

    #[tokio::test]
    async fn batch_and_variant_reads_filter_the_log() {
        let fx = Fixture::new();
        let counter = Actor::user(UserId::new()).in_batch("COUNT-7");

        fx.service
            .receive(ReceiveRequest::new(fx.each.id, fx.pick.id, 10, "PO-1"))
            .await
            .unwrap();
        fx.service
            .adjust(AdjustRequest::new(fx.each.id, fx.pick.id, -2).by(counter.clone()))
            .await
            .unwrap();
        fx.service
            .adjust(AdjustRequest::new(fx.each.id, fx.pick.id, 1).by(counter.clone()))
            .await
            .unwrap();

        let batch = fx.service.transactions_for_batch("COUNT-7", None).await.unwrap();
        assert_eq!(batch.total, 2);
        assert!(batch
            .transactions
            .iter()
            .all(|t| t.transaction_type == TransactionType::Adjustment && t.user_id == counter.user_id));

        let all = fx.service.transactions_for_variant(fx.each.id, None).await.unwrap();
        assert_eq!(all.total, 3);
        let seqs: Vec<_> = all.transactions.iter().map(|t| t.sequence_number).collect();
        assert!(seqs.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn range_reads_are_inclusive_of_now() {
        let fx = Fixture::new();
        let start = Utc::now() - Duration::seconds(1);
        fx.seed(fx.each.id, fx.pick.id, 10, 0);
        fx.service
            .reserve(ReserveRequest::new(fx.each.id, fx.pick.id, 1, "SO-1"))
            .await
            .unwrap();
        let end = Utc::now() + Duration::seconds(1);

        let page = fx.service.transactions_in_range(start, end, None).await.unwrap();
        assert_eq!(page.total, 1);

        let empty = fx
            .service
            .transactions_in_range(end, end + Duration::seconds(1), None)
            .await
            .unwrap();
        assert_eq!(empty.total, 0);
    }

    #[tokio::test]
    async fn page_size_is_capped_by_config() {
        let fx = Fixture::new();
        let service = InventoryService::with_config(
            fx.store.clone(),
            LedgerConfig::default().with_max_page_size(2),
        );
        fx.seed(fx.each.id, fx.pick.id, 100, 0);
        for i in 0..5 {
            service
                .reserve(ReserveRequest::new(fx.each.id, fx.pick.id, 1, format!("SO-{i}")))
                .await
                .unwrap();
        }

        let page = service
            .transactions_for_variant(fx.each.id, Some(Pagination::new(Some(100), Some(1))))
            .await
            .unwrap();
        assert_eq!(page.transactions.len(), 2);
        assert_eq!(page.total, 5);
        assert_eq!(page.pagination.offset, 1);
        assert!(page.has_more);
    }
}
