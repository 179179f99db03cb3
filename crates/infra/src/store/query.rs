//! Audit-trail query types.
//!
//! All reads of the transaction log are filtered and paginated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_core::{LocationId, VariantId};
use stockledger_inventory::{InventoryTransaction, TransactionType};

/// Hard ceiling on a single page, whatever the configuration says.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Pagination parameters for log queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub limit: u32,
    /// 0-based.
    pub offset: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
        }
    }
}

impl Pagination {
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self {
            limit: limit.unwrap_or(50).min(MAX_PAGE_SIZE),
            offset: offset.unwrap_or(0),
        }
    }

    /// Clamp the limit to a configured maximum (never above [`MAX_PAGE_SIZE`]).
    pub fn capped(self, max: u32) -> Self {
        Self {
            limit: self.limit.min(max).min(MAX_PAGE_SIZE),
            offset: self.offset,
        }
    }
}

/// Filter criteria for log queries. Every field is optional; `None` matches
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionFilter {
    pub variant_id: Option<VariantId>,
    /// Matches entries whose from- or to-location is this one.
    pub location_id: Option<LocationId>,
    pub transaction_type: Option<TransactionType>,
    pub order_id: Option<String>,
    pub reference_id: Option<String>,
    pub batch_id: Option<String>,
    /// Inclusive lower bound on `created_at`.
    pub created_after: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub created_before: Option<DateTime<Utc>>,
}

impl TransactionFilter {
    pub fn for_variant(variant_id: VariantId) -> Self {
        Self {
            variant_id: Some(variant_id),
            ..Default::default()
        }
    }

    pub fn for_batch(batch_id: impl Into<String>) -> Self {
        Self {
            batch_id: Some(batch_id.into()),
            ..Default::default()
        }
    }

    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            created_after: Some(from),
            created_before: Some(to),
            ..Default::default()
        }
    }

    /// In-process evaluation, used by the in-memory log.
    pub fn matches(&self, tx: &InventoryTransaction) -> bool {
        self.variant_id.is_none_or(|v| tx.variant_id == v)
            && self.location_id.is_none_or(|l| tx.touches(l))
            && self.transaction_type.is_none_or(|t| tx.transaction_type == t)
            && self
                .order_id
                .as_deref()
                .is_none_or(|o| tx.order_id.as_deref() == Some(o))
            && self
                .reference_id
                .as_deref()
                .is_none_or(|r| tx.reference_id.as_deref() == Some(r))
            && self
                .batch_id
                .as_deref()
                .is_none_or(|b| tx.batch_id.as_deref() == Some(b))
            && self.created_after.is_none_or(|t| tx.created_at >= t)
            && self.created_before.is_none_or(|t| tx.created_at <= t)
    }
}

/// One page of log entries, ordered by sequence number (ascending).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPage {
    pub transactions: Vec<InventoryTransaction>,
    /// Entries matching the filter across all pages.
    pub total: u64,
    pub pagination: Pagination,
    pub has_more: bool,
}

impl TransactionPage {
    pub fn new(transactions: Vec<InventoryTransaction>, total: u64, pagination: Pagination) -> Self {
        let has_more = total > u64::from(pagination.offset) + u64::from(pagination.limit);
        Self {
            transactions,
            total,
            pagination,
            has_more,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use stockledger_core::TransactionId;
    use stockledger_inventory::{PendingTransaction, QtySnapshot, StockState};

    fn tx(variant_id: VariantId, location_id: LocationId) -> InventoryTransaction {
        PendingTransaction::new(
            variant_id,
            TransactionType::Pick,
            StockState::OnHand,
            StockState::Picked,
            QtySnapshot::new(5, 3),
        )
        .from_location(location_id)
        .for_order("SO-9", None)
        .actor(None, Some("WAVE-1".to_string()))
        .commit(TransactionId::new(), 1, Utc::now())
    }

    #[test]
    fn pagination_is_capped() {
        assert_eq!(Pagination::new(Some(5000), None).limit, MAX_PAGE_SIZE);
        assert_eq!(Pagination::new(Some(200), Some(3)).capped(100).limit, 100);
        assert_eq!(Pagination::default().capped(5000).limit, 50);
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(TransactionFilter::default().matches(&tx(VariantId::new(), LocationId::new())));
    }

    #[test]
    fn filter_fields_are_conjunctive() {
        let v = VariantId::new();
        let l = LocationId::new();
        let entry = tx(v, l);

        let mut f = TransactionFilter::for_variant(v);
        f.location_id = Some(l);
        f.order_id = Some("SO-9".to_string());
        assert!(f.matches(&entry));

        f.batch_id = Some("WAVE-2".to_string());
        assert!(!f.matches(&entry));

        assert!(TransactionFilter::for_batch("WAVE-1").matches(&entry));
        assert!(!TransactionFilter::for_variant(VariantId::new()).matches(&entry));
    }

    #[test]
    fn date_range_is_inclusive() {
        let entry = tx(VariantId::new(), LocationId::new());
        let at = entry.created_at;
        assert!(TransactionFilter::between(at, at).matches(&entry));
        assert!(!TransactionFilter::between(at + Duration::seconds(1), at + Duration::seconds(2))
            .matches(&entry));
    }

    #[test]
    fn page_reports_more_when_total_exceeds_window() {
        let page = TransactionPage::new(vec![], 120, Pagination::new(Some(50), Some(50)));
        assert!(page.has_more);
        let last = TransactionPage::new(vec![], 100, Pagination::new(Some(50), Some(50)));
        assert!(!last.has_more);
    }
}
