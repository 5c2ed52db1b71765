use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// An inclusive date range. An open bound means "unbounded on that side".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DateRange {
    /// First day included in the range (YYYY-MM-DD).
    pub from: Option<NaiveDate>,
    /// Last day included in the range (YYYY-MM-DD).
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

/// Filter for listing transaction log entries.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema, IntoParams)]
pub struct TransactionFilter {
    /// Restrict to a transaction kind ("allocation", "expense", "refund").
    pub kind: Option<String>,
    /// Transactions sent by this account.
    pub sender_id: Option<i32>,
    /// Transactions received by this account.
    pub receiver_id: Option<i32>,
    /// Transactions either sent or received by this account.
    pub party_id: Option<i32>,
    /// Transactions linked to this expense.
    pub expense_id: Option<i32>,
    /// First day included (YYYY-MM-DD).
    pub from: Option<NaiveDate>,
    /// Last day included (YYYY-MM-DD).
    pub to: Option<NaiveDate>,
}

impl TransactionFilter {
    pub fn date_range(&self) -> DateRange {
        DateRange::new(self.from, self.to)
    }
}

/// Filter for listing expense claims.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema, IntoParams)]
pub struct ExpenseFilter {
    /// Expenses submitted by this employee.
    pub employee_id: Option<i32>,
    /// Expenses reviewed by this admin.
    pub admin_id: Option<i32>,
    /// Restrict to a workflow status ("pending", "approved", "rejected").
    pub status: Option<String>,
    /// Restrict to a site.
    pub site_name: Option<String>,
    /// First day included (YYYY-MM-DD).
    pub from: Option<NaiveDate>,
    /// Last day included (YYYY-MM-DD).
    pub to: Option<NaiveDate>,
}

impl ExpenseFilter {
    pub fn date_range(&self) -> DateRange {
        DateRange::new(self.from, self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn date_range_bounds() {
        let range = DateRange::default();
        assert!(range.is_unbounded());

        let range = DateRange::new(NaiveDate::from_ymd_opt(2025, 1, 1), None);
        assert!(!range.is_unbounded());
    }

    #[test]
    fn transaction_filter_roundtrip() {
        let filter = TransactionFilter {
            kind: Some("allocation".to_string()),
            party_id: Some(7),
            from: NaiveDate::from_ymd_opt(2025, 3, 1),
            ..Default::default()
        };
        let json = serde_json::to_string(&filter).unwrap();
        let back: TransactionFilter = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind.as_deref(), Some("allocation"));
        assert_eq!(back.party_id, Some(7));
        assert_eq!(back.from, NaiveDate::from_ymd_opt(2025, 3, 1));
    }
}
