//! Invoice status lifecycle.
//!
//! `Pending` is the initial state. `Paid` and `Cancelled` are terminal.
//! `Overdue` is system-derived: a `Pending` invoice whose due date has passed.
//! Overdue-ness is also persisted by the recomputation sweep so that stored
//! listings agree across readers; [`resolved_status`] answers the displayed
//! status on reads that may race the sweep.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    /// Terminal states admit no further automatic transition.
    pub fn is_terminal(self) -> bool {
        matches!(self, InvoiceStatus::Paid | InvoiceStatus::Cancelled)
    }

    /// Financially open: still awaiting payment. These are the states that
    /// block deletion of the referenced customer.
    pub fn is_open(self) -> bool {
        matches!(self, InvoiceStatus::Pending | InvoiceStatus::Overdue)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }
}

impl core::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InvoiceStatus::Pending),
            "paid" => Ok(InvoiceStatus::Paid),
            "overdue" => Ok(InvoiceStatus::Overdue),
            "cancelled" => Ok(InvoiceStatus::Cancelled),
            other => Err(format!("unknown invoice status: {other:?}")),
        }
    }
}

/// Status as it should be displayed on a read path.
///
/// A stored `Pending` whose due date has already passed reads as `Overdue`
/// even if the persistence sweep has not caught up yet. A due date of exactly
/// `today` is not yet overdue.
pub fn resolved_status(
    stored: InvoiceStatus,
    due_date: Option<NaiveDate>,
    today: NaiveDate,
) -> InvoiceStatus {
    match (stored, due_date) {
        (InvoiceStatus::Pending, Some(due)) if due < today => InvoiceStatus::Overdue,
        (status, _) => status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn pending_with_elapsed_due_resolves_overdue() {
        let status = resolved_status(
            InvoiceStatus::Pending,
            Some(day(2024, 1, 10)),
            day(2024, 1, 11),
        );
        assert_eq!(status, InvoiceStatus::Overdue);
    }

    #[test]
    fn due_today_is_not_overdue() {
        let status = resolved_status(
            InvoiceStatus::Pending,
            Some(day(2024, 1, 10)),
            day(2024, 1, 10),
        );
        assert_eq!(status, InvoiceStatus::Pending);
    }

    #[test]
    fn absent_due_date_never_resolves_overdue() {
        let status = resolved_status(InvoiceStatus::Pending, None, day(2030, 1, 1));
        assert_eq!(status, InvoiceStatus::Pending);
    }

    #[test]
    fn terminal_states_are_left_alone() {
        for status in [InvoiceStatus::Paid, InvoiceStatus::Cancelled] {
            assert_eq!(
                resolved_status(status, Some(day(2020, 1, 1)), day(2024, 1, 1)),
                status
            );
        }
    }

    #[test]
    fn wire_casing_is_lowercase() {
        assert_eq!(InvoiceStatus::Overdue.as_str(), "overdue");
        assert_eq!(
            "cancelled".parse::<InvoiceStatus>().unwrap(),
            InvoiceStatus::Cancelled
        );
    }
}
