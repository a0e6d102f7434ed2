// Aggregate analytics over a window of disputes. Pure computation; the
// engine fetches the rows and the ride count.

use serde::Serialize;
use std::collections::HashMap;

use crate::core::dispute::{Dispute, DisputeReason, DisputeStatus};
use crate::core::money::Money;

#[derive(Debug, Clone, Serialize)]
pub struct ReasonBreakdown {
    pub reason: DisputeReason,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DisputeStats {
    pub total: u64,
    pub pending: u64,
    pub reviewing: u64,
    /// Approved and partially refunded together.
    pub approved: u64,
    pub rejected: u64,
    pub total_refunded: Money,
    pub total_disputed: Money,
    pub avg_resolution_hours: f64,
    /// Disputes per hundred rides in the window; zero when no rides ran.
    pub dispute_rate: f64,
    pub by_reason: Vec<ReasonBreakdown>,
}

pub fn compute(disputes: &[Dispute], rides_in_window: u64) -> DisputeStats {
    let total = disputes.len() as u64;

    let count_status = |wanted: &[DisputeStatus]| {
        disputes.iter().filter(|d| wanted.contains(&d.status)).count() as u64
    };

    let total_refunded: Money = disputes
        .iter()
        .filter(|d| d.resolved_at.is_some())
        .filter_map(|d| d.refund_amount)
        .sum();
    let total_disputed: Money = disputes.iter().map(|d| d.disputed_amount).sum();

    let resolution_hours: Vec<f64> = disputes
        .iter()
        .filter_map(|d| d.resolved_at.map(|at| at - d.created_at))
        .map(|elapsed| elapsed.num_seconds() as f64 / 3600.0)
        .collect();
    let avg_resolution_hours = if resolution_hours.is_empty() {
        0.0
    } else {
        resolution_hours.iter().sum::<f64>() / resolution_hours.len() as f64
    };

    let dispute_rate = if rides_in_window == 0 {
        0.0
    } else {
        total as f64 / rides_in_window as f64 * 100.0
    };

    let mut reason_counts: HashMap<DisputeReason, u64> = HashMap::new();
    for d in disputes {
        *reason_counts.entry(d.reason).or_default() += 1;
    }
    let mut by_reason: Vec<ReasonBreakdown> = reason_counts
        .into_iter()
        .map(|(reason, count)| ReasonBreakdown {
            reason,
            count,
            percentage: count as f64 / total as f64 * 100.0,
        })
        .collect();
    by_reason.sort_by(|a, b| b.count.cmp(&a.count).then(a.reason.as_str().cmp(b.reason.as_str())));

    DisputeStats {
        total,
        pending: count_status(&[DisputeStatus::Pending]),
        reviewing: count_status(&[DisputeStatus::Reviewing]),
        approved: count_status(&[DisputeStatus::Approved, DisputeStatus::PartialRefund]),
        rejected: count_status(&[DisputeStatus::Rejected]),
        total_refunded,
        total_disputed,
        avg_resolution_hours,
        dispute_rate,
        by_reason,
    }
}

#[cfg(test)]
mod dispute_stats_tests {
    use super::*;
    use crate::core::dispute::{ResolutionType, mint_dispute_number};
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn dispute(reason: DisputeReason, status: DisputeStatus) -> Dispute {
        Dispute {
            id: Uuid::now_v7(),
            number: mint_dispute_number(),
            ride_id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            driver_id: None,
            reason,
            description: "statistically significant".into(),
            status,
            original_fare: dec!(50.00),
            disputed_amount: dec!(10.00),
            refund_amount: None,
            resolution_type: None,
            resolution_note: None,
            evidence: vec![],
            resolved_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            resolved_at: None,
        }
    }

    fn resolved(reason: DisputeReason, refund: Money, hours: i64) -> Dispute {
        let mut d = dispute(reason, DisputeStatus::Approved);
        d.refund_amount = Some(refund);
        d.resolution_type = Some(ResolutionType::FullRefund);
        d.resolved_by = Some(Uuid::now_v7());
        d.resolved_at = Some(d.created_at + Duration::hours(hours));
        d
    }

    #[test]
    fn it_should_report_zeroes_over_an_empty_window() {
        let stats = compute(&[], 0);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.total_refunded, Money::ZERO);
        assert_eq!(stats.avg_resolution_hours, 0.0);
        assert_eq!(stats.dispute_rate, 0.0);
        assert!(stats.by_reason.is_empty());
    }

    #[test]
    fn it_should_aggregate_counts_amounts_and_rates() {
        let rows = vec![
            dispute(DisputeReason::Overcharged, DisputeStatus::Pending),
            dispute(DisputeReason::Overcharged, DisputeStatus::Reviewing),
            resolved(DisputeReason::WrongRoute, dec!(25.00), 2),
            resolved(DisputeReason::Overcharged, dec!(15.00), 4),
        ];
        let stats = compute(&rows, 200);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.reviewing, 1);
        assert_eq!(stats.approved, 2);
        assert_eq!(stats.rejected, 0);
        assert_eq!(stats.total_refunded, dec!(40.00));
        assert_eq!(stats.total_disputed, dec!(40.00));
        assert_eq!(stats.avg_resolution_hours, 3.0);
        assert_eq!(stats.dispute_rate, 2.0);

        assert_eq!(stats.by_reason.len(), 2);
        assert_eq!(stats.by_reason[0].reason, DisputeReason::Overcharged);
        assert_eq!(stats.by_reason[0].count, 3);
        assert_eq!(stats.by_reason[0].percentage, 75.0);
        assert_eq!(stats.by_reason[1].count, 1);
    }

    #[test]
    fn it_should_count_partial_refunds_as_approved() {
        let rows = vec![dispute(DisputeReason::Other, DisputeStatus::PartialRefund)];
        assert_eq!(compute(&rows, 0).approved, 1);
    }
}
