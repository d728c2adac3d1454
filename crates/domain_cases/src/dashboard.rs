//! Dashboard aggregates

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::humanize_elapsed;
use crate::case::InsuranceCase;
use crate::status::CaseStatus;

/// Headline counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseStats {
    pub total_cases: i64,
    /// Cases in WIP
    pub active_investigations: i64,
    /// Completed, dispatched or closed
    pub completed_cases: i64,
    pub overdue_cases: i64,
    /// Cases still Open
    pub pending_cases: i64,
}

impl CaseStats {
    /// Builds the counters from per-status totals
    pub fn from_status_counts(counts: &[(CaseStatus, i64)], overdue_cases: i64) -> Self {
        let mut stats = CaseStats { overdue_cases, ..Default::default() };
        for (status, count) in counts {
            stats.total_cases += count;
            match status {
                CaseStatus::Open => stats.pending_cases += count,
                CaseStatus::Wip => stats.active_investigations += count,
                _ => stats.completed_cases += count,
            }
        }
        stats
    }

    /// Computes the counters over in-memory cases
    pub fn compute(cases: &[InsuranceCase], today: NaiveDate) -> Self {
        let counts: Vec<(CaseStatus, i64)> = cases.iter().map(|c| (c.status, 1)).collect();
        let overdue = cases.iter().filter(|c| c.is_overdue(today)).count() as i64;
        Self::from_status_counts(&counts, overdue)
    }
}

/// One bar of the monthly volume chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseVolume {
    /// Short month name, e.g. `Mar`
    pub month: String,
    pub total: i64,
    pub completed: i64,
}

/// Six consecutive months ending with the month of `today`, zero-filled
///
/// `rows` holds `(first day of month, total, completed)` tuples as returned
/// by the store; months without a row are reported as zero.
pub fn case_volume_window(rows: &[(NaiveDate, i64, i64)], today: NaiveDate) -> Vec<CaseVolume> {
    (0..6)
        .rev()
        .map(|back| {
            let (year, month) = months_back(today.year(), today.month(), back);
            let (total, completed) = rows
                .iter()
                .filter(|(start, _, _)| start.year() == year && start.month() == month)
                .fold((0, 0), |(t, c), (_, total, completed)| (t + total, c + completed));
            let label = NaiveDate::from_ymd_opt(year, month, 1)
                .map(|d| d.format("%b").to_string())
                .unwrap_or_default();
            CaseVolume { month: label, total, completed }
        })
        .collect()
}

fn months_back(year: i32, month: u32, back: u32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 - back as i32;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

/// One slice of the status distribution chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub label: String,
    pub count: i64,
}

impl StatusCount {
    /// Labels and sorts per-status counts, largest first
    pub fn distribution(counts: &[(CaseStatus, i64)]) -> Vec<StatusCount> {
        let mut slices: Vec<StatusCount> = counts
            .iter()
            .filter(|(_, count)| *count > 0)
            .map(|(status, count)| StatusCount {
                label: status.dashboard_label().to_string(),
                count: *count,
            })
            .collect();
        slices.sort_by(|a, b| b.count.cmp(&a.count));
        slices
    }
}

/// Activity feed entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentActivity {
    #[serde(rename = "type")]
    pub activity_type: String,
    pub text: String,
    pub time: String,
}

impl RecentActivity {
    pub fn for_case(case_number: &str, title: &str, updated_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            activity_type: "status_change".to_string(),
            text: format!("Case {} - {}", case_number, title),
            time: humanize_elapsed(updated_at, now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_months_back_wraps_year() {
        assert_eq!(months_back(2025, 2, 0), (2025, 2));
        assert_eq!(months_back(2025, 2, 2), (2024, 12));
        assert_eq!(months_back(2025, 2, 5), (2024, 9));
    }
}
