//! Case and report status values and the allowed status workflow

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CaseError;

/// Overall case status as tracked on the MIS sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseStatus {
    /// Received, not yet worked
    Open,
    /// Work in progress
    #[serde(rename = "WIP")]
    Wip,
    /// Investigation finished, report ready
    Completed,
    /// Report dispatched to the client
    Dispatch,
    /// Closed
    Closed,
}

impl CaseStatus {
    pub const ALL: [CaseStatus; 5] = [
        CaseStatus::Open,
        CaseStatus::Wip,
        CaseStatus::Completed,
        CaseStatus::Dispatch,
        CaseStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Open => "Open",
            CaseStatus::Wip => "WIP",
            CaseStatus::Completed => "Completed",
            CaseStatus::Dispatch => "Dispatch",
            CaseStatus::Closed => "Closed",
        }
    }

    /// Whether moving to `target` is part of the workflow
    pub fn can_transition_to(&self, target: CaseStatus) -> bool {
        use CaseStatus::*;
        matches!(
            (*self, target),
            (Open, Wip) |
            (Open, Closed) |
            (Wip, Completed) |
            (Wip, Closed) |
            (Completed, Dispatch) |
            (Completed, Closed) |
            (Dispatch, Closed) |
            (Closed, Open)
        )
    }

    /// Statuses counted as done on the dashboard
    pub fn is_finished(&self) -> bool {
        matches!(self, CaseStatus::Completed | CaseStatus::Dispatch | CaseStatus::Closed)
    }

    /// Label used by the status distribution chart
    pub fn dashboard_label(&self) -> &'static str {
        match self {
            CaseStatus::Open => "New",
            CaseStatus::Wip => "In Progress",
            CaseStatus::Completed => "Completed",
            CaseStatus::Dispatch => "Dispatched",
            CaseStatus::Closed => "Closed",
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaseStatus {
    type Err = CaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OPEN" => Ok(CaseStatus::Open),
            "WIP" | "IN_PROGRESS" => Ok(CaseStatus::Wip),
            "COMPLETED" => Ok(CaseStatus::Completed),
            "DISPATCH" => Ok(CaseStatus::Dispatch),
            "CLOSED" => Ok(CaseStatus::Closed),
            _ => Err(CaseError::unknown("case status", s)),
        }
    }
}

/// Investigation report status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReportStatus {
    #[default]
    Pending,
    Draft,
    Completed,
    Dispatch,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "Pending",
            ReportStatus::Draft => "Draft",
            ReportStatus::Completed => "Completed",
            ReportStatus::Dispatch => "Dispatch",
        }
    }
}

impl FromStr for ReportStatus {
    type Err = CaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(ReportStatus::Pending),
            "DRAFT" => Ok(ReportStatus::Draft),
            "COMPLETED" => Ok(ReportStatus::Completed),
            "DISPATCH" => Ok(ReportStatus::Dispatch),
            _ => Err(CaseError::unknown("report status", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_str() {
        for status in CaseStatus::ALL {
            assert_eq!(status.as_str().parse::<CaseStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_no_self_transitions() {
        for status in CaseStatus::ALL {
            assert!(!status.can_transition_to(status));
        }
    }
}
