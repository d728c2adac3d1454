//! Insurance case aggregate

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use core_kernel::{
    add_days, receipt_month, CaseId, ClientId, EmailIntakeId, GeoPoint, UserId, VendorId,
};
use crate::checklist::InvestigationChecklist;
use crate::error::CaseError;
use crate::status::{CaseStatus, ReportStatus};

/// Days between receipt and the due date unless the client agreed otherwise
pub const DEFAULT_DUE_DAYS: i64 = 30;

pub const SLA_WITHIN: &str = "Within SLA";
pub const SLA_BREACHED: &str = "SLA Breached";

/// Case category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CaseCategory {
    /// Motor Accident Claims Tribunal
    Mact,
    Civil,
    Criminal,
    Other,
}

impl CaseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseCategory::Mact => "MACT",
            CaseCategory::Civil => "CIVIL",
            CaseCategory::Criminal => "CRIMINAL",
            CaseCategory::Other => "OTHER",
        }
    }
}

impl FromStr for CaseCategory {
    type Err = CaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MACT" => Ok(CaseCategory::Mact),
            "CIVIL" => Ok(CaseCategory::Civil),
            "CRIMINAL" => Ok(CaseCategory::Criminal),
            "OTHER" => Ok(CaseCategory::Other),
            _ => Err(CaseError::unknown("category", s)),
        }
    }
}

/// Scope of the investigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseType {
    #[serde(rename = "Full Case")]
    FullCase,
    #[serde(rename = "Connected Case")]
    ConnectedCase,
    #[serde(rename = "Partial Investigation")]
    PartialInvestigation,
}

impl CaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseType::FullCase => "Full Case",
            CaseType::ConnectedCase => "Connected Case",
            CaseType::PartialInvestigation => "Partial Investigation",
        }
    }
}

impl FromStr for CaseType {
    type Err = CaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Full Case" => Ok(CaseType::FullCase),
            "Connected Case" => Ok(CaseType::ConnectedCase),
            "Partial Investigation" => Ok(CaseType::PartialInvestigation),
            _ => Err(CaseError::unknown("case type", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
            Priority::Urgent => "URGENT",
        }
    }
}

impl FromStr for Priority {
    type Err = CaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Priority::Low),
            "MEDIUM" => Ok(Priority::Medium),
            "HIGH" => Ok(Priority::High),
            "URGENT" => Ok(Priority::Urgent),
            _ => Err(CaseError::unknown("priority", s)),
        }
    }
}

/// How the case entered the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CaseSource {
    Manual,
    Email,
}

impl CaseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseSource::Manual => "MANUAL",
            CaseSource::Email => "EMAIL",
        }
    }
}

impl FromStr for CaseSource {
    type Err = CaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MANUAL" => Ok(CaseSource::Manual),
            "EMAIL" => Ok(CaseSource::Email),
            _ => Err(CaseError::unknown("case source", s)),
        }
    }
}

/// Name, address and verification status of a person or place on the case
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartyDetails {
    pub name: Option<String>,
    pub address: Option<String>,
    pub district: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentChecks {
    pub dl: Option<String>,
    pub rc: Option<String>,
    pub permit: Option<String>,
    pub fitness: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpotDetails {
    pub location: Option<String>,
    pub district: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoliceDetails {
    pub fir_number: Option<String>,
    pub police_station: Option<String>,
    pub police_district: Option<String>,
    pub rti_status: Option<String>,
    pub chargesheet_status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchDetails {
    pub date: Option<NaiveDate>,
    pub status: Option<String>,
}

/// Where the incident happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentLocation {
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub point: Option<GeoPoint>,
}

impl Default for IncidentLocation {
    fn default() -> Self {
        Self {
            address: String::new(),
            city: String::new(),
            state: String::new(),
            postal_code: String::new(),
            country: "India".to_string(),
            point: None,
        }
    }
}

impl IncidentLocation {
    /// `address, city, state postal_code, country`, skipping blank parts
    pub fn formatted(&self) -> String {
        let state_line = [self.state.trim(), self.postal_code.trim()]
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        [self.address.trim(), self.city.trim(), state_line.as_str(), self.country.trim()]
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Input for opening a case
#[derive(Debug, Clone)]
pub struct NewCase {
    pub claim_number: String,
    pub title: String,
    pub description: String,
    pub client_id: Option<ClientId>,
    pub client_name: String,
    pub category: CaseCategory,
    pub case_type: Option<CaseType>,
    pub priority: Priority,
    pub claimant_name: Option<String>,
    pub insured_name: Option<String>,
    pub location: IncidentLocation,
    pub receipt_date: NaiveDate,
    pub due_days: i64,
    pub created_by: Option<UserId>,
}

impl NewCase {
    /// Minimal input with defaults for everything but the claim number and client
    pub fn new(claim_number: impl Into<String>, client_name: impl Into<String>, receipt_date: NaiveDate) -> Self {
        let claim_number = claim_number.into();
        Self {
            title: format!("Claim {}", claim_number),
            claim_number,
            description: String::new(),
            client_id: None,
            client_name: client_name.into(),
            category: CaseCategory::Other,
            case_type: None,
            priority: Priority::default(),
            claimant_name: None,
            insured_name: None,
            location: IncidentLocation::default(),
            receipt_date,
            due_days: DEFAULT_DUE_DAYS,
            created_by: None,
        }
    }
}

/// An insurance investigation case
///
/// Mirrors one row of the investigation MIS sheet plus the operational
/// fields the desk needs (assignment, geo-location, checklist).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsuranceCase {
    pub id: CaseId,
    /// Internal reference, `CASE-XXXXXXXX`
    pub case_number: String,
    /// Insurer's claim number, unique across cases
    pub claim_number: String,
    pub title: String,
    pub description: String,
    pub client_id: Option<ClientId>,
    pub client_name: String,
    pub category: CaseCategory,
    pub case_type: Option<CaseType>,
    pub priority: Priority,
    pub source: CaseSource,
    pub status: CaseStatus,
    pub report_status: ReportStatus,
    /// Case Reference Number (MACT petition number)
    pub crn: Option<String>,
    pub policy_number: Option<String>,
    pub file_number: Option<String>,
    pub vehicle_registration: Option<String>,
    pub accident_date: Option<NaiveDate>,
    pub receipt_date: NaiveDate,
    pub receipt_month: String,
    pub due_date: Option<NaiveDate>,
    pub completion_date: Option<DateTime<Utc>>,
    pub completion_month: Option<String>,
    pub tat_days: Option<i64>,
    pub sla_status: Option<String>,
    pub scope_of_work: Option<String>,
    pub notes: String,
    pub claimant: PartyDetails,
    pub income: PartyDetails,
    pub insured: PartyDetails,
    /// Section 132 notice details for the insured
    pub notice_132: Option<String>,
    pub driver: PartyDetails,
    pub hospital: PartyDetails,
    pub documents: DocumentChecks,
    pub spot: SpotDetails,
    pub police: PoliceDetails,
    pub dispatch: DispatchDetails,
    pub location: IncidentLocation,
    pub checklist: InvestigationChecklist,
    pub assigned_vendor_id: Option<VendorId>,
    pub source_email_id: Option<EmailIntakeId>,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl InsuranceCase {
    /// Opens a manually entered case
    pub fn new_manual(new: NewCase) -> Result<Self, CaseError> {
        Self::open(new, CaseSource::Manual)
    }

    /// Opens a case created from an inbound email
    pub fn new_from_email(new: NewCase, email_id: EmailIntakeId) -> Result<Self, CaseError> {
        let mut case = Self::open(new, CaseSource::Email)?;
        case.source_email_id = Some(email_id);
        Ok(case)
    }

    fn open(new: NewCase, source: CaseSource) -> Result<Self, CaseError> {
        let claim_number = new.claim_number.trim().to_string();
        if claim_number.is_empty() {
            return Err(CaseError::Validation("claim number is required".to_string()));
        }
        if new.due_days < 0 {
            return Err(CaseError::Validation("due days cannot be negative".to_string()));
        }

        let now = Utc::now();
        Ok(Self {
            id: CaseId::new_v7(),
            case_number: generate_case_number(),
            claim_number,
            title: new.title,
            description: new.description,
            client_id: new.client_id,
            client_name: new.client_name,
            category: new.category,
            case_type: new.case_type,
            priority: new.priority,
            source,
            status: CaseStatus::Open,
            report_status: ReportStatus::Pending,
            crn: None,
            policy_number: None,
            file_number: None,
            vehicle_registration: None,
            accident_date: None,
            receipt_date: new.receipt_date,
            receipt_month: receipt_month(new.receipt_date),
            due_date: Some(add_days(new.receipt_date, new.due_days)),
            completion_date: None,
            completion_month: None,
            tat_days: None,
            sla_status: None,
            scope_of_work: None,
            notes: String::new(),
            claimant: PartyDetails { name: new.claimant_name, ..Default::default() },
            income: PartyDetails::default(),
            insured: PartyDetails { name: new.insured_name, ..Default::default() },
            notice_132: None,
            driver: PartyDetails::default(),
            hospital: PartyDetails::default(),
            documents: DocumentChecks::default(),
            spot: SpotDetails::default(),
            police: PoliceDetails::default(),
            dispatch: DispatchDetails::default(),
            location: new.location,
            checklist: InvestigationChecklist::default(),
            assigned_vendor_id: None,
            source_email_id: None,
            created_by: new.created_by,
            created_at: now,
            updated_at: now,
            closed_at: None,
        })
    }

    /// Moves the case along the status workflow
    pub fn update_status(&mut self, target: CaseStatus) -> Result<(), CaseError> {
        if !self.status.can_transition_to(target) {
            return Err(CaseError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: target.to_string(),
            });
        }

        let now = Utc::now();
        let today = now.date_naive();
        match target {
            CaseStatus::Completed => {
                self.completion_date = Some(now);
                self.completion_month = Some(receipt_month(today));
                self.report_status = ReportStatus::Completed;
                self.tat_days = Some(self.calculate_tat(today));
                self.sla_status = Some(self.sla_status(today).to_string());
            }
            CaseStatus::Dispatch => {
                self.dispatch.date = Some(today);
                self.dispatch.status = Some("Dispatched".to_string());
                self.report_status = ReportStatus::Dispatch;
            }
            CaseStatus::Closed => {
                self.closed_at = Some(now);
            }
            CaseStatus::Open => {
                self.closed_at = None;
            }
            CaseStatus::Wip => {}
        }

        tracing::debug!(case_number = %self.case_number, from = %self.status, to = %target, "case status changed");
        self.status = target;
        self.updated_at = now;
        Ok(())
    }

    /// Assigns the investigating vendor; a case keeps its first vendor
    pub fn assign_vendor(&mut self, vendor_id: VendorId) -> Result<(), CaseError> {
        if self.assigned_vendor_id.is_some() {
            return Err(CaseError::AlreadyAssigned);
        }
        self.assigned_vendor_id = Some(vendor_id);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Replaces the assigned vendor, returning the previous one
    pub fn reassign_vendor(&mut self, vendor_id: VendorId) -> Option<VendorId> {
        let previous = self.assigned_vendor_id.replace(vendor_id);
        self.updated_at = Utc::now();
        previous
    }

    /// Turn-around time in days: completion - receipt, or today - receipt while open
    pub fn calculate_tat(&self, today: NaiveDate) -> i64 {
        let end = self
            .completion_date
            .map(|completed| completed.date_naive())
            .unwrap_or(today);
        (end - self.receipt_date).num_days()
    }

    /// Past due and not yet finished
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.status.is_finished() && self.due_date.is_some_and(|due| today > due)
    }

    /// SLA verdict against the due date, judged at completion if completed
    pub fn sla_status(&self, today: NaiveDate) -> &'static str {
        let end = self
            .completion_date
            .map(|completed| completed.date_naive())
            .unwrap_or(today);
        match self.due_date {
            Some(due) if end > due => SLA_BREACHED,
            _ => SLA_WITHIN,
        }
    }

    /// Appends a paragraph to the case notes
    pub fn append_note(&mut self, text: &str) {
        if self.notes.is_empty() {
            self.notes = text.to_string();
        } else {
            self.notes.push_str("\n\n");
            self.notes.push_str(text);
        }
        self.updated_at = Utc::now();
    }

    /// Coordinates of the incident, when known
    pub fn point(&self) -> Option<GeoPoint> {
        self.location.point
    }

    /// Investigation progress percentage from the checklist
    pub fn investigation_progress(&self) -> u8 {
        self.checklist.progress()
    }
}

/// `CASE-` followed by eight upper-case hex digits
fn generate_case_number() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("CASE-{}", hex[..8].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_number_format() {
        let number = generate_case_number();
        assert_eq!(number.len(), 13);
        assert!(number.starts_with("CASE-"));
        assert!(number[5..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn test_formatted_location_skips_blanks() {
        let location = IncidentLocation {
            address: "12 MG Road".to_string(),
            city: "Pune".to_string(),
            state: "MH".to_string(),
            postal_code: String::new(),
            country: "India".to_string(),
            point: None,
        };
        assert_eq!(location.formatted(), "12 MG Road, Pune, MH, India");
    }
}
