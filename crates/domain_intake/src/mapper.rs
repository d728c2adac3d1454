//! Turning extracted fields into cases
//!
//! Pure functions: the intake service looks cases and clients up through
//! its ports and hands the results here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{CaseId, EmailIntakeId};
use domain_cases::{CaseDocument, CaseError, Client, InsuranceCase, NewCase};

use crate::extractor::CaseExtraction;
use crate::message::StoredAttachment;

/// Initial status of parties that still need a field visit
pub const TO_BE_VERIFIED: &str = "To be verified";
/// Initial status of document, spot and police checks
pub const PENDING: &str = "Pending";

/// What mapping an email did to the case book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MappingOutcome {
    Created { case_id: CaseId, claim_number: String },
    Updated { case_id: CaseId, claim_number: String },
    /// No claim number could be found
    Skipped,
}

impl MappingOutcome {
    pub fn case_id(&self) -> Option<CaseId> {
        match self {
            MappingOutcome::Created { case_id, .. } | MappingOutcome::Updated { case_id, .. } => Some(*case_id),
            MappingOutcome::Skipped => None,
        }
    }
}

/// Opens an email-sourced case populated from the extraction
pub fn build_case(
    extraction: &CaseExtraction,
    client: Option<&Client>,
    email_id: EmailIntakeId,
    subject: &str,
    due_days: i64,
) -> Result<InsuranceCase, CaseError> {
    let claim_number = extraction
        .claim_number
        .clone()
        .ok_or_else(|| CaseError::Validation("claim number is required".to_string()))?;

    let mut new = NewCase::new(claim_number, extraction.client_name.clone(), extraction.receipt_date);
    new.description = subject.to_string();
    new.client_id = client.map(|c| c.id);
    new.category = extraction.category;
    new.case_type = extraction.case_type;
    new.claimant_name = extraction.claimant_name.clone();
    new.insured_name = extraction.insured_name.clone();
    new.due_days = due_days;

    let mut case = InsuranceCase::new_from_email(new, email_id)?;
    case.crn = extraction.crn.clone();
    case.policy_number = extraction.policy_number.clone();
    case.file_number = extraction.file_number.clone();
    case.vehicle_registration = extraction.vehicle_registration.clone();
    case.accident_date = extraction.accident_date;
    case.scope_of_work = extraction.scope_of_work.clone();

    case.claimant.address = extraction.claimant_address.clone();
    case.claimant.district = extraction.claimant_district.clone();
    case.claimant.status = Some(TO_BE_VERIFIED.to_string());

    case.insured.address = extraction.insured_address.clone();
    case.insured.district = extraction.spot_district.clone();
    case.insured.status = Some(TO_BE_VERIFIED.to_string());

    if let Some(driver) = &extraction.driver_name {
        case.driver.name = Some(driver.clone());
        case.driver.status = Some(TO_BE_VERIFIED.to_string());
    }

    case.spot.location = extraction.spot_location.clone();
    case.spot.district = extraction.spot_district.clone();
    if extraction.spot_location.is_some() {
        case.spot.status = Some(PENDING.to_string());
    }

    for check in [
        &mut case.documents.dl,
        &mut case.documents.rc,
        &mut case.documents.permit,
        &mut case.documents.fitness,
        &mut case.police.rti_status,
        &mut case.police.chargesheet_status,
    ] {
        *check = Some(PENDING.to_string());
    }

    case.append_note(&format!(
        "Auto-created from email: {}\n\nExtracted data includes: Policy#{}, MACT#{}",
        subject,
        extraction.policy_number.as_deref().unwrap_or_default(),
        extraction.crn.as_deref().unwrap_or_default(),
    ));
    Ok(case)
}

fn fill(slot: &mut Option<String>, value: &Option<String>, name: &'static str, filled: &mut Vec<&'static str>) {
    let empty = slot.as_deref().map_or(true, |s| s.trim().is_empty());
    if empty {
        if let Some(value) = value {
            *slot = Some(value.clone());
            filled.push(name);
        }
    }
}

/// Fills gaps in an existing case and notes the update
///
/// Only empty fields are written; anything an investigator already
/// entered is left alone. Returns the names of the fields filled.
pub fn apply_update(
    case: &mut InsuranceCase,
    extraction: &CaseExtraction,
    subject: &str,
    now: DateTime<Utc>,
) -> Vec<&'static str> {
    let mut filled = Vec::new();
    fill(&mut case.policy_number, &extraction.policy_number, "policy_number", &mut filled);
    fill(&mut case.claimant.name, &extraction.claimant_name, "claimant_name", &mut filled);
    fill(&mut case.insured.name, &extraction.insured_name, "insured_name", &mut filled);
    fill(&mut case.insured.address, &extraction.insured_address, "insured_address", &mut filled);
    fill(&mut case.claimant.address, &extraction.claimant_address, "claimant_address", &mut filled);
    fill(&mut case.spot.location, &extraction.spot_location, "spot_location", &mut filled);

    let note = if case.notes.is_empty() {
        format!("Updated from email: {}", subject)
    } else {
        format!("Updated from email on {}: {}", now.format("%Y-%m-%d %H:%M:%S UTC"), subject)
    };
    case.append_note(&note);
    filled
}

/// Classified documents for every stored attachment
pub fn link_documents(case_id: CaseId, attachments: &[StoredAttachment]) -> Vec<CaseDocument> {
    attachments
        .iter()
        .map(|attachment| {
            let mut document = CaseDocument::classified(
                case_id,
                Some(attachment.id),
                &attachment.filename,
                &attachment.extracted_text,
            );
            document.file_path = attachment.file_path.clone();
            document
        })
        .collect()
}
