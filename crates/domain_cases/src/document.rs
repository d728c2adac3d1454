//! Case documents and attachment classification

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use core_kernel::{AttachmentId, CaseId, DocumentId};
use crate::error::CaseError;

/// Kind of document attached to a case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    Policy,
    Petition,
    Fir,
    Medical,
    SpotPhoto,
    Dl,
    Rc,
    Permit,
    Other,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Policy => "POLICY",
            DocumentType::Petition => "PETITION",
            DocumentType::Fir => "FIR",
            DocumentType::Medical => "MEDICAL",
            DocumentType::SpotPhoto => "SPOT_PHOTO",
            DocumentType::Dl => "DL",
            DocumentType::Rc => "RC",
            DocumentType::Permit => "PERMIT",
            DocumentType::Other => "OTHER",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            DocumentType::Policy => "Policy Document",
            DocumentType::Petition => "Petition Copy",
            DocumentType::Fir => "FIR Copy",
            DocumentType::Medical => "Medical Report",
            DocumentType::SpotPhoto => "Spot Photograph",
            DocumentType::Dl => "Driving License",
            DocumentType::Rc => "Registration Certificate",
            DocumentType::Permit => "Permit",
            DocumentType::Other => "Other",
        }
    }
}

impl FromStr for DocumentType {
    type Err = CaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "POLICY" => Ok(DocumentType::Policy),
            "PETITION" => Ok(DocumentType::Petition),
            "FIR" => Ok(DocumentType::Fir),
            "MEDICAL" => Ok(DocumentType::Medical),
            "SPOT_PHOTO" => Ok(DocumentType::SpotPhoto),
            "DL" => Ok(DocumentType::Dl),
            "RC" => Ok(DocumentType::Rc),
            "PERMIT" => Ok(DocumentType::Permit),
            "OTHER" => Ok(DocumentType::Other),
            _ => Err(CaseError::unknown("document type", s)),
        }
    }
}

/// Classifies an attachment by keyword, first match wins
///
/// Only the first 500 characters of extracted text are inspected, and only
/// the policy and FIR rules look at text at all.
pub fn classify_document(filename: &str, text: &str) -> DocumentType {
    let name = filename.to_lowercase();
    let head: String = text.chars().take(500).collect::<String>().to_lowercase();

    if name.contains("policy") || head.contains("policy") {
        DocumentType::Policy
    } else if name.contains("petition") {
        DocumentType::Petition
    } else if name.contains("fir") || head.contains("fir") {
        DocumentType::Fir
    } else if name.contains("medical") || name.contains("hospital") {
        DocumentType::Medical
    } else if name.contains("spot") || name.contains("photo") {
        DocumentType::SpotPhoto
    } else if name.contains("dl") || name.contains("driving") {
        DocumentType::Dl
    } else if name.contains("rc") || name.contains("registration") {
        DocumentType::Rc
    } else if name.contains("permit") {
        DocumentType::Permit
    } else {
        DocumentType::Other
    }
}

/// A document linked to a case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseDocument {
    pub id: DocumentId,
    pub case_id: CaseId,
    /// Source attachment when the document came in by email
    pub attachment_id: Option<AttachmentId>,
    pub document_type: DocumentType,
    pub document_name: String,
    pub file_path: Option<String>,
    pub extracted_text: String,
    pub created_at: DateTime<Utc>,
}

impl CaseDocument {
    /// Creates a document, classifying it from its name and text
    pub fn classified(
        case_id: CaseId,
        attachment_id: Option<AttachmentId>,
        document_name: &str,
        extracted_text: &str,
    ) -> Self {
        Self {
            id: DocumentId::new_v7(),
            case_id,
            attachment_id,
            document_type: classify_document(document_name, extracted_text),
            document_name: document_name.to_string(),
            file_path: None,
            extracted_text: extracted_text.to_string(),
            created_at: Utc::now(),
        }
    }
}
