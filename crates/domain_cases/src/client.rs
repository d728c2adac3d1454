//! Client (insurance company) reference data

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::ClientId;
use crate::checklist::InvestigationChecklist;
use crate::error::CaseError;

/// Per-investigation rates agreed with a client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvestigationRates {
    pub insured: Option<Decimal>,
    pub notice_134: Option<Decimal>,
    pub claimant: Option<Decimal>,
    pub income: Option<Decimal>,
    pub driver: Option<Decimal>,
    pub dl: Option<Decimal>,
    pub rc: Option<Decimal>,
    pub permit: Option<Decimal>,
    pub spot: Option<Decimal>,
    pub court: Option<Decimal>,
    pub notice: Option<Decimal>,
    pub rti: Option<Decimal>,
    pub hospital: Option<Decimal>,
}

/// An insurer the desk investigates cases for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    /// Short unique code, e.g. `SBIG`
    pub client_code: String,
    pub client_name: String,
    pub location: Option<String>,
    pub date_of_commencement: Option<NaiveDate>,
    pub rates: InvestigationRates,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    pub const MAX_CODE_LEN: usize = 20;

    /// Creates an active client with no agreed rates
    pub fn new(client_code: &str, client_name: &str) -> Result<Self, CaseError> {
        let code = client_code.trim();
        let name = client_name.trim();
        if code.is_empty() || code.len() > Self::MAX_CODE_LEN {
            return Err(CaseError::Validation(format!(
                "client code must be 1-{} characters",
                Self::MAX_CODE_LEN
            )));
        }
        if name.is_empty() {
            return Err(CaseError::Validation("client name is required".to_string()));
        }

        let now = Utc::now();
        Ok(Self {
            id: ClientId::new_v7(),
            client_code: code.to_uppercase(),
            client_name: name.to_string(),
            location: None,
            date_of_commencement: None,
            rates: InvestigationRates::default(),
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Case-insensitive containment match used when linking intake cases to clients
    pub fn matches_name(&self, name: &str) -> bool {
        let needle = name.trim().to_lowercase();
        !needle.is_empty() && self.client_name.to_lowercase().contains(&needle)
    }

    /// Billable amount for the checklist items already done
    ///
    /// Items without an agreed rate contribute nothing.
    pub fn investigation_charges(&self, checklist: &InvestigationChecklist) -> Decimal {
        let r = &self.rates;
        [
            (checklist.insured, r.insured),
            (checklist.notice_134, r.notice_134),
            (checklist.claimant, r.claimant),
            (checklist.income, r.income),
            (checklist.driver, r.driver),
            (checklist.dl, r.dl),
            (checklist.rc, r.rc),
            (checklist.permit, r.permit),
            (checklist.spot, r.spot),
            (checklist.court, r.court),
            (checklist.notice, r.notice),
            (checklist.rti, r.rti),
            (checklist.hospital, r.hospital),
        ]
        .into_iter()
        .filter(|(done, _)| *done)
        .filter_map(|(_, rate)| rate)
        .sum()
    }
}
