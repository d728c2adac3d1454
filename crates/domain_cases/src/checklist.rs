//! Investigation checklist

use serde::{Deserialize, Serialize};

/// Field-work items ticked off by the investigating vendor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvestigationChecklist {
    pub spot: bool,
    pub hospital: bool,
    pub claimant: bool,
    pub insured: bool,
    pub witness: bool,
    pub driver: bool,
    pub dl: bool,
    pub rc: bool,
    pub permit: bool,
    pub court: bool,
    pub notice: bool,
    pub notice_134: bool,
    pub rti: bool,
    pub medical_verification: bool,
    pub income: bool,
}

impl InvestigationChecklist {
    pub const ITEMS: usize = 15;

    fn flags(&self) -> [bool; Self::ITEMS] {
        [
            self.spot,
            self.hospital,
            self.claimant,
            self.insured,
            self.witness,
            self.driver,
            self.dl,
            self.rc,
            self.permit,
            self.court,
            self.notice,
            self.notice_134,
            self.rti,
            self.medical_verification,
            self.income,
        ]
    }

    /// Number of items done
    pub fn completed(&self) -> usize {
        self.flags().iter().filter(|done| **done).count()
    }

    /// Progress as a whole percentage, rounded down
    pub fn progress(&self) -> u8 {
        (self.completed() * 100 / Self::ITEMS) as u8
    }
}
