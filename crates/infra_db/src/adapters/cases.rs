//! PostgreSQL case store
//!
//! The intake pipeline's view of the case book, backed by the case and
//! client repositories.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use domain_cases::{CaseDocument, Client, InsuranceCase};
use domain_intake::{CaseStore, IntakeError};

use crate::repositories::{CaseRepository, ClientRepository};

/// PostgreSQL-backed implementation of the CaseStore port
#[derive(Debug, Clone)]
pub struct PgCaseStore {
    cases: CaseRepository,
    clients: ClientRepository,
}

impl PgCaseStore {
    /// Creates the store
    ///
    /// # Arguments
    ///
    /// * `pool` - The PostgreSQL connection pool
    pub fn new(pool: PgPool) -> Self {
        Self {
            cases: CaseRepository::new(pool.clone()),
            clients: ClientRepository::new(pool),
        }
    }
}

#[async_trait]
impl CaseStore for PgCaseStore {
    async fn find_by_claim_number(&self, claim_number: &str) -> Result<Option<InsuranceCase>, IntakeError> {
        Ok(self.cases.find_by_claim_number(claim_number).await?)
    }

    async fn find_client_by_name(&self, name: &str) -> Result<Option<Client>, IntakeError> {
        Ok(self.clients.find_by_name(name).await?)
    }

    #[instrument(skip(self, case), fields(claim_number = %case.claim_number, case_id = %case.id))]
    async fn insert_case(&self, case: &InsuranceCase) -> Result<(), IntakeError> {
        Ok(self.cases.insert(case).await?)
    }

    #[instrument(skip(self, case), fields(claim_number = %case.claim_number, case_id = %case.id))]
    async fn update_case(&self, case: &InsuranceCase) -> Result<(), IntakeError> {
        Ok(self.cases.update(case).await?)
    }

    async fn add_documents(&self, documents: &[CaseDocument]) -> Result<(), IntakeError> {
        Ok(self.cases.add_documents(documents).await?)
    }
}
