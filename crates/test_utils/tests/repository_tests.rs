//! Repository Tests
//!
//! Run against PostgreSQL in a container with the workspace migrations
//! applied. Ignored by default; run with `cargo test -- --ignored`.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use domain_cases::CaseStatus;
use domain_identity::{AuthToken, CodeCheck, CodePurpose, VerificationCode, MAX_CODE_ATTEMPTS};
use domain_intake::{IntakeService, ProcessingStatus, ProviderMessage};
use infra_db::adapters::{PgCaseStore, PgIntakeStore};
use infra_db::repositories::{
    CaseFilter, CaseRepository, ClientRepository, IntakeRepository, TokenRepository, UserRepository,
    VendorRepository,
};
use infra_db::{DatabaseError, Pagination};
use test_utils::{
    db_test, CaseFixtures, ClientFixtures, EmailFixtures, GeoFixtures, TestCaseBuilder, UserFixtures,
    VendorFixtures, INTIMATION_CLAIM_NUMBER,
};

mod users {
    use super::*;

    db_test!(test_user_round_trip, |pool| {
        let repo = UserRepository::new(pool);
        let user = UserFixtures::admin();
        repo.insert(&user).await.unwrap();

        let by_login = repo.find_by_login(&user.username).await.unwrap().unwrap();
        assert_eq!(by_login.id, user.id);
        let by_email = repo.find_by_login(&user.email).await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert!(repo.login_taken(&user.username, "someone@else.test").await.unwrap());
    });

    db_test!(test_duplicate_username_is_conflict, |pool| {
        let repo = UserRepository::new(pool);
        let user = UserFixtures::admin();
        repo.insert(&user).await.unwrap();

        let mut twin = UserFixtures::admin();
        twin.email = "twin@claimsdesk.test".to_string();
        assert!(matches!(repo.insert(&twin).await, Err(DatabaseError::DuplicateEntry(_))));
    });
}

mod sessions {
    use super::*;

    db_test!(test_session_tokens_revoked_per_user, |pool| {
        let users = UserRepository::new(pool.clone());
        let tokens = TokenRepository::new(pool);
        let user = UserFixtures::lawyer();
        users.insert(&user).await.unwrap();

        let first = AuthToken::issue(user.id);
        let second = AuthToken::issue(user.id);
        tokens.insert_auth_token(&first).await.unwrap();
        tokens.insert_auth_token(&second).await.unwrap();
        assert!(tokens.find_auth_token(&first.token).await.unwrap().is_some());

        assert_eq!(tokens.delete_auth_tokens_for_user(user.id).await.unwrap(), 2);
        assert!(tokens.find_auth_token(&second.token).await.unwrap().is_none());
    });

    db_test!(test_new_code_retires_older_ones, |pool| {
        let users = UserRepository::new(pool.clone());
        let tokens = TokenRepository::new(pool);
        let user = UserFixtures::admin();
        users.insert(&user).await.unwrap();

        let old = VerificationCode::issue(user.id, CodePurpose::TwoFactor);
        let new = VerificationCode::issue(user.id, CodePurpose::TwoFactor);
        tokens.issue_code(&old).await.unwrap();
        tokens.issue_code(&new).await.unwrap();

        let latest = tokens.latest_code(user.id, CodePurpose::TwoFactor).await.unwrap().unwrap();
        assert_eq!(latest.id, new.id);
        assert!(tokens.latest_code(user.id, CodePurpose::PasswordReset).await.unwrap().is_none());
    });

    db_test!(test_concurrent_redeems_use_code_once, |pool| {
        let users = UserRepository::new(pool.clone());
        let tokens = TokenRepository::new(pool);
        let user = UserFixtures::admin();
        users.insert(&user).await.unwrap();
        let code = VerificationCode::issue(user.id, CodePurpose::TwoFactor);
        tokens.issue_code(&code).await.unwrap();

        let now = Utc::now();
        let (first, second) = tokio::join!(
            tokens.attempt_code(code.id, &code.code, true, now),
            tokens.attempt_code(code.id, &code.code, true, now),
        );
        let outcomes = [first.unwrap(), second.unwrap()];

        assert_eq!(outcomes.iter().filter(|o| **o == CodeCheck::Accepted).count(), 1);
        assert!(outcomes.contains(&CodeCheck::Unusable));
        assert!(tokens.latest_code(user.id, CodePurpose::TwoFactor).await.unwrap().is_none());
    });

    db_test!(test_concurrent_wrong_guesses_stop_at_limit, |pool| {
        let users = UserRepository::new(pool.clone());
        let tokens = TokenRepository::new(pool);
        let user = UserFixtures::lawyer();
        users.insert(&user).await.unwrap();
        let code = VerificationCode::issue(user.id, CodePurpose::TwoFactor);
        tokens.issue_code(&code).await.unwrap();
        let wrong = if code.code == "000000" { "111111" } else { "000000" };

        let now = Utc::now();
        let mut guesses = tokio::task::JoinSet::new();
        for _ in 0..MAX_CODE_ATTEMPTS * 2 {
            let tokens = tokens.clone();
            guesses.spawn(async move { tokens.attempt_code(code.id, wrong, true, now).await });
        }
        let mut counted = 0;
        while let Some(outcome) = guesses.join_next().await {
            if outcome.unwrap().unwrap() == CodeCheck::Mismatch {
                counted += 1;
            }
        }

        assert_eq!(counted, MAX_CODE_ATTEMPTS);
        assert_eq!(tokens.attempt_code(code.id, &code.code, true, now).await.unwrap(), CodeCheck::Unusable);

        let stored = tokens.latest_code(user.id, CodePurpose::TwoFactor).await.unwrap().unwrap();
        assert_eq!(stored.attempts, MAX_CODE_ATTEMPTS);
    });
}

mod cases {
    use super::*;

    db_test!(test_case_round_trip_keeps_sections, |pool| {
        let repo = CaseRepository::new(pool);
        let mut case = CaseFixtures::located("2526005829", GeoFixtures::thane());
        case.driver.name = Some("Mohan Lal".to_string());
        case.checklist.spot = true;
        repo.insert(&case).await.unwrap();

        let stored = repo.get_by_id(case.id).await.unwrap();
        assert_eq!(stored.case_number, case.case_number);
        assert_eq!(stored.driver.name.as_deref(), Some("Mohan Lal"));
        assert_eq!(stored.point(), Some(GeoFixtures::thane()));
        assert!(stored.checklist.spot);
        assert_eq!(stored.status, CaseStatus::Open);
    });

    db_test!(test_claim_numbers_are_unique, |pool| {
        let repo = CaseRepository::new(pool);
        repo.insert(&CaseFixtures::open("2526005829")).await.unwrap();

        let again = repo.insert(&CaseFixtures::open("2526005829")).await;
        assert!(matches!(again, Err(DatabaseError::DuplicateEntry(_))));
    });

    db_test!(test_list_filters_and_stats, |pool| {
        let repo = CaseRepository::new(pool);
        repo.insert(&CaseFixtures::open("1000000001")).await.unwrap();
        repo.insert(&TestCaseBuilder::new("1000000002").with_status(CaseStatus::Wip).build())
            .await
            .unwrap();
        repo.insert(&TestCaseBuilder::new("1000000003").with_status(CaseStatus::Closed).build())
            .await
            .unwrap();

        let wip = repo
            .list(&CaseFilter { status: Some(CaseStatus::Wip), ..Default::default() }, Pagination::default())
            .await
            .unwrap();
        assert_eq!(wip.total, 1);
        assert_eq!(wip.items[0].claim_number, "1000000002");

        let search = repo
            .list(&CaseFilter { search: Some("0000003".to_string()), ..Default::default() }, Pagination::default())
            .await
            .unwrap();
        assert_eq!(search.total, 1);

        let stats = repo.stats(NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()).await.unwrap();
        assert_eq!(stats.total_cases, 3);
        assert_eq!(stats.pending_cases, 1);
        assert_eq!(stats.active_investigations, 1);
        assert_eq!(stats.completed_cases, 1);
    });
}

mod vendors {
    use super::*;

    db_test!(test_only_active_located_vendors_dispatchable, |pool| {
        let repo = VendorRepository::new(pool);
        let active = VendorFixtures::at("Thane Investigations", GeoFixtures::thane());
        let mut inactive = VendorFixtures::at("Mumbai Field Services", GeoFixtures::mumbai());
        inactive.deactivate();
        let unlocated = VendorFixtures::unlocated("Remote Desk");
        for vendor in [&active, &inactive, &unlocated] {
            repo.insert(vendor).await.unwrap();
        }

        let dispatchable = repo.list_dispatchable().await.unwrap();
        assert_eq!(dispatchable.len(), 1);
        assert_eq!(dispatchable[0].id, active.id);

        let stats = repo.stats().await.unwrap();
        assert_eq!(stats.total_vendors, 3);
        assert_eq!(stats.active_vendors, 2);
        assert_eq!(stats.geolocated_vendors, 2);
    });
}

mod intake {
    use super::*;

    db_test!(test_pipeline_against_postgres, |pool| {
        ClientRepository::new(pool.clone()).insert(&ClientFixtures::sbi_general()).await.unwrap();
        let service = IntakeService::new(
            Arc::new(PgIntakeStore::new(pool.clone(), None)),
            Arc::new(PgCaseStore::new(pool.clone())),
        );
        let message = ProviderMessage { email: EmailFixtures::intimation("pg-1"), attachments: Vec::new() };

        service.ingest(message.clone(), None).await.unwrap();
        assert_eq!(service.ingest(message, None).await.unwrap(), domain_intake::IngestOutcome::Duplicate);

        let case = CaseRepository::new(pool.clone())
            .find_by_claim_number(INTIMATION_CLAIM_NUMBER)
            .await
            .unwrap()
            .unwrap();
        let records = IntakeRepository::new(pool.clone());
        let counts = records.status_counts().await.unwrap();
        assert_eq!(counts, vec![(ProcessingStatus::Completed, 1)]);
        assert!(records.message_exists("pg-1").await.unwrap());

        let record = records.get(case.source_email_id.unwrap()).await.unwrap().unwrap();
        assert_eq!(record.intake.case_id, Some(case.id));
        assert!(record.intake.processed_at.unwrap() <= Utc::now());
    });
}
