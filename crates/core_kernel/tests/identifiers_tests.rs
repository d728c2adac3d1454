//! Unit tests for the Identifiers module
//!
//! Tests cover creation, parsing, conversion, and display formatting.

use core_kernel::{
    UserId, VendorId, CaseId, ClientId, DocumentId, EmailIntakeId,
    AttachmentId, EvidenceId, AuthTokenId, VerificationCodeId, MailboxId,
};
use uuid::Uuid;

mod case_id_tests {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        let id1 = CaseId::new();
        let id2 = CaseId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_new_v7_generates_time_ordered_ids() {
        let id1 = CaseId::new_v7();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = CaseId::new_v7();
        let uuid1: Uuid = id1.into();
        let uuid2: Uuid = id2.into();
        assert!(uuid1 < uuid2);
    }

    #[test]
    fn test_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = CaseId::from_uuid(uuid);
        assert_eq!(*id.as_uuid(), uuid);
    }

    #[test]
    fn test_from_str_with_prefix() {
        let original = CaseId::new();
        let parsed: CaseId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_from_str_without_prefix() {
        let uuid = Uuid::new_v4();
        let parsed: CaseId = uuid.to_string().parse().unwrap();
        assert_eq!(*parsed.as_uuid(), uuid);
    }

    #[test]
    fn test_from_str_rejects_garbage() {
        assert!("CASE-not-a-uuid".parse::<CaseId>().is_err());
    }
}

#[test]
fn test_prefixes_are_distinct() {
    let prefixes = [
        UserId::prefix(),
        VendorId::prefix(),
        CaseId::prefix(),
        ClientId::prefix(),
        DocumentId::prefix(),
        EmailIntakeId::prefix(),
        AttachmentId::prefix(),
        EvidenceId::prefix(),
        AuthTokenId::prefix(),
        VerificationCodeId::prefix(),
        MailboxId::prefix(),
    ];
    let mut sorted = prefixes.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), prefixes.len());
}

#[test]
fn test_serde_is_transparent() {
    let id = VendorId::new();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{}\"", id.as_uuid()));
    let back: VendorId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, back);
}
