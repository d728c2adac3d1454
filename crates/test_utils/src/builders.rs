//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible defaults.
//! These builders allow tests to specify only the relevant fields while using
//! defaults for everything else.

use chrono::{DateTime, NaiveDate, Utc};
use fake::faker::internet::en::Username;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;

use core_kernel::{ClientId, GeoPoint, VendorId};
use domain_cases::{CaseCategory, CaseStatus, InsuranceCase, NewCase, Priority};
use domain_identity::{hash_password, AdminSubRole, NewUser, Role, User};
use domain_intake::{InboundAttachment, InboundEmail};

use crate::fixtures::{EmailFixtures, TemporalFixtures, FIXTURE_PASSWORD};

/// Builder for accounts with random but valid names
pub struct TestUserBuilder {
    username: String,
    email: Option<String>,
    first_name: String,
    last_name: String,
    role: Role,
    sub_role: Option<AdminSubRole>,
    password: String,
    active: bool,
    two_factor: bool,
}

impl Default for TestUserBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestUserBuilder {
    /// Creates a CLIENT account builder with a random username
    pub fn new() -> Self {
        let base: String = Username().fake();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self {
            username: format!("{}_{}", base.to_lowercase(), &suffix[..6]),
            email: None,
            first_name: FirstName().fake(),
            last_name: LastName().fake(),
            role: Role::Client,
            sub_role: None,
            password: FIXTURE_PASSWORD.to_string(),
            active: true,
            two_factor: false,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Makes the account an admin with the given duty
    pub fn with_sub_role(mut self, sub_role: AdminSubRole) -> Self {
        self.role = Role::Admin;
        self.sub_role = Some(sub_role);
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn with_two_factor(mut self) -> Self {
        self.two_factor = true;
        self
    }

    pub fn build(self) -> User {
        let email = self.email.unwrap_or_else(|| format!("{}@claimsdesk.test", self.username));
        let mut user = User::new(
            NewUser {
                username: self.username,
                email,
                first_name: self.first_name,
                last_name: self.last_name,
                role: self.role,
                sub_role: self.sub_role,
            },
            hash_password(&self.password).unwrap(),
        )
        .unwrap();
        user.is_active = self.active;
        user.is_2fa_enabled = self.two_factor;
        user
    }
}

/// Builder for cases
pub struct TestCaseBuilder {
    new: NewCase,
    point: Option<GeoPoint>,
    status: CaseStatus,
    vendor_id: Option<VendorId>,
}

impl TestCaseBuilder {
    pub fn new(claim_number: impl Into<String>) -> Self {
        Self {
            new: NewCase::new(claim_number, "SBI General Insurance", TemporalFixtures::receipt_date()),
            point: None,
            status: CaseStatus::Open,
            vendor_id: None,
        }
    }

    pub fn with_client(mut self, client_id: ClientId, client_name: impl Into<String>) -> Self {
        self.new.client_id = Some(client_id);
        self.new.client_name = client_name.into();
        self
    }

    pub fn with_category(mut self, category: CaseCategory) -> Self {
        self.new.category = category;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.new.priority = priority;
        self
    }

    pub fn with_receipt_date(mut self, date: NaiveDate) -> Self {
        self.new.receipt_date = date;
        self
    }

    pub fn with_due_days(mut self, days: i64) -> Self {
        self.new.due_days = days;
        self
    }

    pub fn at(mut self, point: GeoPoint) -> Self {
        self.point = Some(point);
        self
    }

    pub fn assigned_to(mut self, vendor_id: VendorId) -> Self {
        self.vendor_id = Some(vendor_id);
        self
    }

    /// Walks the workflow from Open up to `status`
    pub fn with_status(mut self, status: CaseStatus) -> Self {
        self.status = status;
        self
    }

    pub fn build(self) -> InsuranceCase {
        let mut case = InsuranceCase::new_manual(self.new).unwrap();
        case.location.point = self.point;
        case.assigned_vendor_id = self.vendor_id;

        let path: &[CaseStatus] = match self.status {
            CaseStatus::Open => &[],
            CaseStatus::Wip => &[CaseStatus::Wip],
            CaseStatus::Completed => &[CaseStatus::Wip, CaseStatus::Completed],
            CaseStatus::Dispatch => &[CaseStatus::Wip, CaseStatus::Completed, CaseStatus::Dispatch],
            CaseStatus::Closed => &[CaseStatus::Closed],
        };
        for step in path {
            case.update_status(*step).unwrap();
        }
        case
    }
}

/// Builder for inbound emails
pub struct TestEmailBuilder {
    email: InboundEmail,
    attachments: Vec<InboundAttachment>,
}

impl TestEmailBuilder {
    pub fn new(message_id: impl Into<String>) -> Self {
        let message_id = message_id.into();
        Self {
            email: EmailFixtures::email(&message_id, "Claim intimation", ""),
            attachments: Vec::new(),
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.email.subject = subject.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.email.body_text = body.into();
        self
    }

    /// Sets an HTML body and clears the plain one
    pub fn with_html_body(mut self, html: impl Into<String>) -> Self {
        self.email.body_text.clear();
        self.email.body_html = html.into();
        self
    }

    pub fn from_sender(mut self, email: impl Into<String>, name: impl Into<String>) -> Self {
        self.email.sender_email = email.into();
        self.email.sender_name = name.into();
        self
    }

    pub fn received_at(mut self, at: DateTime<Utc>) -> Self {
        self.email.received_at = at;
        self
    }

    /// Adds an attachment whose text is already extracted
    pub fn with_text_attachment(mut self, filename: &str, content_type: &str, text: &str) -> Self {
        self.attachments.push(InboundAttachment::with_text(filename, content_type, text));
        self.email.has_attachments = true;
        self
    }

    pub fn build(self) -> (InboundEmail, Vec<InboundAttachment>) {
        (self.email, self.attachments)
    }

    pub fn email(self) -> InboundEmail {
        self.email
    }
}
