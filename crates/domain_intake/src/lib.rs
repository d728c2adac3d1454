//! Email Intake Domain
//!
//! Insurers send new claims, intimations and follow-ups by email, often
//! with the policy schedule and the MACT petition attached as PDFs. This
//! crate turns those messages into case records:
//!
//! ```text
//! mailbox --list/fetch--> ProviderMessage --PDF text--> InboundEmail + attachments
//!     --store--> IntakeRecord --extract--> CaseExtraction --map--> InsuranceCase
//! ```
//!
//! Parsing of provider payloads (Gmail, Microsoft Graph), text extraction
//! and mapping are pure; the [`IntakeService`] drives them against the
//! [`MailProvider`], [`IntakeStore`] and [`CaseStore`] ports.

pub mod message;
pub mod mailbox;
pub mod gmail;
pub mod graph;
pub mod html;
pub mod pdf;
pub mod patterns;
pub mod extractor;
pub mod mapper;
pub mod ports;
pub mod service;
pub mod error;

pub use message::{
    InboundEmail, InboundAttachment, AttachmentPart, AttachmentSource, ProviderMessage,
    EmailIntake, StoredAttachment, IntakeRecord, ProcessingStatus, NO_SUBJECT,
};
pub use mailbox::{Mailbox, MailProviderKind};
pub use gmail::{GmailMessage, parse_gmail_message, decode_base64url};
pub use graph::{GraphMessage, GraphAttachment, parse_graph_message};
pub use html::strip_html;
pub use pdf::extract_pdf_text;
pub use extractor::{CaseExtraction, SourceTexts, AttachmentText};
pub use patterns::{KNOWN_INSURERS, UNKNOWN_INSURER};
pub use mapper::{MappingOutcome, build_case, apply_update, link_documents, TO_BE_VERIFIED, PENDING};
pub use ports::{MailProvider, IntakeStore, CaseStore};
pub use service::{IntakeService, PollReport, IngestOutcome, prepare_attachments};
pub use error::IntakeError;
