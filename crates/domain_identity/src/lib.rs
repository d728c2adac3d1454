//! Identity Domain
//!
//! Users and their roles, password credentials, emailed verification codes
//! (two-factor login and password reset), session tokens, and the
//! notification port used to deliver codes and links.
//!
//! # Roles
//!
//! - **SUPER_ADMIN**: full access, manages users and vendors
//! - **ADMIN**: case handling, optionally narrowed by an admin sub-role
//! - **VENDOR**: field investigators working assigned cases
//! - **CLIENT**: insurers following their cases
//! - **LAWYER**: counsel on MACT matters

pub mod user;
pub mod permissions;
pub mod credentials;
pub mod verification;
pub mod tokens;
pub mod notifier;
pub mod error;

pub use user::{User, NewUser, Role, AdminSubRole, ProfileKind};
pub use credentials::{hash_password, verify_password, validate_new_password, MIN_PASSWORD_LEN};
pub use verification::{VerificationCode, CodePurpose, CodeCheck, MAX_CODE_ATTEMPTS};
pub use tokens::{AuthToken, PasswordResetToken};
pub use notifier::{Notifier, Notification, OutgoingMessage, LogNotifier, DEFAULT_SITE_NAME};
pub use error::IdentityError;
