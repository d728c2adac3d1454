//! Emailed one-time verification codes

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use core_kernel::{UserId, VerificationCodeId};
use crate::error::IdentityError;

/// Wrong guesses allowed before a code is dead
pub const MAX_CODE_ATTEMPTS: i32 = 5;

/// Default lifetime of a code
pub const CODE_TTL_MINUTES: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodePurpose {
    #[serde(rename = "2FA")]
    TwoFactor,
    #[serde(rename = "RESET")]
    PasswordReset,
    #[serde(rename = "VERIFY")]
    EmailVerification,
}

impl CodePurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodePurpose::TwoFactor => "2FA",
            CodePurpose::PasswordReset => "RESET",
            CodePurpose::EmailVerification => "VERIFY",
        }
    }
}

impl FromStr for CodePurpose {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "2FA" => Ok(CodePurpose::TwoFactor),
            "RESET" => Ok(CodePurpose::PasswordReset),
            "VERIFY" => Ok(CodePurpose::EmailVerification),
            _ => Err(IdentityError::InvalidData(format!("unknown code purpose: {}", s))),
        }
    }
}

/// Outcome of checking a submitted code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeCheck {
    Accepted,
    /// Wrong digits; the attempt was counted
    Mismatch,
    /// Used, expired or out of attempts
    Unusable,
}

/// A six digit code sent by email
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationCode {
    pub id: VerificationCodeId,
    pub user_id: UserId,
    pub code: String,
    pub purpose: CodePurpose,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_used: bool,
    pub attempts: i32,
}

impl VerificationCode {
    /// Issues a fresh code with the default lifetime
    pub fn issue(user_id: UserId, purpose: CodePurpose) -> Self {
        Self::issue_with_ttl(user_id, purpose, Duration::minutes(CODE_TTL_MINUTES))
    }

    pub fn issue_with_ttl(user_id: UserId, purpose: CodePurpose, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: VerificationCodeId::new_v7(),
            user_id,
            code: generate_code(),
            purpose,
            created_at: now,
            expires_at: now + ttl,
            is_used: false,
            attempts: 0,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Unused, unexpired and under the attempt limit
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.is_used && !self.is_expired(now) && self.attempts < MAX_CODE_ATTEMPTS
    }

    /// Compares a submitted code, counting wrong guesses
    ///
    /// Does not consume the code; see [`VerificationCode::redeem`].
    pub fn check(&mut self, submitted: &str, now: DateTime<Utc>) -> CodeCheck {
        if !self.is_valid(now) {
            return CodeCheck::Unusable;
        }
        if self.code != submitted.trim() {
            self.attempts += 1;
            return CodeCheck::Mismatch;
        }
        CodeCheck::Accepted
    }

    /// Checks the code and marks it used when it matches
    pub fn redeem(&mut self, submitted: &str, now: DateTime<Utc>) -> CodeCheck {
        let outcome = self.check(submitted, now);
        if outcome == CodeCheck::Accepted {
            self.is_used = true;
        }
        outcome
    }
}

fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..6).map(|_| char::from(b'0' + rng.gen_range(0..10u8))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_is_six_digits() {
        for _ in 0..50 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn wrong_guesses_lock_the_code(guesses in prop::collection::vec("[0-9]{6}", 1..12)) {
            let mut code = VerificationCode::issue(UserId::new_v7(), CodePurpose::TwoFactor);
            let now = Utc::now();
            let real = code.code.clone();

            let mut mismatches = 0;
            for guess in guesses.iter().filter(|g| **g != real) {
                match code.check(guess, now) {
                    CodeCheck::Mismatch => mismatches += 1,
                    CodeCheck::Unusable => prop_assert!(mismatches >= MAX_CODE_ATTEMPTS),
                    CodeCheck::Accepted => prop_assert!(false, "wrong code accepted"),
                }
            }

            prop_assert!(code.attempts <= MAX_CODE_ATTEMPTS);
            let expected = if mismatches >= MAX_CODE_ATTEMPTS { CodeCheck::Unusable } else { CodeCheck::Accepted };
            prop_assert_eq!(code.redeem(&real, now), expected);
        }
    }
}
