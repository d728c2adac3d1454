//! Case field extraction from mail and PDF text
//!
//! Text is gathered from four sources: the subject, the body (with other
//! PDF attachments appended), the policy PDF and the petition PDF. Each
//! field has its own preferred source and search window; the windows are
//! counted in characters and keep the matcher away from boilerplate at
//! the end of long documents.

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;

use core_kernel::{add_days, receipt_month};
use domain_cases::{CaseCategory, CaseType};

use crate::message::{InboundAttachment, InboundEmail, StoredAttachment};
use crate::patterns::{
    ACCIDENT_DATE, ADDRESS, CLAIMANT_NAME, CLAIM_NUMBER, DISTRICT, DRIVER_NAME, INSURED_NAME,
    INSURED_SECTION, KNOWN_INSURERS, MACT_NUMBER, MULTI_SPACE, POLICY_NUMBER, REGISTRATION,
    SUBJECT_FILE_NUMBER, SUBJECT_LOCATION, UNKNOWN_INSURER, VERSUS_SUBJECT, WHITESPACE,
};

/// Scope recorded for full-case intimations
pub const FULL_INVESTIGATION: &str = "Full Investigation";

/// Minimum length of a credible policy number
const MIN_POLICY_NUMBER_LEN: usize = 6;
const MAX_ADDRESS_LEN: usize = 500;

/// Anything that carries attachment text for extraction
pub trait AttachmentText {
    fn filename(&self) -> &str;
    fn is_pdf(&self) -> bool;
    fn text(&self) -> &str;
}

impl AttachmentText for InboundAttachment {
    fn filename(&self) -> &str {
        &self.filename
    }
    fn is_pdf(&self) -> bool {
        self.is_pdf
    }
    fn text(&self) -> &str {
        &self.extracted_text
    }
}

impl AttachmentText for StoredAttachment {
    fn filename(&self) -> &str {
        &self.filename
    }
    fn is_pdf(&self) -> bool {
        self.is_pdf
    }
    fn text(&self) -> &str {
        &self.extracted_text
    }
}

/// The texts fields are searched in
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceTexts {
    pub subject: String,
    /// Mail body plus the text of PDFs that are neither policy nor petition
    pub body: String,
    pub policy_pdf: String,
    pub petition_pdf: String,
    /// Subject, body, policy and petition joined by newlines
    pub all_text: String,
}

impl SourceTexts {
    pub fn gather<A: AttachmentText>(email: &InboundEmail, attachments: &[A]) -> Self {
        let subject = email.subject.clone();
        let mut body = email.readable_body();
        let mut policy_pdf = String::new();
        let mut petition_pdf = String::new();

        for attachment in attachments.iter().filter(|a| a.is_pdf()) {
            let name = attachment.filename().to_lowercase();
            if name.contains("policy") {
                policy_pdf = attachment.text().to_string();
            } else if name.contains("petition") {
                petition_pdf = attachment.text().to_string();
            } else {
                body.push('\n');
                body.push_str(attachment.text());
            }
        }

        let all_text = format!("{}\n{}\n{}\n{}", subject, body, policy_pdf, petition_pdf);
        Self { subject, body, policy_pdf, petition_pdf, all_text }
    }

    /// Policy PDF when present, otherwise everything
    fn policy_or_all(&self) -> &str {
        if self.policy_pdf.is_empty() {
            &self.all_text
        } else {
            &self.policy_pdf
        }
    }

    fn petition_or_all(&self) -> &str {
        if self.petition_pdf.is_empty() {
            &self.all_text
        } else {
            &self.petition_pdf
        }
    }
}

/// First `chars` characters of `text`
pub fn head(text: &str, chars: usize) -> &str {
    match text.char_indices().nth(chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// First capture, per pattern in order, that passes `accept`
fn first_accepted(patterns: &[Regex], text: &str, accept: impl Fn(&str) -> bool) -> Option<String> {
    patterns
        .iter()
        .filter_map(|re| capture(re, text))
        .find(|value| accept(value))
}

fn collapse_spaces(value: &str) -> String {
    MULTI_SPACE.replace_all(value, " ").into_owned()
}

fn plausible_name(name: &str) -> bool {
    let len = name.chars().count();
    len > 3 && len < 100
}

fn name_from(patterns: &[Regex], text: &str) -> Option<String> {
    patterns
        .iter()
        .filter_map(|re| capture(re, text))
        .map(|name| collapse_spaces(&name))
        .find(|name| plausible_name(name))
}

fn address_from(text: &str) -> Option<String> {
    ADDRESS
        .iter()
        .filter_map(|re| capture(re, text))
        .map(|address| collapse_spaces(&address))
        .find(|address| address.chars().count() > 10)
        .map(|address| head(&address, MAX_ADDRESS_LEN).to_string())
}

/// Insurer's claim number, subject first
pub fn extract_claim_number(subject: &str, all_text: &str) -> Option<String> {
    first_accepted(&CLAIM_NUMBER, subject, |v| !v.is_empty())
        .or_else(|| first_accepted(&CLAIM_NUMBER, head(all_text, 2000), |v| !v.is_empty()))
}

pub fn extract_policy_number(subject: &str, policy_pdf: &str, all_text: &str) -> Option<String> {
    let credible = |v: &str| v.chars().count() >= MIN_POLICY_NUMBER_LEN;
    first_accepted(&POLICY_NUMBER, subject, credible)
        .or_else(|| {
            if policy_pdf.is_empty() {
                None
            } else {
                first_accepted(&POLICY_NUMBER, head(policy_pdf, 3000), credible)
            }
        })
        .or_else(|| first_accepted(&POLICY_NUMBER, head(all_text, 5000), credible))
}

/// MACT petition number (CRN)
pub fn extract_mact_number(subject: &str, all_text: &str) -> Option<String> {
    let haystack = format!("{} {}", subject, head(all_text, 2000));
    first_accepted(&MACT_NUMBER, &haystack, |v| !v.is_empty())
}

/// Vehicle registration, spaces removed and upper-cased
pub fn extract_registration(texts: &SourceTexts) -> Option<String> {
    first_accepted(&REGISTRATION, head(texts.policy_or_all(), 5000), |v| !v.is_empty())
        .map(|reg| WHITESPACE.replace_all(&reg, "").to_uppercase())
}

pub fn extract_insured_name(texts: &SourceTexts) -> Option<String> {
    name_from(&INSURED_NAME, head(texts.policy_or_all(), 5000))
}

/// Claimant from the subject, then the petition, then a `X VS Y` subject
pub fn extract_claimant_name(texts: &SourceTexts) -> Option<String> {
    name_from(&CLAIMANT_NAME, &texts.subject)
        .or_else(|| {
            if texts.petition_pdf.is_empty() {
                None
            } else {
                name_from(&CLAIMANT_NAME, head(&texts.petition_pdf, 3000))
            }
        })
        .or_else(|| {
            capture(&VERSUS_SUBJECT, &texts.subject)
                .map(|name| collapse_spaces(&name))
                .filter(|name| plausible_name(name))
        })
}

pub fn extract_driver_name(all_text: &str) -> Option<String> {
    DRIVER_NAME
        .iter()
        .filter_map(|re| capture(re, head(all_text, 5000)))
        .find(|name| plausible_name(name))
}

/// Address inside the insured section of the policy
pub fn extract_insured_address(texts: &SourceTexts) -> Option<String> {
    let section = capture(&INSURED_SECTION, head(texts.policy_or_all(), 5000))?;
    address_from(&section)
}

pub fn extract_claimant_address(texts: &SourceTexts) -> Option<String> {
    address_from(head(texts.petition_or_all(), 5000))
}

/// Accident date written day first, e.g. `12/03/2024` or `5-1-24`
pub fn parse_day_first(raw: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = raw.split(['-', '/']).collect();
    let [day, month, year] = parts.as_slice() else {
        return None;
    };
    let day: u32 = day.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let mut year: i32 = year.parse().ok()?;
    if year < 100 {
        year += 2000;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn extract_accident_date(all_text: &str) -> Option<NaiveDate> {
    let raw = first_accepted(&ACCIDENT_DATE, head(all_text, 3000), |v| !v.is_empty())?;
    parse_day_first(&raw)
}

/// Known insurer named in the policy, then anywhere in the mail
pub fn extract_insurer(subject: &str, policy_pdf: &str, all_text: &str) -> String {
    let find_in = |text: &str| {
        let lower = text.to_lowercase();
        KNOWN_INSURERS
            .iter()
            .find(|company| lower.contains(&company.to_lowercase()))
            .map(|company| company.to_string())
    };

    let from_policy = if policy_pdf.is_empty() {
        None
    } else {
        find_in(head(policy_pdf, 2000))
    };
    from_policy
        .or_else(|| find_in(&format!("{} {}", subject, all_text)))
        .unwrap_or_else(|| UNKNOWN_INSURER.to_string())
}

/// Case fields recovered from one email
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseExtraction {
    pub claim_number: Option<String>,
    pub policy_number: Option<String>,
    pub crn: Option<String>,
    pub file_number: Option<String>,
    pub insured_name: Option<String>,
    pub insured_address: Option<String>,
    pub claimant_name: Option<String>,
    pub claimant_address: Option<String>,
    pub claimant_district: Option<String>,
    pub driver_name: Option<String>,
    pub spot_location: Option<String>,
    pub spot_district: Option<String>,
    pub vehicle_registration: Option<String>,
    pub client_name: String,
    pub accident_date: Option<NaiveDate>,
    pub category: CaseCategory,
    pub case_type: Option<CaseType>,
    pub scope_of_work: Option<String>,
    pub receipt_date: NaiveDate,
    pub receipt_month: String,
    pub due_date: NaiveDate,
}

impl CaseExtraction {
    /// Runs every extractor over an email and its attachments
    pub fn extract<A: AttachmentText>(email: &InboundEmail, attachments: &[A], due_days: i64) -> Self {
        let texts = SourceTexts::gather(email, attachments);
        Self::from_texts(&texts, email.received_at.date_naive(), due_days)
    }

    pub fn from_texts(texts: &SourceTexts, receipt_date: NaiveDate, due_days: i64) -> Self {
        let subject = texts.subject.as_str();
        let all_text = texts.all_text.as_str();

        let crn = extract_mact_number(subject, all_text);

        let spot_location = capture(&SUBJECT_LOCATION, subject).filter(|l| !l.is_empty());
        let claimant_district = spot_location.clone().or_else(|| {
            DISTRICT
                .iter()
                .find_map(|re| capture(re, head(all_text, 3000)))
        });

        let category = if crn.is_some() || subject.to_uppercase().contains("MACT") {
            CaseCategory::Mact
        } else {
            CaseCategory::Other
        };

        let full_case = subject.to_lowercase().contains("intimation") || all_text.contains("Full Case");

        Self {
            claim_number: extract_claim_number(subject, all_text),
            policy_number: extract_policy_number(subject, &texts.policy_pdf, all_text),
            crn,
            file_number: capture(&SUBJECT_FILE_NUMBER, subject),
            insured_name: extract_insured_name(texts),
            insured_address: extract_insured_address(texts),
            claimant_name: extract_claimant_name(texts),
            claimant_address: extract_claimant_address(texts),
            claimant_district,
            driver_name: extract_driver_name(all_text),
            spot_district: spot_location.clone(),
            spot_location,
            vehicle_registration: extract_registration(texts),
            client_name: extract_insurer(subject, &texts.policy_pdf, all_text),
            accident_date: extract_accident_date(all_text),
            category,
            case_type: full_case.then_some(CaseType::FullCase),
            scope_of_work: full_case.then(|| FULL_INVESTIGATION.to_string()),
            receipt_date,
            receipt_month: receipt_month(receipt_date),
            due_date: add_days(receipt_date, due_days),
        }
    }

    /// Number of optional fields that were found
    pub fn populated_fields(&self) -> usize {
        [
            &self.claim_number,
            &self.policy_number,
            &self.crn,
            &self.file_number,
            &self.insured_name,
            &self.insured_address,
            &self.claimant_name,
            &self.claimant_address,
            &self.claimant_district,
            &self.driver_name,
            &self.spot_location,
            &self.spot_district,
            &self.vehicle_registration,
            &self.scope_of_work,
        ]
        .iter()
        .filter(|f| f.is_some())
        .count()
            + usize::from(self.accident_date.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_counts_characters() {
        assert_eq!(head("abcdef", 3), "abc");
        assert_eq!(head("ab", 10), "ab");
        assert_eq!(head("₹₹₹₹", 2), "₹₹");
    }

    #[test]
    fn test_day_first_dates() {
        assert_eq!(parse_day_first("12/03/2024"), NaiveDate::from_ymd_opt(2024, 3, 12));
        assert_eq!(parse_day_first("5-1-24"), NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(parse_day_first("31/02/2024"), None);
        assert_eq!(parse_day_first("2024"), None);
    }

    #[test]
    fn test_short_policy_numbers_are_ignored() {
        assert_eq!(extract_policy_number("Policy No: 123", "", "Policy No: 123"), None);
        assert_eq!(
            extract_policy_number("Policy Number: 0001234567", "", ""),
            Some("0001234567".to_string())
        );
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use chrono::Datelike;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn day_first_dates_parse_back(days in 0i64..20_000) {
            let date = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap() + chrono::Duration::days(days);
            let slashed = format!("{:02}/{:02}/{}", date.day(), date.month(), date.year());
            let dashed = format!("{}-{}-{}", date.day(), date.month(), date.year());

            prop_assert_eq!(parse_day_first(&slashed), Some(date));
            prop_assert_eq!(parse_day_first(&dashed), Some(date));
        }

        #[test]
        fn claim_number_in_subject_is_found(number in "[1-9][0-9]{9}", noise in "[a-z ]{0,40}") {
            let subject = format!("{} Claim No: {} {}", noise, number, noise);
            prop_assert_eq!(extract_claim_number(&subject, ""), Some(number));
        }

        #[test]
        fn head_never_splits_characters(text in "\\PC{0,200}", chars in 0usize..250) {
            let prefix = head(&text, chars);
            prop_assert!(text.starts_with(prefix));
            prop_assert!(prefix.chars().count() <= chars);
        }
    }
}
