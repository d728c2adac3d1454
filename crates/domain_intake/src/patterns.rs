//! Regular expressions used by the field extractor
//!
//! Patterns are tried in order and the first acceptable capture wins.
//! Case-insensitive sets carry an inline `(?i)` flag; name patterns are
//! case-sensitive so that a capital letter anchors the start of a name.

use once_cell::sync::Lazy;
use regex::Regex;

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("valid extraction pattern"))
        .collect()
}

pub(crate) static CLAIM_NUMBER: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)Claim\s*[Nn]o\.?\s*[-:]?\s*([A-Z0-9\-]+)",
        r"(?i)[Cc]laim\s*[Nn]umber\s*[-:]?\s*([A-Z0-9\-]+)",
        r"(?i)[Cc]laim\s*#\s*[-:]?\s*([A-Z0-9\-]+)",
        r"(?i)Intimation\s*[-]\s*Claim\s*no\.\s*([0-9]+)",
        // MTP-N-2526-005829
        r"(?i)MTP[-\s]?[A-Z]?[-\s]?(\d{4}[-\s]\d{6})",
        // MVC 2142/2025
        r"(?i)(?:MVC|MAC)\s+(\d+/\d{4})",
    ])
});

pub(crate) static POLICY_NUMBER: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)Policy\s*[Nn]o\.?\s*[-:]?\s*([A-Z0-9]+)",
        r"(?i)Policy\s*[Nn]umber\s*[-:]?\s*([A-Z0-9]+)",
        r"(?i)Policy\s*#\s*[-:]?\s*([A-Z0-9]+)",
        r"(?i)POLICY\s+NO[.:]\s*([A-Z0-9]+)",
    ])
});

pub(crate) static MACT_NUMBER: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)MACT\s*[Nn]o\.?\s*[-:]?\s*([0-9/]+)",
        r"(?i)MAC\s*[Cc]ase\s*[Nn]o\.?\s*[-:]?\s*([0-9/]+)",
    ])
});

pub(crate) static REGISTRATION: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)(?:Registration|Reg\.?)\s*[Nn]o\.?\s*[-:]?\s*([A-Z]{2}[-\s]?\d{2}[-\s]?[A-Z]{1,2}[-\s]?\d{4})",
        r"(?i)(?:Vehicle|Veh\.?)\s*[Nn]o\.?\s*[-:]?\s*([A-Z]{2}[-\s]?\d{2}[-\s]?[A-Z]{1,2}[-\s]?\d{4})",
        r"(?i)\b([A-Z]{2}[-\s]?\d{2}[-\s]?[A-Z]{1,2}[-\s]?\d{4})\b",
    ])
});

pub(crate) static INSURED_NAME: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"Insured\s*[Nn]ame\s*[-:]?\s*([A-Z][A-Za-z\s\.]+?)(?:\n|,|;|\s{2,})",
        r"Name\s+of\s+Insured\s*[-:]?\s*([A-Z][A-Za-z\s\.]+?)(?:\n|,)",
        r"INSURED\s+NAME\s*[-:]?\s*([A-Z][A-Za-z\s\.]+?)(?:\n|,)",
    ])
});

pub(crate) static CLAIMANT_NAME: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"[Cc]laimant\s*[Nn]ame\s*[-:]?\s*([A-Z][A-Za-z\s\.]+?)(?:\n|,|;|\s{2,})",
        r"[Pp]etitioner\s*[Nn]ame\s*[-:]?\s*([A-Z][A-Za-z\s\.]+?)(?:\n|VS|,)",
        r"Petitioner\s+Name\s+[-]\s+([A-Za-z\s]+)",
    ])
});

/// `Ramesh Kumar VS SBI General` style subjects
pub(crate) static VERSUS_SUBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)([A-Za-z\s]+)\s+VS\s+").expect("valid extraction pattern"));

pub(crate) static DRIVER_NAME: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"Driver\s*[Nn]ame\s*[-:]?\s*([A-Z][A-Za-z\s\.]+?)(?:\n|,)",
        r"Name\s+of\s+Driver\s*[-:]?\s*([A-Z][A-Za-z\s\.]+?)(?:\n|,)",
    ])
});

pub(crate) static ADDRESS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"Address\s*[-:]?\s*([^\n]+(?:\n[^\n]+){0,2})",
        r"[Rr]esiding\s+at\s*[-:]?\s*([^\n]+)",
    ])
});

/// Text between the word "Insured" and the next policy section
pub(crate) static INSURED_SECTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)(?:Insured|INSURED)(.*?)(?:Coverage|Policy|Premium|\n\n)").expect("valid extraction pattern")
});

pub(crate) static DISTRICT: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"District\s*[-:]?\s*([A-Za-z\s]+?)(?:\n|,|;|\s{2,})",
        r"Dist\.?\s*[-:]?\s*([A-Za-z\s]+?)(?:\n|,)",
    ])
});

/// `Location - Thane / ...` in a subject line
pub(crate) static SUBJECT_LOCATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Location\s*[-:]\s*([A-Za-z\s]+?)(?:\s*/|\s+/|$)").expect("valid extraction pattern")
});

/// `File No W6607` in a subject line
pub(crate) static SUBJECT_FILE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)File\s*No\.?\s*([A-Z0-9]+)").expect("valid extraction pattern"));

pub(crate) static ACCIDENT_DATE: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)(?:Date|Dt\.?)\s+of\s+Accident\s*[-:]?\s*(\d{1,2}[-/]\d{1,2}[-/]\d{2,4})",
        r"(?i)Accident\s+(?:occurred|happened)\s+on\s*[-:]?\s*(\d{1,2}[-/]\d{1,2}[-/]\d{2,4})",
    ])
});

pub(crate) static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").expect("valid extraction pattern"));
pub(crate) static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid extraction pattern"));

/// Insurers recognised in mail and policy text
pub const KNOWN_INSURERS: [&str; 20] = [
    "SBI General",
    "ICICI Lombard",
    "HDFC ERGO",
    "Bajaj Allianz",
    "Reliance General",
    "TATA AIG",
    "Oriental Insurance",
    "United India Insurance",
    "National Insurance",
    "New India Assurance",
    "Magma HDI",
    "IndusInd",
    "Generali",
    "Shriram General",
    "Royal Sundaram",
    "Cholamandalam",
    "Future Generali",
    "Liberty General",
    "Bharti AXA",
    "Iffco Tokio",
];

/// Client name used when no known insurer is mentioned
pub const UNKNOWN_INSURER: &str = "Unknown Insurance Company";
