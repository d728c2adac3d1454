//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for common entities across the claims desk.
//! These fixtures are designed to be consistent and predictable for unit tests.

use std::io::Cursor;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};

use core_kernel::GeoPoint;
use domain_cases::{Client, InsuranceCase, NewCase};
use domain_dispatch::{NewVendor, Vendor};
use domain_identity::{hash_password, NewUser, Role, User};
use domain_intake::{InboundAttachment, InboundEmail};

/// Password every fixture account is created with
pub const FIXTURE_PASSWORD: &str = "Str0ng-Passw0rd!";

/// Fixture for locations around Thane and Mumbai
pub struct GeoFixtures;

impl GeoFixtures {
    /// Thane railway station
    pub fn thane() -> GeoPoint {
        GeoPoint { latitude: 19.1860, longitude: 72.9750 }
    }

    /// A point roughly 400 m north-east of [`GeoFixtures::thane`]
    pub fn near_thane() -> GeoPoint {
        GeoPoint { latitude: 19.1890, longitude: 72.9775 }
    }

    /// Chhatrapati Shivaji Terminus, about 25 km from Thane
    pub fn mumbai() -> GeoPoint {
        GeoPoint { latitude: 18.9398, longitude: 72.8355 }
    }

    /// Pune station, about 120 km from Thane
    pub fn pune() -> GeoPoint {
        GeoPoint { latitude: 18.5286, longitude: 73.8743 }
    }
}

/// Fixture for dates
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Standard receipt date (Jan 6, 2025)
    pub fn receipt_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
    }

    /// Moment the fixture email arrived
    pub fn received_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 6, 9, 30, 0).unwrap()
    }

    /// Accident date quoted in the fixture email body
    pub fn accident_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 12).unwrap()
    }
}

/// Fixture for accounts
pub struct UserFixtures;

impl UserFixtures {
    /// An active account with a real argon2 hash of [`FIXTURE_PASSWORD`]
    pub fn with_role(username: &str, role: Role) -> User {
        let hash = hash_password(FIXTURE_PASSWORD).unwrap();
        User::new(
            NewUser {
                username: username.to_string(),
                email: format!("{}@claimsdesk.test", username),
                first_name: "Test".to_string(),
                last_name: role.as_str().to_lowercase(),
                role,
                sub_role: None,
            },
            hash,
        )
        .unwrap()
    }

    pub fn super_admin() -> User {
        Self::with_role("root", Role::SuperAdmin)
    }

    pub fn admin() -> User {
        Self::with_role("desk_admin", Role::Admin)
    }

    pub fn vendor() -> User {
        Self::with_role("field_vendor", Role::Vendor)
    }

    pub fn lawyer() -> User {
        Self::with_role("panel_lawyer", Role::Lawyer)
    }

    pub fn client() -> User {
        Self::with_role("insurer_contact", Role::Client)
    }
}

/// Fixture for vendors
pub struct VendorFixtures;

impl VendorFixtures {
    /// An active vendor at the given point
    pub fn at(company_name: &str, point: GeoPoint) -> Vendor {
        Vendor::new(NewVendor {
            company_name: company_name.to_string(),
            city: Some("Thane".to_string()),
            latitude: Some(point.latitude),
            longitude: Some(point.longitude),
            ..Default::default()
        })
        .unwrap()
    }

    /// An active vendor with no coordinates
    pub fn unlocated(company_name: &str) -> Vendor {
        Vendor::new(NewVendor { company_name: company_name.to_string(), ..Default::default() }).unwrap()
    }
}

/// Fixture for clients
pub struct ClientFixtures;

impl ClientFixtures {
    pub fn sbi_general() -> Client {
        Client::new("SBIG", "SBI General Insurance").unwrap()
    }

    pub fn hdfc_ergo() -> Client {
        Client::new("HDFC", "HDFC ERGO General Insurance").unwrap()
    }
}

/// Fixture for cases
pub struct CaseFixtures;

impl CaseFixtures {
    /// A manual case with no incident location
    pub fn open(claim_number: &str) -> InsuranceCase {
        InsuranceCase::new_manual(NewCase::new(claim_number, "SBI General Insurance", TemporalFixtures::receipt_date()))
            .unwrap()
    }

    /// A manual case located at `point`
    pub fn located(claim_number: &str, point: GeoPoint) -> InsuranceCase {
        let mut case = Self::open(claim_number);
        case.location.point = Some(point);
        case
    }
}

/// Claim number carried by [`EmailFixtures::intimation`]
pub const INTIMATION_CLAIM_NUMBER: &str = "2526005829";

/// Fixture for inbound mail
pub struct EmailFixtures;

impl EmailFixtures {
    pub const POLICY_TEXT: &'static str = "SBI General Insurance Company Limited\n\
        Policy Schedule\n\
        Policy No: 0001234567890\n\
        Insured Name: Ramesh Kumar\n\
        Registration No: MH04AB1234\n";

    pub const BODY_TEXT: &'static str = "Dear Sir,\n\n\
        Please find the claim details below.\n\
        Driver Name: Mohan Lal\n\
        Date of Accident: 12/03/2024\n\
        District: Thane\n\n\
        Regards,\nClaims Team";

    /// A plain email with the given id, subject and body
    pub fn email(message_id: &str, subject: &str, body: &str) -> InboundEmail {
        InboundEmail {
            message_id: message_id.to_string(),
            thread_id: None,
            subject: subject.to_string(),
            sender_email: "claims@sbigeneral.example".to_string(),
            sender_name: "Claims Team".to_string(),
            recipient_email: "desk@claimsdesk.test".to_string(),
            cc: String::new(),
            bcc: String::new(),
            body_text: body.to_string(),
            body_html: String::new(),
            received_at: TemporalFixtures::received_at(),
            has_attachments: false,
        }
    }

    /// A claim intimation for [`INTIMATION_CLAIM_NUMBER`]
    pub fn intimation(message_id: &str) -> InboundEmail {
        Self::email(
            message_id,
            &format!("Intimation - Claim no. {} / MACT No 245/2024 / Location - Thane", INTIMATION_CLAIM_NUMBER),
            Self::BODY_TEXT,
        )
    }

    /// A policy schedule whose text was already extracted
    pub fn policy_schedule() -> InboundAttachment {
        InboundAttachment::with_text("Policy_Schedule.pdf", "application/pdf", Self::POLICY_TEXT)
    }
}

/// Fixture for evidence photos
pub struct PhotoFixtures;

impl PhotoFixtures {
    /// A TIFF/EXIF blob carrying GPS tags for `point`
    pub fn geotagged(point: GeoPoint) -> Vec<u8> {
        let to_dms = |v: f64| {
            let v = v.abs();
            let d = v.trunc();
            let m = ((v - d) * 60.0).trunc();
            let s = ((v - d) * 60.0 - m) * 60.0;
            vec![
                Rational { num: d as u32, denom: 1 },
                Rational { num: m as u32, denom: 1 },
                Rational { num: (s * 10_000.0).round() as u32, denom: 10_000 },
            ]
        };
        let lat_ref = if point.latitude < 0.0 { b"S".to_vec() } else { b"N".to_vec() };
        let lon_ref = if point.longitude < 0.0 { b"W".to_vec() } else { b"E".to_vec() };
        let fields = [
            Field { tag: Tag::GPSLatitudeRef, ifd_num: In::PRIMARY, value: Value::Ascii(vec![lat_ref]) },
            Field { tag: Tag::GPSLatitude, ifd_num: In::PRIMARY, value: Value::Rational(to_dms(point.latitude)) },
            Field { tag: Tag::GPSLongitudeRef, ifd_num: In::PRIMARY, value: Value::Ascii(vec![lon_ref]) },
            Field { tag: Tag::GPSLongitude, ifd_num: In::PRIMARY, value: Value::Rational(to_dms(point.longitude)) },
        ];
        let mut writer = Writer::new();
        for field in &fields {
            writer.push_field(field);
        }
        let mut buf = Cursor::new(Vec::new());
        writer.write(&mut buf, false).unwrap();
        buf.into_inner()
    }

    /// Bytes with no EXIF block at all
    pub fn untagged() -> Vec<u8> {
        vec![0xFF, 0xD8, 0xFF, 0xD9]
    }
}
