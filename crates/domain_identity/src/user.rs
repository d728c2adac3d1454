//! User accounts and roles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::UserId;
use crate::error::IdentityError;

/// Primary role of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    Admin,
    Vendor,
    Client,
    Lawyer,
}

impl Role {
    pub const ALL: [Role; 5] = [Role::SuperAdmin, Role::Admin, Role::Vendor, Role::Client, Role::Lawyer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::Admin => "ADMIN",
            Role::Vendor => "VENDOR",
            Role::Client => "CLIENT",
            Role::Lawyer => "LAWYER",
        }
    }

    /// Roles a visitor may pick at sign-up
    pub fn is_self_registrable(&self) -> bool {
        !matches!(self, Role::SuperAdmin)
    }

    /// Resolves the role requested at registration, defaulting to CLIENT
    pub fn for_registration(requested: Option<&str>) -> Result<Role, IdentityError> {
        let role = match requested.map(str::trim).filter(|r| !r.is_empty()) {
            None => Role::Client,
            Some(value) => value.parse()?,
        };
        if !role.is_self_registrable() {
            return Err(IdentityError::RoleNotRegistrable(role.to_string()));
        }
        Ok(role)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SUPER_ADMIN" => Ok(Role::SuperAdmin),
            "ADMIN" => Ok(Role::Admin),
            "VENDOR" => Ok(Role::Vendor),
            "CLIENT" => Ok(Role::Client),
            "LAWYER" => Ok(Role::Lawyer),
            _ => Err(IdentityError::UnknownRole(s.to_string())),
        }
    }
}

/// Narrower duty within the admin role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminSubRole {
    CaseHandler,
    ReportManager,
    LogManager,
    SuperAdmin,
}

impl AdminSubRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminSubRole::CaseHandler => "CASE_HANDLER",
            AdminSubRole::ReportManager => "REPORT_MANAGER",
            AdminSubRole::LogManager => "LOG_MANAGER",
            AdminSubRole::SuperAdmin => "SUPER_ADMIN",
        }
    }
}

impl FromStr for AdminSubRole {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CASE_HANDLER" => Ok(AdminSubRole::CaseHandler),
            "REPORT_MANAGER" => Ok(AdminSubRole::ReportManager),
            "LOG_MANAGER" => Ok(AdminSubRole::LogManager),
            "SUPER_ADMIN" => Ok(AdminSubRole::SuperAdmin),
            _ => Err(IdentityError::UnknownRole(s.to_string())),
        }
    }
}

/// Role-specific profile that accompanies an account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    Admin,
    Vendor,
    Lawyer,
}

/// A user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub sub_role: Option<AdminSubRole>,
    /// Fine-grained permission names granted on top of the role
    pub permissions: Vec<String>,
    pub is_active: bool,
    pub is_2fa_enabled: bool,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating an account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub sub_role: Option<AdminSubRole>,
}

impl User {
    /// Builds an active account from validated input and an already hashed password
    pub fn new(input: NewUser, password_hash: String) -> Result<Self, IdentityError> {
        let username = input.username.trim().to_string();
        let email = input.email.trim().to_lowercase();
        if username.is_empty() {
            return Err(IdentityError::InvalidData("username is required".to_string()));
        }
        if !email.contains('@') {
            return Err(IdentityError::InvalidData(format!("invalid email: {}", email)));
        }
        if input.sub_role.is_some() && input.role != Role::Admin {
            return Err(IdentityError::InvalidData(
                "sub-role only applies to admins".to_string(),
            ));
        }

        Ok(Self {
            id: UserId::new_v7(),
            username,
            email,
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            role: input.role,
            sub_role: input.sub_role,
            permissions: Vec::new(),
            is_active: true,
            is_2fa_enabled: false,
            password_hash,
            last_login: None,
            created_at: Utc::now(),
        })
    }

    /// First name when set, otherwise the username
    pub fn display_name(&self) -> &str {
        if self.first_name.is_empty() {
            &self.username
        } else {
            &self.first_name
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// Profile row the account needs, if any
    pub fn profile_kind(&self) -> Option<ProfileKind> {
        match self.role {
            Role::Admin | Role::SuperAdmin => Some(ProfileKind::Admin),
            Role::Vendor => Some(ProfileKind::Vendor),
            Role::Lawyer => Some(ProfileKind::Lawyer),
            Role::Client => None,
        }
    }

    pub fn record_login(&mut self) {
        self.last_login = Some(Utc::now());
    }
}
