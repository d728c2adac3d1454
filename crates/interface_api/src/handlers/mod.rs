//! Request handlers, one module per route group

pub mod health;
pub mod auth;
pub mod users;
pub mod vendors;
pub mod super_admin;
pub mod cases;
pub mod dashboard;
pub mod clients;
pub mod intake;
pub mod vendor_portal;
