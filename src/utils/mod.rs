//! Shared utilities for the SchoolHub API.
//!
//! - [`email`]: SMTP mailer and HTML templates
//! - [`integrity`]: Existence, role, and uniqueness checks used before writes
//! - [`reset_token`]: Password reset token generation and hashing

pub mod email;
pub mod integrity;
pub mod reset_token;
