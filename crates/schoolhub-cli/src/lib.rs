//! # SchoolHub CLI
//!
//! Administrative helpers used by the `schoolhub-cli` binary: creating the
//! first admin account and filling a development database with fake data.
//!
//! ```ignore
//! use schoolhub_cli::seeder::{seed_all, SeedConfig};
//!
//! seed_all(&pool, SeedConfig::new(4).with_teachers(8).with_students(100)).await?;
//! ```

pub mod admin;
pub mod seeder;
