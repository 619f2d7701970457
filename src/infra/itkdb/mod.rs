//! Client for the ITk production database.
//!
//! [`ItkDbClient`] authenticates with the operator's two access codes and
//! implements [`TestDatabase`](crate::services::test_database::TestDatabase).
//! [`response`] turns the database's `uuAppErrorMap` into typed outcomes.

mod client;
pub mod response;

pub use client::ItkDbClient;
