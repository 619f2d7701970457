//! Contracts for the external services the uploader talks to.

pub mod test_database;
