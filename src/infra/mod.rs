//! Concrete clients for external services.

pub mod itkdb;
