//! Test doubles shared by unit tests, integration tests and downstream crates

pub mod mocks;
