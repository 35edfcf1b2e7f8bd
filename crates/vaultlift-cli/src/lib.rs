//! Vaultlift CLI Library
//!
//! Command line front end for the migration pipeline: argument parsing,
//! document discovery, the document-level scheduler, concrete uploaders and
//! terminal output.

pub mod cli;
pub mod commands;
pub mod output;
pub mod storage;
