//! Command line client for a clinical genomics REST API
//!
//! Reads family and case manifests, uploads genomes, launches clinical reports and case
//! containers, and prints what the API sends back.

/// Connection settings read from the environment
pub mod config;

/// Vocabulary and domain types shared by every request
pub mod model;

/// CSV manifests and patient information files
pub mod manifest;

/// Outbound request payloads and their validation
pub mod request;

/// REST API client
pub mod api;

/// Multi-step workflows with state tracking and cleanup
pub mod workflow;

/// Output formatting
pub mod display;

/// Command line definitions and dispatch
pub mod cli;
