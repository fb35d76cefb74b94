//! Typed descriptions of families, genomes and patient information

/// Enumerations shared by the command line and request payloads
pub mod vocab;

/// Family members and their genome sources
pub mod family;

/// Patient information (PHI) sections and lookup tables
pub mod patient;
