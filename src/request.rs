//! Build and validate outbound request payloads
//!
//! Payloads are checked locally before anything is sent. A request that fails validation never
//! reaches the network, so no remote state is touched.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::vocab::{Relationship, ReportType};

/// Clinical report requests (panel and family)
pub mod report;

/// Case container requests
pub mod case;

/// JSON Patch documents for report and variant updates
pub mod patch;

/// Bundled JSON schemas for payload validation
pub mod schema;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("at least one --analysis type is required")]
    NoAnalysis,
    #[error("--analysis PANEL can not be specified with other analyses")]
    PanelWithOtherAnalyses,
    #[error("missing --test_id, required for PANEL analysis")]
    MissingTestId,
    #[error("Only WGS analysis type accepts HPO terms")]
    HpoWithoutWgs,
    #[error("Only WGS analysis type accepts family members, check the patient information file if one was given")]
    FamilyWithoutWgs,
    #[error("Missing --hpo_terms required for WGS analysis")]
    MissingHpo,
    #[error("--{0}_relationship, --{0}_sex and --{0}_accession need to be specified for family member {0}")]
    IncompleteRelative(String),
    #[error("--{0}_genome and --{0}_vcf are required")]
    IncompleteRelativeGenome(String),
    #[error("--genome and --vcf are required together for the proband")]
    IncompleteProbandGenome,
    #[error("family member {0} must be a MOTHER or FATHER, got {1}")]
    RelativeNotParent(String, Relationship),
    #[error("missing --accession <identifier>, must be provided either in the patient information file or as command line option")]
    MissingAccession,
    #[error("The sex must be provided either in the patient information file or as command line option")]
    MissingSex,
    #[error("{field} from the patient information file is invalid: {message}")]
    InvalidPatientInfo { field: String, message: String },
    #[error("family report needs a proband")]
    NoProband,
    #[error("{0} relatives is more than a family report supports")]
    TooManyRelatives(usize),
    #[error("{report_type} report expects {expected} relatives, got {found}")]
    ReportTypeMismatch { report_type: ReportType, expected: usize, found: usize },
    #[error("a relative can't be the proband")]
    RelativeIsProband,
    #[error("expected {expected} resolved genome ids, got {found}")]
    GenomeCountMismatch { expected: usize, found: usize },
    #[error("nothing to patch, give at least one field to change")]
    EmptyPatch,
    #[error("{} is not a file", .0.display())]
    MissingFile(PathBuf),
    #[error("payload does not match the {schema} schema: {}", .errors.join("; "))]
    Schema { schema: &'static str, errors: Vec<String> },
}

/// Fail unless `path` names an existing regular file
pub fn require_file(path: &Path) -> Result<(), ValidationError> {
    match path.is_file() {
        true => Ok(()),
        false => Err(ValidationError::MissingFile(path.to_path_buf())),
    }
}
