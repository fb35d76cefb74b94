//! Run the multi-step operations: upload genomes, launch a report or case container, attach
//! patient information
//!
//! Steps run one after another against a [`FabricApi`]. Nothing is retried. A failure stops the
//! run at the state it had reached and reports anything left behind on the remote system.

use std::fmt;

use log::{info, warn};
use serde_json::Value;
use thiserror::Error;

use crate::api::{id_field, ApiError, FabricApi};
use crate::manifest::ManifestError;
use crate::model::patient::Fields;
use crate::request::ValidationError;

/// Family report launch: manifest, uploads, report, patient fields
pub mod family;

/// Panel report launch for a single genome
pub mod panel;

/// Case container creation and member genome uploads
pub mod case;

/// Workflow state machine
pub mod state;

pub use state::{Progress, WorkflowState};

/// What went wrong inside a step
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Something a run created on the remote system before it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Created {
    Report(u64),
    CaseContainer(u64),
}

impl fmt::Display for Created {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Created::Report(id) => write!(f, "report {id}"),
            Created::CaseContainer(id) => write!(f, "case container {id}"),
        }
    }
}

/// A failed run, with the state it stopped in
#[derive(Debug, Error)]
#[error("{source} (stopped at: {state}{})", left_behind(.created, .orphaned_genomes))]
pub struct WorkflowError {
    pub state: WorkflowState,
    /// Report or case container created before the failure
    pub created: Option<Created>,
    /// Genome ids uploaded in this run that are still on the remote system and not used by a
    /// report
    pub orphaned_genomes: Vec<u64>,
    pub source: StepError,
}

impl WorkflowError {
    pub fn new(progress: &Progress, source: impl Into<StepError>) -> WorkflowError {
        WorkflowError { state: progress.state(), created: None, orphaned_genomes: Vec::new(), source: source.into() }
    }

    pub fn with_created(mut self, created: Created) -> WorkflowError {
        self.created = Some(created);
        self
    }

    pub fn with_orphans(mut self, genomes: Vec<u64>) -> WorkflowError {
        self.orphaned_genomes = genomes;
        self
    }
}

fn left_behind(created: &Option<Created>, orphans: &[u64]) -> String {
    let mut text = String::new();
    if let Some(created) = created {
        text.push_str(&format!(", created {created}"));
    }
    if !orphans.is_empty() {
        text.push_str(&format!(", genomes left on the server: {orphans:?}"));
    }
    text
}

/// Delete genomes uploaded in this run, newest first
///
/// Deletion is best effort. Returns the ids still on the remote system, every one of which has
/// been logged for manual cleanup.
pub fn remove_uploads<A: FabricApi + ?Sized>(api: &A, uploaded: &[u64], keep_uploads: bool) -> Vec<u64> {
    if uploaded.is_empty() {
        return Vec::new();
    }
    if keep_uploads {
        warn!("Keeping uploaded genomes {uploaded:?}, they are not used by any report");
        return uploaded.to_vec();
    }

    let mut remaining = Vec::new();
    for genome_id in uploaded.iter().rev() {
        match api.delete_genome(*genome_id) {
            Ok(_) => info!("Deleted genome {genome_id}"),
            Err(e) => {
                warn!("Can't delete genome {genome_id}: {e}");
                remaining.push(*genome_id);
            }
        }
    }
    if !remaining.is_empty() {
        warn!("Genomes {remaining:?} need to be deleted manually");
    }
    remaining
}

/// The `id` of a created clinical report
pub fn report_id(report: &Value) -> Result<u64, ApiError> {
    id_field(report, "id")
        .ok_or_else(|| ApiError::UnexpectedResponse { expected: "clinical report id", body: report.to_string() })
}

/// Clinical report fields as the JSON object `patient_fields` takes
pub fn fields_json(fields: Fields) -> Value {
    Value::Object(fields.into_iter().map(|(k, v)| (k, Value::String(v))).collect())
}
