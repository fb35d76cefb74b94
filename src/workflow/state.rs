use std::fmt;

use log::info;

/// Where a workflow run has got to
///
/// Family reports move through `Start`, `ManifestParsed`, `GenomesUploaded`, `ReportCreated`,
/// `PatientInfoAttached` and `Done`. Case containers are created before their genomes are
/// uploaded, so they pass through `ContainerCreated` instead of `ReportCreated`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WorkflowState {
    Start,
    ManifestParsed,
    GenomesUploaded(usize),
    ReportCreated,
    ContainerCreated,
    PatientInfoAttached,
    Done,
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WorkflowState::Start => write!(f, "start"),
            WorkflowState::ManifestParsed => write!(f, "manifest parsed"),
            WorkflowState::GenomesUploaded(n) => write!(f, "{n} genomes uploaded"),
            WorkflowState::ReportCreated => write!(f, "report created"),
            WorkflowState::ContainerCreated => write!(f, "case container created"),
            WorkflowState::PatientInfoAttached => write!(f, "patient information attached"),
            WorkflowState::Done => write!(f, "done"),
        }
    }
}

/// Current state plus the genomes uploaded so far in this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    state: WorkflowState,
    uploaded: Vec<u64>,
}

impl Progress {
    pub fn new() -> Progress {
        Progress { state: WorkflowState::Start, uploaded: Vec::new() }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn advance(&mut self, next: WorkflowState) {
        info!("Workflow state: {} -> {}", self.state, next);
        self.state = next;
    }

    /// Remember a genome id and count it as uploaded
    pub fn record_upload(&mut self, genome_id: u64) {
        self.uploaded.push(genome_id);
        self.advance(WorkflowState::GenomesUploaded(self.uploaded.len()));
    }

    /// Genome ids uploaded in this run, oldest first
    pub fn uploaded(&self) -> &[u64] {
        &self.uploaded
    }
}

impl Default for Progress {
    fn default() -> Self {
        Progress::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uploads_move_state_forward() {
        let mut progress = Progress::new();
        progress.advance(WorkflowState::ManifestParsed);
        progress.record_upload(11);
        progress.record_upload(12);
        assert_eq!(progress.state(), WorkflowState::GenomesUploaded(2));
        assert_eq!(progress.uploaded(), &[11, 12]);
    }

    #[test]
    fn states_read_as_text() {
        assert_eq!(WorkflowState::GenomesUploaded(3).to_string(), "3 genomes uploaded");
        assert_eq!(WorkflowState::ReportCreated.to_string(), "report created");
    }
}
