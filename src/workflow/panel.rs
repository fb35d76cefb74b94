use std::path::PathBuf;

use log::info;
use serde_json::Value;

use crate::api::FabricApi;
use crate::manifest::phi::read_report_fields;
use crate::model::family::{GenomeFile, UploadedGenome};
use crate::model::vocab::Assembly;
use crate::request::report::{PanelReport, ReportRequest};
use crate::request::require_file;
use crate::request::schema::{self, Schema};
use crate::workflow::{fields_json, remove_uploads, report_id, Created, Progress, WorkflowError, WorkflowState};

/// The genome a panel report runs on
#[derive(Debug, Clone, PartialEq)]
pub enum PanelGenome {
    Existing(u64),
    Upload { project_id: u64, genome: GenomeFile, assembly: Assembly },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelLaunch {
    pub genome: PanelGenome,
    pub panel_id: u64,
    pub filter_id: Option<u64>,
    pub accession_id: String,
    pub patient_fields: Option<PathBuf>,
    pub keep_uploads: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelOutcome {
    pub upload: Option<UploadedGenome>,
    pub report: Value,
    pub patient_fields: Option<Value>,
}

/// Launch a panel report, uploading its genome first when it isn't on the remote system yet
pub fn launch_panel_report<A: FabricApi + ?Sized>(api: &A, launch: &PanelLaunch) -> Result<PanelOutcome, WorkflowError> {
    let mut progress = Progress::new();

    let patient_fields = match &launch.patient_fields {
        Some(path) => Some(fields_json(read_report_fields(path).map_err(|e| WorkflowError::new(&progress, e))?)),
        None => None,
    };
    let mut panel = PanelReport {
        genome_id: None,
        panel_id: launch.panel_id,
        filter_id: launch.filter_id,
        accession_id: launch.accession_id.clone(),
    };
    let planned = ReportRequest::Panel(panel.clone());
    planned
        .validate()
        .and_then(|_| schema::validate(Schema::Report, &planned.payload()))
        .and_then(|_| match &launch.genome {
            PanelGenome::Upload { genome, .. } => require_file(&genome.path),
            PanelGenome::Existing(_) => Ok(()),
        })
        .map_err(|e| WorkflowError::new(&progress, e))?;
    progress.advance(WorkflowState::ManifestParsed);

    let upload = match &launch.genome {
        PanelGenome::Existing(genome_id) => {
            panel.genome_id = Some(*genome_id);
            None
        }
        PanelGenome::Upload { project_id, genome, assembly } => {
            let uploaded = api
                .upload_genome(*project_id, genome, *assembly)
                .map_err(|e| WorkflowError::new(&progress, e))?;
            progress.record_upload(uploaded.genome_id);
            panel.genome_id = Some(uploaded.genome_id);
            Some(uploaded)
        }
    };

    let request = ReportRequest::Panel(panel);
    info!("Launching panel report for genome {:?}", upload.as_ref().map(|u| u.genome_id));
    let report = match api.create_report(&request) {
        Ok(report) => report,
        Err(e) => {
            let orphans = remove_uploads(api, progress.uploaded(), launch.keep_uploads);
            return Err(WorkflowError::new(&progress, e).with_orphans(orphans));
        }
    };
    progress.advance(WorkflowState::ReportCreated);

    let attached = match patient_fields {
        Some(fields) => {
            let id = report_id(&report).map_err(|e| WorkflowError::new(&progress, e))?;
            let attached = api
                .add_patient_fields(id, &fields)
                .map_err(|e| WorkflowError::new(&progress, e).with_created(Created::Report(id)))?;
            progress.advance(WorkflowState::PatientInfoAttached);
            Some(attached)
        }
        None => None,
    };

    progress.advance(WorkflowState::Done);
    Ok(PanelOutcome { upload, report, patient_fields: attached })
}
