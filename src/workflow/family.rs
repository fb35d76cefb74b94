use std::path::PathBuf;

use log::{info, warn};
use serde_json::Value;

use crate::api::FabricApi;
use crate::manifest::family::read_family_manifest;
use crate::manifest::phi::read_report_fields;
use crate::model::family::{Family, FamilyMember, GenomeSource, UploadedGenome};
use crate::model::vocab::Assembly;
use crate::request::report::{FamilyReport, FamilyReportOptions, ReportRequest};
use crate::request::require_file;
use crate::request::schema::{self, Schema};
use crate::workflow::{fields_json, remove_uploads, report_id, Created, Progress, WorkflowError, WorkflowState};

/// Inputs for a family report launch
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyLaunch {
    pub project_id: u64,
    /// Folder holding `family_manifest.csv` and the genome files it names
    pub folder: PathBuf,
    pub assembly: Assembly,
    pub options: FamilyReportOptions,
    /// Report to attach the genomes to, a new report is launched when unset
    pub report_id: Option<u64>,
    /// Positional clinical report fields to attach once the report exists
    pub patient_fields: Option<PathBuf>,
    pub keep_uploads: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FamilyOutcome {
    pub uploads: Vec<UploadedGenome>,
    /// The `clinical_report` object returned by the API
    pub report: Value,
    pub patient_fields: Option<Value>,
}

/// Upload a family's genomes and launch one report over them, or attach them to an existing one
///
/// Everything local (manifest, genome files, report shape, patient fields) is checked before the
/// first upload. If an upload or the report request fails, genomes uploaded by this run are
/// deleted unless `keep_uploads` is set.
pub fn launch_family_report<A: FabricApi + ?Sized>(api: &A, launch: &FamilyLaunch) -> Result<FamilyOutcome, WorkflowError> {
    let mut progress = Progress::new();

    let family = read_family_manifest(&launch.folder).map_err(|e| WorkflowError::new(&progress, e))?;
    family
        .members
        .iter()
        .filter_map(FamilyMember::upload)
        .try_for_each(|file| require_file(&file.path))
        .map_err(|e| WorkflowError::new(&progress, e))?;
    let patient_fields = match &launch.patient_fields {
        Some(path) => {
            let fields = read_report_fields(path).map_err(|e| WorkflowError::new(&progress, e))?;
            Some(fields_json(fields))
        }
        None => None,
    };
    // same checks the real request gets, with genomes still to upload left empty
    let planned = FamilyReport::from_family(&family, &genome_ids(&family, &[]), launch.options.clone())
        .map_err(|e| WorkflowError::new(&progress, e))?;
    schema::validate(Schema::Report, &ReportRequest::Family(planned).payload())
        .map_err(|e| WorkflowError::new(&progress, e))?;
    progress.advance(WorkflowState::ManifestParsed);

    let mut uploads = Vec::new();
    for member in family.members.iter() {
        let Some(file) = member.upload() else { continue };
        info!("Uploading {} genome {}", member.relationship, file.label);
        match api.upload_genome(launch.project_id, file, launch.assembly) {
            Ok(uploaded) => {
                progress.record_upload(uploaded.genome_id);
                uploads.push(uploaded);
            }
            Err(e) => {
                let orphans = remove_uploads(api, progress.uploaded(), launch.keep_uploads);
                return Err(WorkflowError::new(&progress, e).with_orphans(orphans));
            }
        }
    }

    let ids = genome_ids(&family, progress.uploaded());
    let request = FamilyReport::from_family(&family, &ids, launch.options.clone())
        .map(ReportRequest::Family)
        .and_then(|request| schema::validate(Schema::Report, &request.payload()).map(|_| request));
    let request = match request {
        Ok(request) => request,
        Err(e) => {
            let orphans = remove_uploads(api, progress.uploaded(), launch.keep_uploads);
            return Err(WorkflowError::new(&progress, e).with_orphans(orphans));
        }
    };

    let sent = match launch.report_id {
        Some(id) => {
            info!("Attaching genomes to {} report {id}", request.label());
            api.update_report(id, &request)
        }
        None => {
            info!("Launching {} family report", request.label());
            api.create_report(&request)
        }
    };
    let report = match sent {
        Ok(report) => report,
        Err(e) => {
            warn!("Report request failed after {} uploads", progress.uploaded().len());
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
    Ok(FamilyOutcome { uploads, report, patient_fields: attached })
}

/// Genome id for each member, in member order
///
/// `uploaded` holds the ids returned for the members with files, in the same order.
fn genome_ids(family: &Family, uploaded: &[u64]) -> Vec<Option<u64>> {
    let mut uploaded = uploaded.iter();
    family
        .members
        .iter()
        .map(|member| match &member.genome {
            GenomeSource::Upload(_) => uploaded.next().copied(),
            GenomeSource::Existing(id) => Some(*id),
            GenomeSource::Unsequenced => None,
        })
        .collect()
}
