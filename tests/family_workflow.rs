use std::cell::RefCell;
use std::fs;

use serde_json::{json, Value};

use fabrica::api::{ApiError, CaseContainer, FabricApi};
use fabrica::model::family::{GenomeFile, UploadedGenome};
use fabrica::model::vocab::{Assembly, Platform};
use fabrica::request::case::{CaseGenome, CaseRequest};
use fabrica::request::report::{FamilyReportOptions, ReportRequest};
use fabrica::workflow::family::{launch_family_report, FamilyLaunch};
use fabrica::workflow::WorkflowState;

/// Records uploads and report bodies, optionally rejecting the report
#[derive(Default)]
struct Recorder {
    uploads: RefCell<Vec<String>>,
    deleted: RefCell<Vec<u64>>,
    reports: RefCell<Vec<Value>>,
    reject_report: bool,
}

impl FabricApi for Recorder {
    fn upload_genome(&self, project_id: u64, genome: &GenomeFile, _: Assembly) -> Result<UploadedGenome, ApiError> {
        assert_eq!(project_id, 31);
        let mut uploads = self.uploads.borrow_mut();
        uploads.push(genome.label.clone());
        Ok(UploadedGenome { genome_id: 900 + uploads.len() as u64, label: None, external_id: None, size: None })
    }

    fn delete_genome(&self, genome_id: u64) -> Result<Value, ApiError> {
        self.deleted.borrow_mut().push(genome_id);
        Ok(Value::Null)
    }

    fn create_report(&self, request: &ReportRequest) -> Result<Value, ApiError> {
        self.reports.borrow_mut().push(request.payload());
        match self.reject_report {
            true => Err(ApiError::Status { status: 500, body: "server error".to_string() }),
            false => Ok(json!({"id": 5, "status": "WAITING"})),
        }
    }

    fn update_report(&self, _: u64, _: &ReportRequest) -> Result<Value, ApiError> {
        unimplemented!("these tests launch new reports")
    }

    fn add_patient_fields(&self, _: u64, _: &Value) -> Result<Value, ApiError> {
        unimplemented!("no patient fields in these tests")
    }

    fn create_case_container(&self, _: &CaseRequest) -> Result<CaseContainer, ApiError> {
        unimplemented!("family reports don't use case containers")
    }

    fn upload_case_genome(&self, _: &str, _: &CaseGenome, _: Assembly, _: Option<Platform>) -> Result<(), ApiError> {
        unimplemented!("family reports don't use case containers")
    }
}

fn family_folder() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("family_manifest.csv"),
        "relationship,filename,label,external_id,sex,format,affected,genome_id\n\
         proband,proband.vcf.gz,proband,P1,male,,true,\n\
         sibling,,relative1,R1,female,,false,4411\n\
         mother,mother.vcf.gz,relative2,R2,female,,false,\n",
    )
    .unwrap();
    for name in ["proband.vcf.gz", "mother.vcf.gz"] {
        fs::write(dir.path().join(name), "##fileformat=VCFv4.2\n").unwrap();
    }
    dir
}

fn launch(folder: &std::path::Path) -> FamilyLaunch {
    FamilyLaunch {
        project_id: 31,
        folder: folder.to_path_buf(),
        assembly: Assembly::B38,
        options: FamilyReportOptions {
            accession_id: "FAM-1".to_string(),
            hpo_terms: vec!["HP:0001250".to_string()],
            ..Default::default()
        },
        report_id: None,
        patient_fields: None,
        keep_uploads: false,
    }
}

#[test]
fn only_file_backed_members_are_uploaded_in_order() {
    let dir = family_folder();
    let api = Recorder::default();
    let outcome = launch_family_report(&api, &launch(dir.path())).unwrap();

    assert_eq!(*api.uploads.borrow(), vec!["proband".to_string(), "relative2".to_string()]);
    assert_eq!(outcome.uploads.len(), 2);

    let reports = api.reports.borrow();
    assert_eq!(reports.len(), 1);
    let body = &reports[0];
    assert_eq!(body["report_type"], "Trio");
    assert_eq!(body["proband"]["genome_id"], 901);
    assert_eq!(body["family_1"]["genome_id"], 4411);
    assert_eq!(body["family_1"]["relationship"], "sibling");
    assert_eq!(body["family_2"]["genome_id"], 902);
    assert_eq!(body["hpo_terms"], "[\"HP:0001250\"]");
    assert_eq!(body["project_id"], Value::Null);
}

#[test]
fn rejected_report_cleans_up_in_reverse() {
    let dir = family_folder();
    let api = Recorder { reject_report: true, ..Default::default() };
    let err = launch_family_report(&api, &launch(dir.path())).unwrap_err();

    assert_eq!(err.state, WorkflowState::GenomesUploaded(2));
    assert_eq!(*api.deleted.borrow(), vec![902, 901]);
    assert!(err.orphaned_genomes.is_empty());
}

#[test]
fn missing_manifest_touches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let api = Recorder::default();
    let err = launch_family_report(&api, &launch(dir.path())).unwrap_err();

    assert_eq!(err.state, WorkflowState::Start);
    assert!(err.to_string().contains("family_manifest.csv"));
    assert!(api.uploads.borrow().is_empty());
}
