//! Talk to the clinical genomics REST API
//!
//! [`FabricApi`] covers the calls a workflow makes, so the sequencer can run against a fake in
//! tests. [`client::FabricClient`] is the real implementation over blocking `reqwest` and also
//! carries the single-call endpoints used directly by the command line.

use serde::Deserialize;
use serde_json::Value;

use crate::model::family::{GenomeFile, UploadedGenome};
use crate::model::vocab::{Assembly, Platform};
use crate::request::case::{CaseGenome, CaseRequest};
use crate::request::report::ReportRequest;

/// Blocking HTTP client with Basic authentication
pub mod client;

/// Transport and response errors
pub mod error;

pub use error::ApiError;

/// Remote calls made by the workflow sequencer
pub trait FabricApi {
    /// `PUT /projects/{id}/genomes`, streaming the genome file as the body
    fn upload_genome(&self, project_id: u64, genome: &GenomeFile, assembly: Assembly) -> Result<UploadedGenome, ApiError>;

    /// `DELETE /genomes/{id}`
    fn delete_genome(&self, genome_id: u64) -> Result<Value, ApiError>;

    /// `POST /reports/`, returns the `clinical_report` object
    fn create_report(&self, request: &ReportRequest) -> Result<Value, ApiError>;

    /// `PUT /reports/{id}`, attaching genomes to a report that is waiting for them
    fn update_report(&self, report_id: u64, request: &ReportRequest) -> Result<Value, ApiError>;

    /// `POST /reports/{id}/patient_fields`
    fn add_patient_fields(&self, report_id: u64, fields: &Value) -> Result<Value, ApiError>;

    /// `POST /case_containers`
    fn create_case_container(&self, request: &CaseRequest) -> Result<CaseContainer, ApiError>;

    /// Multipart `POST` of a VCF to a member upload URL returned with the case container
    fn upload_case_genome(
        &self,
        url: &str,
        genome: &CaseGenome,
        assembly: Assembly,
        platform: Option<Platform>,
    ) -> Result<(), ApiError>;
}

/// A freshly created case container
#[derive(Debug, Clone, PartialEq)]
pub struct CaseContainer {
    pub case_container_id: u64,
    pub status: Option<String>,
    /// One upload URL per member, in request order
    pub urls: Vec<MemberUrl>,
    pub raw: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MemberUrl {
    pub url: String,
    pub member_id: u64,
}

impl CaseContainer {
    pub fn from_value(value: Value) -> Result<CaseContainer, ApiError> {
        let unexpected = |expected| ApiError::UnexpectedResponse { expected, body: value.to_string() };
        let case_container_id = id_field(&value, "case_container_id").ok_or_else(|| unexpected("case_container_id"))?;
        let urls = match value.get("urls") {
            None | Some(Value::Null) => Vec::new(),
            Some(urls) => Vec::<MemberUrl>::deserialize(urls).map_err(|_| unexpected("member upload urls"))?,
        };
        let status = value.get("status").and_then(Value::as_str).map(str::to_string);
        Ok(CaseContainer { case_container_id, status, urls, raw: value })
    }
}

/// A numeric id, sent either as a JSON number or as a string of digits
pub fn id_field(value: &Value, key: &str) -> Option<u64> {
    match value.get(key) {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn container_keeps_upload_urls_in_member_order() {
        let container = CaseContainer::from_value(json!({
            "case_container_id": "42",
            "status": "DRAFT",
            "urls": [
                {"url": "https://upload.test/b", "member_id": 9},
                {"url": "https://upload.test/a", "member_id": 3}
            ]
        }))
        .unwrap();
        assert_eq!(container.case_container_id, 42);
        assert_eq!(container.status.as_deref(), Some("DRAFT"));
        assert_eq!(container.urls.iter().map(|u| u.member_id).collect::<Vec<_>>(), vec![9, 3]);
        assert_eq!(container.raw["urls"][0]["url"], "https://upload.test/b");
    }

    #[test]
    fn container_without_id_is_unexpected() {
        let err = CaseContainer::from_value(json!({"description": "invalid member"})).unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedResponse { expected: "case_container_id", .. }));
        assert_eq!(err.body(), Some("{\"description\":\"invalid member\"}"));

        let err = CaseContainer::from_value(json!({"case_container_id": 1, "urls": [{"url": 5}]})).unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedResponse { expected: "member upload urls", .. }));
    }

    #[test]
    fn container_without_urls_has_no_members_to_upload() {
        let container = CaseContainer::from_value(json!({"case_container_id": 7})).unwrap();
        assert!(container.urls.is_empty());
        assert_eq!(container.status, None);
    }
}
