use std::fs::File;
use std::time::Duration;

use log::{debug, info};
use reqwest::blocking::{multipart, Body, Client, RequestBuilder};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde_json::Value;
use url::Url;

use crate::api::{id_field, ApiError, CaseContainer, FabricApi};
use crate::config::Config;
use crate::model::family::{GenomeFile, UploadedGenome};
use crate::model::vocab::{Assembly, Platform, ShareRole, ToReport, VariantFormat};
use crate::request::case::{CaseGenome, CaseRequest};
use crate::request::patch::{PatchOp, JSON_PATCH};
use crate::request::report::ReportRequest;

pub struct FabricClient {
    config: Config,
    http: Client,
    /// Genome bodies can take longer than any fixed deadline, so only connecting is bounded
    uploads: Client,
}

/// Filters for `GET /reports/{id}/variants`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariantQuery {
    pub statuses: Vec<String>,
    pub to_reports: Vec<ToReport>,
    pub extended: bool,
    pub chrom: Option<String>,
    pub start_on_chrom: Option<u64>,
    pub end_on_chrom: Option<u64>,
    pub alt: Option<String>,
    pub format: Option<VariantFormat>,
}

impl VariantQuery {
    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        pairs.extend(self.statuses.iter().map(|s| ("status", s.clone())));
        pairs.extend(self.to_reports.iter().map(|t| ("or_to_report", t.to_string())));
        if self.extended {
            pairs.push(("extended", "True".to_string()));
        }
        if let Some(chrom) = &self.chrom {
            pairs.push(("chrom", chrom.clone()));
        }
        if let Some(start) = self.start_on_chrom {
            pairs.push(("start_on_chrom", start.to_string()));
        }
        if let Some(end) = self.end_on_chrom {
            pairs.push(("end_on_chrom", end.to_string()));
        }
        if let Some(alt) = &self.alt {
            pairs.push(("alt", alt.clone()));
        }
        // JSON is the server default
        if let Some(format) = self.format.filter(|f| *f != VariantFormat::Json) {
            pairs.push(("format", format.to_string()));
        }
        pairs
    }
}

impl FabricClient {
    pub fn new(config: &Config) -> Result<FabricClient, ApiError> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .build()?;
        let uploads = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(None::<Duration>)
            .build()?;
        info!("Using API at {}", config.base_url);
        Ok(FabricClient { config: config.clone(), http, uploads })
    }

    fn url(&self, segments: &[&str]) -> Url {
        self.config.endpoint(segments)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.config.login, Some(&self.config.password))
    }

    /// Send a request and return the raw body, failing on any non-success status
    fn send_text(&self, request: RequestBuilder) -> Result<(StatusCode, String), ApiError> {
        let response = self.authed(request).send()?;
        let status = response.status();
        let body = response.text()?;
        debug!("HTTP {status}, {} bytes", body.len());
        if !status.is_success() {
            return Err(ApiError::Status { status: status.as_u16(), body });
        }
        Ok((status, body))
    }

    fn send_json(&self, request: RequestBuilder) -> Result<Value, ApiError> {
        let (_, body) = self.send_text(request)?;
        parse_json(body)
    }

    pub fn create_project(&self, name: &str, description: &str, share_role: ShareRole) -> Result<Value, ApiError> {
        info!("Creating project {name}");
        let form = [
            ("project_name", name.to_string()),
            ("description", description.to_string()),
            ("share_role", share_role.to_string()),
        ];
        self.send_json(self.http.post(self.url(&["projects", ""])).form(&form))
    }

    pub fn list_projects(&self) -> Result<Value, ApiError> {
        self.send_json(self.http.get(self.url(&["projects", ""])))
    }

    pub fn list_genomes(&self, project_id: u64) -> Result<Value, ApiError> {
        self.send_json(self.http.get(self.url(&["projects", &project_id.to_string(), "genomes"])))
    }

    pub fn list_reports(&self, extended: bool) -> Result<Value, ApiError> {
        let mut request = self.http.get(self.url(&["reports", ""]));
        if extended {
            request = request.query(&[("extended", "True")]);
        }
        self.send_json(request)
    }

    pub fn get_patient_fields(&self, report_id: u64) -> Result<Value, ApiError> {
        self.send_json(self.http.get(self.url(&["reports", &report_id.to_string(), "patient_fields"])))
    }

    pub fn get_report(&self, report_id: u64, extended: bool) -> Result<Value, ApiError> {
        let mut request = self.http.get(self.url(&["reports", &report_id.to_string(), ""]));
        if extended {
            request = request.query(&[("extended", "True")]);
        }
        self.send_json(request)
    }

    /// Report variants as JSON, or as raw VCF/CSV text when another format was asked for
    pub fn report_variants(&self, report_id: u64, query: &VariantQuery) -> Result<Value, ApiError> {
        let request = self
            .http
            .get(self.url(&["reports", &report_id.to_string(), "variants"]))
            .query(&query.pairs());
        let (_, body) = self.send_text(request)?;
        match query.format {
            Some(VariantFormat::Vcf) | Some(VariantFormat::Csv) => Ok(Value::String(body)),
            _ => parse_json(body),
        }
    }

    pub fn patch_variant(&self, report_id: u64, variant_id: u64, ops: &[PatchOp]) -> Result<Value, ApiError> {
        info!("Patching variant {variant_id} of report {report_id}");
        let url = self.url(&["reports", &report_id.to_string(), "variants", &variant_id.to_string()]);
        self.send_patch(url, ops)
    }

    pub fn update_report_status(&self, report_id: u64, ops: &[PatchOp]) -> Result<Value, ApiError> {
        info!("Updating status of report {report_id}");
        let url = self.url(&["reports", &report_id.to_string(), "update_status", ""]);
        self.send_patch(url, ops)
    }

    fn send_patch(&self, url: Url, ops: &[PatchOp]) -> Result<Value, ApiError> {
        let body = serde_json::to_string(ops)?;
        self.send_json(self.http.patch(url).header(CONTENT_TYPE, JSON_PATCH).body(body))
    }
}

impl FabricApi for FabricClient {
    fn upload_genome(&self, project_id: u64, genome: &GenomeFile, assembly: Assembly) -> Result<UploadedGenome, ApiError> {
        info!("Uploading {} to project {project_id}", genome.path.display());
        let file = File::open(&genome.path)
            .map_err(|source| ApiError::File { path: genome.path.clone(), source })?;
        let query = [
            ("genome_label", genome.label.clone()),
            ("genome_sex", genome.sex.to_string()),
            ("external_id", genome.external_id.clone()),
            ("assembly_version", assembly.to_string()),
            ("format", genome.format.clone()),
        ];
        let request = self
            .uploads
            .put(self.url(&["projects", &project_id.to_string(), "genomes"]))
            .query(&query)
            .body(Body::from(file));
        let value = self.send_json(request)?;
        uploaded_genome(value)
    }

    fn delete_genome(&self, genome_id: u64) -> Result<Value, ApiError> {
        info!("Deleting genome {genome_id}");
        self.send_json(self.http.delete(self.url(&["genomes", &genome_id.to_string()])))
    }

    fn create_report(&self, request: &ReportRequest) -> Result<Value, ApiError> {
        info!("Launching {} report", request.label());
        let response = self.send_json(self.http.post(self.url(&["reports", ""])).json(&request.payload()))?;
        clinical_report(response)
    }

    fn update_report(&self, report_id: u64, request: &ReportRequest) -> Result<Value, ApiError> {
        info!("Attaching genomes to report {report_id}");
        let url = self.url(&["reports", &report_id.to_string()]);
        let response = self.send_json(self.http.put(url).json(&request.payload()))?;
        clinical_report(response)
    }

    fn add_patient_fields(&self, report_id: u64, fields: &Value) -> Result<Value, ApiError> {
        info!("Adding patient fields to report {report_id}");
        let url = self.url(&["reports", &report_id.to_string(), "patient_fields"]);
        self.send_json(self.http.post(url).json(fields))
    }

    fn create_case_container(&self, request: &CaseRequest) -> Result<CaseContainer, ApiError> {
        info!("Creating case container");
        let response = self.send_json(self.http.post(self.url(&["case_containers"])).json(request))?;
        CaseContainer::from_value(response)
    }

    fn upload_case_genome(
        &self,
        url: &str,
        genome: &CaseGenome,
        assembly: Assembly,
        platform: Option<Platform>,
    ) -> Result<(), ApiError> {
        info!("Uploading {} to {url}", genome.vcf.display());
        let mut form = multipart::Form::new()
            .text("genome_name", genome.genome_name.clone())
            .text("assembly_version", assembly.to_string());
        if let Some(checksum) = &genome.checksum {
            form = form.text("checksum", checksum.clone());
        }
        if let Some(platform) = platform {
            form = form.text("sequencing_platform", platform.to_string());
        }
        let form = form
            .file("genome_file", &genome.vcf)
            .map_err(|source| ApiError::File { path: genome.vcf.clone(), source })?;

        let (status, body) = self.send_text(self.uploads.post(url).multipart(form))?;
        require_created(status, body)
    }
}

fn parse_json(body: String) -> Result<Value, ApiError> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body).map_err(|_| ApiError::UnexpectedResponse { expected: "JSON body", body })
}

/// The `clinical_report` object a report launch or update answers with
pub fn clinical_report(response: Value) -> Result<Value, ApiError> {
    match response.get("clinical_report") {
        Some(report) if report.is_object() => Ok(report.clone()),
        _ => Err(ApiError::UnexpectedResponse { expected: "clinical_report", body: response.to_string() }),
    }
}

/// Member uploads answer 201 once the file is stored, any other success code means it wasn't
fn require_created(status: StatusCode, body: String) -> Result<(), ApiError> {
    match status == StatusCode::CREATED {
        true => Ok(()),
        false => Err(ApiError::Status { status: status.as_u16(), body }),
    }
}

/// Read the genome id and echoed metadata from an upload response
pub fn uploaded_genome(value: Value) -> Result<UploadedGenome, ApiError> {
    let genome_id = id_field(&value, "genome_id")
        .ok_or_else(|| ApiError::UnexpectedResponse { expected: "genome_id", body: value.to_string() })?;

    let text = |key: &str| match value.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    Ok(UploadedGenome {
        genome_id,
        label: text("genome_label").or_else(|| text("label")),
        external_id: text("external_id"),
        size: value.get("size").and_then(Value::as_u64),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn upload_response_accepts_string_ids() {
        let genome = uploaded_genome(json!({"genome_id": "1201", "genome_label": "kid", "external_id": 3, "size": 2048})).unwrap();
        assert_eq!(genome.genome_id, 1201);
        assert_eq!(genome.label.as_deref(), Some("kid"));
        assert_eq!(genome.external_id.as_deref(), Some("3"));
        assert_eq!(genome.size, Some(2048));
    }

    #[test]
    fn upload_response_without_id_keeps_body() {
        let err = uploaded_genome(json!({"description": "bad format"})).unwrap_err();
        assert_eq!(err.body(), Some("{\"description\":\"bad format\"}"));
    }

    #[test]
    fn variant_query_repeats_filters() {
        let query = VariantQuery {
            statuses: vec!["REVIEW".to_string(), "FAILED_CONFIRMATION".to_string()],
            to_reports: vec![ToReport::PrimaryFinding],
            extended: true,
            format: Some(VariantFormat::Json),
            ..Default::default()
        };
        let pairs = query.pairs();
        assert_eq!(pairs[0], ("status", "REVIEW".to_string()));
        assert_eq!(pairs[1], ("status", "FAILED_CONFIRMATION".to_string()));
        assert_eq!(pairs[2], ("or_to_report", "PRIMARY_FINDING".to_string()));
        assert_eq!(pairs[3], ("extended", "True".to_string()));
        assert_eq!(pairs.len(), 4);
    }

    #[test]
    fn non_json_body_is_unexpected() {
        let err = parse_json("<html>502</html>".to_string()).unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedResponse { expected: "JSON body", .. }));
        assert_eq!(parse_json("  ".to_string()).unwrap(), Value::Null);
    }

    #[test]
    fn report_responses_must_carry_the_report() {
        let report = clinical_report(json!({"clinical_report": {"id": 12, "status": "WAITING"}})).unwrap();
        assert_eq!(report, json!({"id": 12, "status": "WAITING"}));

        let err = clinical_report(json!({"description": "genome 9 not found"})).unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedResponse { expected: "clinical_report", .. }));
        assert_eq!(err.body(), Some("{\"description\":\"genome 9 not found\"}"));
    }

    #[test]
    fn member_upload_needs_created() {
        assert!(require_created(StatusCode::CREATED, String::new()).is_ok());
        let err = require_created(StatusCode::OK, "queued".to_string()).unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 200, ref body } if body == "queued"));
    }

    #[test]
    fn encode_failure_is_an_error() {
        let err: ApiError = serde_json::from_str::<Value>("{").unwrap_err().into();
        assert!(matches!(err, ApiError::Encode(_)));
        assert!(err.to_string().starts_with("Can't encode request body"));
    }
}
