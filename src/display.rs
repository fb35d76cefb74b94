//! Print API responses
//!
//! Raw responses are printed as indented JSON. Launch and upload results get a short
//! `label: value` summary rendered with TinyTemplate from `data/templates`.

use serde::Serialize;
use serde_json::Value;
use tinytemplate::error::Error as TemplateError;
use tinytemplate::{format_unescaped, TinyTemplate};

use crate::api::CaseContainer;
use crate::model::family::UploadedGenome;

/// Printed in place of a field the response didn't include
static MISSING: &str = "Missing";

/// Pretty JSON for objects, raw text for VCF and CSV bodies
pub fn to_output(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

pub fn print_json(value: &Value) {
    println!("{}", to_output(value));
}

#[derive(Serialize)]
struct ReportContext {
    heading: String,
    id: String,
    test_type: String,
    accession_id: String,
    created_on: String,
    created_by: String,
    status: String,
    filter_id: String,
    panel_id: String,
    workspace_id: String,
    sample_collected_date: String,
    sample_received_date: String,
    include_cosmic: String,
}

#[derive(Serialize)]
struct GenomeContext {
    genome_id: u64,
    label: String,
    external_id: String,
    size: String,
}

#[derive(Serialize)]
struct CaseContext {
    case_container_id: u64,
    status: String,
    members: Vec<MemberContext>,
}

#[derive(Serialize)]
struct MemberContext {
    member_id: u64,
    state: String,
}

/// Render a `clinical_report` object as a confirmation block
pub fn render_report(heading: &str, report: &Value) -> Result<String, TemplateError> {
    /// included clinical report template
    static REPORT: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/report.txt"));
    let get = |key: &str| field(report, key);
    let context = ReportContext {
        heading: heading.to_string(),
        id: get("id"),
        test_type: get("test_type"),
        accession_id: get("accession_id"),
        created_on: get("created_on"),
        created_by: get("created_by"),
        status: get("status"),
        filter_id: get("filter_id"),
        panel_id: get("panel_id"),
        workspace_id: get("workspace_id"),
        sample_collected_date: get("sample_collected_date"),
        sample_received_date: get("sample_received_date"),
        include_cosmic: get("include_cosmic"),
    };
    render("report", REPORT, &context)
}

pub fn render_genome(genome: &UploadedGenome) -> Result<String, TemplateError> {
    /// included genome upload template
    static GENOME: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/genome.txt"));
    let context = GenomeContext {
        genome_id: genome.genome_id,
        label: genome.label.clone().unwrap_or_else(|| MISSING.to_string()),
        external_id: genome.external_id.clone().unwrap_or_else(|| MISSING.to_string()),
        size: genome.size.map_or_else(|| MISSING.to_string(), |s| s.to_string()),
    };
    render("genome", GENOME, &context)
}

/// Summarise a case container and which members got a genome
pub fn render_case(container: &CaseContainer, uploaded_members: &[u64]) -> Result<String, TemplateError> {
    /// included case container template
    static CASE: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/case.txt"));
    let members = container
        .urls
        .iter()
        .map(|member| MemberContext {
            member_id: member.member_id,
            state: match uploaded_members.contains(&member.member_id) {
                true => "genome uploaded".to_string(),
                false => "no genome".to_string(),
            },
        })
        .collect();
    let context = CaseContext {
        case_container_id: container.case_container_id,
        status: container.status.clone().unwrap_or_else(|| MISSING.to_string()),
        members,
    };
    render("case", CASE, &context)
}

fn render<C: Serialize>(name: &str, template: &str, context: &C) -> Result<String, TemplateError> {
    let mut tt = TinyTemplate::new();
    tt.set_default_formatter(&format_unescaped);
    tt.add_template(name, template)?;
    tt.render(name, context)
}

/// A response field as plain text
fn field(object: &Value, key: &str) -> String {
    match object.get(key) {
        None | Some(Value::Null) => MISSING.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
