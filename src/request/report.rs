use serde_json::{json, Map, Value};

use crate::model::family::{Family, FamilyMember};
use crate::model::vocab::{Relationship, ReportType, Sex};
use crate::request::ValidationError;

/// Request body for `POST /reports/`
///
/// Panel reports have no family members by construction; family reports always carry a proband.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportRequest {
    Panel(PanelReport),
    Family(FamilyReport),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelReport {
    pub genome_id: Option<u64>,
    pub panel_id: u64,
    pub filter_id: Option<u64>,
    pub accession_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FamilyReport {
    pub report_type: ReportType,
    pub proband: ReportMember,
    pub relatives: Vec<ReportMember>,
    pub options: FamilyReportOptions,
}

/// A member as it appears in a family report request, genome already resolved to an id
#[derive(Debug, Clone, PartialEq)]
pub struct ReportMember {
    pub genome_id: Option<u64>,
    pub sex: Sex,
    pub affected: Option<bool>,
    pub relationship: Relationship,
    pub label: Option<String>,
}

impl ReportMember {
    fn from_member(member: &FamilyMember, genome_id: Option<u64>) -> ReportMember {
        ReportMember {
            genome_id,
            sex: member.sex,
            affected: member.affected,
            relationship: member.relationship,
            label: member.label.clone(),
        }
    }
}

/// Report level settings that don't come from the manifest
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FamilyReportOptions {
    pub accession_id: String,
    pub score_indels: bool,
    pub reporting_cutoff: Option<u32>,
    pub project_id: Option<u64>,
    pub hpo_terms: Vec<String>,
}

impl FamilyReport {
    /// Build a family report from a manifest and the genome id resolved for each member
    ///
    /// `genome_ids` runs parallel to `family.members`.
    pub fn from_family(
        family: &Family,
        genome_ids: &[Option<u64>],
        options: FamilyReportOptions,
    ) -> Result<FamilyReport, ValidationError> {
        if genome_ids.len() != family.members.len() {
            return Err(ValidationError::GenomeCountMismatch {
                expected: family.members.len(),
                found: genome_ids.len(),
            });
        }

        let mut proband = None;
        let mut relatives = Vec::new();
        for (member, genome_id) in family.members.iter().zip(genome_ids) {
            let resolved = ReportMember::from_member(member, *genome_id);
            if member.is_proband() {
                proband = Some(resolved);
            } else {
                relatives.push(resolved);
            }
        }

        let proband = proband.ok_or(ValidationError::NoProband)?;
        let report_type = ReportType::for_family_size(relatives.len())
            .ok_or(ValidationError::TooManyRelatives(relatives.len()))?;

        let report = FamilyReport { report_type, proband, relatives, options };
        report.validate()?;
        Ok(report)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.relatives.len() != self.report_type.relatives() {
            return Err(ValidationError::ReportTypeMismatch {
                report_type: self.report_type,
                expected: self.report_type.relatives(),
                found: self.relatives.len(),
            });
        }
        if self.relatives.iter().any(|r| r.relationship == Relationship::Proband) {
            return Err(ValidationError::RelativeIsProband);
        }
        if self.options.accession_id.trim().is_empty() {
            return Err(ValidationError::MissingAccession);
        }
        Ok(())
    }
}

impl ReportRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            ReportRequest::Panel(panel) if panel.accession_id.trim().is_empty() => Err(ValidationError::MissingAccession),
            ReportRequest::Panel(_) => Ok(()),
            ReportRequest::Family(family) => family.validate(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            ReportRequest::Panel(_) => "panel".to_string(),
            ReportRequest::Family(family) => family.report_type.to_string(),
        }
    }

    /// Render the JSON body
    ///
    /// Family reports use the flexible family layout: `proband` plus `family_1` to `family_4`,
    /// with unused slots sent as null.
    pub fn payload(&self) -> Value {
        match self {
            ReportRequest::Panel(panel) => json!({
                "report_type": "panel",
                "genome_id": panel.genome_id,
                "filter_id": panel.filter_id,
                "panel_id": panel.panel_id,
                "accession_id": panel.accession_id,
            }),
            ReportRequest::Family(family) => family_payload(family),
        }
    }
}

fn family_payload(report: &FamilyReport) -> Value {
    let mut body = Map::new();
    body.insert("report_type".to_string(), json!(report.report_type));
    body.insert(
        "proband".to_string(),
        json!({
            "genome_id": report.proband.genome_id,
            "sex": report.proband.sex.report_code(),
        }),
    );

    for slot in 0..4 {
        let value = match report.relatives.get(slot) {
            Some(relative) => json!({
                "genome_id": relative.genome_id,
                "sex": relative.sex.report_code(),
                "affected": relative.affected,
                "relationship": relative.relationship.to_string(),
                "label": relative.label,
            }),
            None => Value::Null,
        };
        body.insert(format!("family_{}", slot + 1), value);
    }

    let options = &report.options;
    body.insert("background".to_string(), json!("FULL"));
    body.insert("score_indels".to_string(), json!(options.score_indels));
    body.insert("reporting_cutoff".to_string(), json!(options.reporting_cutoff));
    body.insert("accession_id".to_string(), json!(options.accession_id));
    body.insert("project_id".to_string(), json!(options.project_id));
    // the reports endpoint takes HPO terms as a JSON encoded string
    let hpo_terms = match options.hpo_terms.is_empty() {
        true => Value::Null,
        false => Value::String(Value::from(options.hpo_terms.clone()).to_string()),
    };
    body.insert("hpo_terms".to_string(), hpo_terms);

    Value::Object(body)
}
