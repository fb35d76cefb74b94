use jsonschema::JSONSchema;
use log::{info, warn};
use serde_json::Value;

use crate::request::ValidationError;

/// Schemas bundled with the binary
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Schema {
    CaseContainer,
    Report,
}

impl Schema {
    pub fn name(&self) -> &'static str {
        match self {
            Schema::CaseContainer => "case container",
            Schema::Report => "report",
        }
    }

    fn source(&self) -> &'static str {
        /// included case container schema
        static CASE_CONTAINER: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/schema/case_container.json"));
        /// included report schema
        static REPORT: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/schema/report.json"));
        match self {
            Schema::CaseContainer => CASE_CONTAINER,
            Schema::Report => REPORT,
        }
    }
}

/// Check a payload against a bundled JSON schema before it's sent
pub fn validate(schema: Schema, payload: &Value) -> Result<(), ValidationError> {
    info!("Validating {} payload against JSON schema", schema.name());
    let compiled = compile_schema(schema)?;
    let result = compiled.validate(payload);
    if let Err(errors) = result {
        let errors: Vec<String> = errors
            .map(|e| format!("{} at {}", e, e.instance_path))
            .collect();
        warn!("Payload fails validation");
        return Err(ValidationError::Schema { schema: schema.name(), errors });
    }
    Ok(())
}

fn compile_schema(schema: Schema) -> Result<JSONSchema, ValidationError> {
    let schema_error = |message: String| ValidationError::Schema { schema: schema.name(), errors: vec![message] };
    let json: Value = serde_json::from_str(schema.source()).map_err(|e| schema_error(e.to_string()))?;
    // compile errors borrow the schema value, so turn them into strings straight away
    let compiled = JSONSchema::options()
        .compile(&json)
        .map_err(|e| schema_error(e.to_string()));
    compiled
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn bundled_schemas_compile() {
        compile_schema(Schema::CaseContainer).unwrap();
        compile_schema(Schema::Report).unwrap();
    }

    #[test]
    fn case_container_needs_members() {
        let payload = json!({"analysis_types": ["WGS"], "assembly_version": "b38", "members": []});
        let err = validate(Schema::CaseContainer, &payload).unwrap_err();
        assert!(matches!(err, ValidationError::Schema { schema: "case container", .. }));
    }

    #[test]
    fn case_container_accepts_panel_payload() {
        let payload = json!({
            "analysis_types": ["PANEL"],
            "assembly_version": "b38",
            "members": [{"accession": "ACC1", "sex": "MALE", "affected": true, "relationship": "PROBAND", "phi": {}}],
            "test_id": 5
        });
        validate(Schema::CaseContainer, &payload).unwrap();
    }

    #[test]
    fn hpo_terms_only_need_the_prefix() {
        let member = json!({"accession": "ACC1", "sex": "MALE", "affected": true, "relationship": "PROBAND", "phi": {}});
        let payload = |terms: Value| json!({"analysis_types": ["WGS"], "assembly_version": "b38", "members": [member], "hpo_terms": terms});
        validate(Schema::CaseContainer, &payload(json!(["HP:0000018", "HP:00012"]))).unwrap();
        assert!(validate(Schema::CaseContainer, &payload(json!(["0000018"]))).is_err());
    }

    #[test]
    fn report_rejects_unknown_type() {
        let payload = json!({"report_type": "Sextet", "accession_id": "ACC1"});
        assert!(validate(Schema::Report, &payload).is_err());
    }
}
