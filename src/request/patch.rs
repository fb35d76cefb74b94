use serde::Serialize;
use serde_json::Value;

use crate::model::vocab::ToReport;
use crate::request::ValidationError;

pub static JSON_PATCH: &str = "application/json-patch+json";

/// One JSON Patch operation, only `replace` is used by the reports API
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatchOp {
    pub op: &'static str,
    pub path: String,
    pub value: Value,
}

impl PatchOp {
    pub fn replace(attribute: &str, value: impl Into<Value>) -> PatchOp {
        PatchOp { op: "replace", path: format!("/{attribute}"), value: value.into() }
    }
}

/// Patch for a single report variant
pub fn variant_patch(status: Option<&str>, to_report: Option<ToReport>) -> Result<Vec<PatchOp>, ValidationError> {
    let mut ops = Vec::new();
    if let Some(status) = status {
        ops.push(PatchOp::replace("status", status));
    }
    if let Some(to_report) = to_report {
        ops.push(PatchOp::replace("to_report", to_report.to_string()));
    }
    match ops.is_empty() {
        true => Err(ValidationError::EmptyPatch),
        false => Ok(ops),
    }
}

/// Patch for a clinical report's status
pub fn status_patch(status: &str) -> Vec<PatchOp> {
    vec![PatchOp::replace("status", status)]
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn variant_patch_replaces_each_field() {
        let ops = variant_patch(Some("FAILED_CONFIRMATION"), Some(ToReport::DoNotReport)).unwrap();
        assert_eq!(
            serde_json::to_value(ops).unwrap(),
            json!([
                {"op": "replace", "path": "/status", "value": "FAILED_CONFIRMATION"},
                {"op": "replace", "path": "/to_report", "value": "DO_NOT_REPORT"}
            ])
        );
    }

    #[test]
    fn empty_variant_patch_is_rejected() {
        assert_eq!(variant_patch(None, None), Err(ValidationError::EmptyPatch));
    }

    #[test]
    fn status_patch_targets_status() {
        let ops = status_patch("REVIEW");
        assert_eq!(ops, vec![PatchOp::replace("status", "REVIEW")]);
    }
}
