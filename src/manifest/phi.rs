use std::io;
use std::path::Path;

use log::{info, warn};

use crate::manifest::read::open;
use crate::manifest::{csv_reader, require_columns, ManifestError};
use crate::model::patient::{Fields, PatientInfo, REPORT_FIELD_ROWS};

/// Read a `key,value` patient information file into sections
///
/// ```text
/// key,value
/// accession,JD1
/// first_name,John
/// f1_accession,mother
/// f1_sex,FEMALE
/// ```
pub fn read_patient_info(path: &Path) -> Result<PatientInfo, ManifestError> {
    info!("Reading patient information from {}", path.display());
    parse_patient_info(open(path)?)
}

pub fn parse_patient_info<R: io::Read>(reader: R) -> Result<PatientInfo, ManifestError> {
    let pairs = read_pairs(reader)?;
    Ok(PatientInfo::from_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))))
}

/// Read the legacy clinical report field file
///
/// The first column is ignored: the first eleven data rows always map, in order, to the report
/// fields "Last Name" through "Ordering Physician".
pub fn read_report_fields(path: &Path) -> Result<Fields, ManifestError> {
    info!("Reading report fields from {}", path.display());
    parse_report_fields(open(path)?)
}

pub fn parse_report_fields<R: io::Read>(reader: R) -> Result<Fields, ManifestError> {
    let pairs = read_pairs(reader)?;
    if pairs.len() > REPORT_FIELD_ROWS.len() {
        warn!("Ignoring {} rows after {:?}", pairs.len() - REPORT_FIELD_ROWS.len(), REPORT_FIELD_ROWS[10]);
    }
    let fields = REPORT_FIELD_ROWS
        .iter()
        .zip(pairs)
        .map(|(name, (_, value))| (name.to_string(), value))
        .collect();
    Ok(fields)
}

fn read_pairs<R: io::Read>(reader: R) -> Result<Vec<(String, String)>, ManifestError> {
    let mut csv = csv_reader(reader);
    let mut pairs = Vec::new();
    for (i, record) in csv.records().enumerate() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        require_columns(&record, i, 2)?;
        pairs.push((record[0].to_string(), record[1].to_string()));
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use crate::model::patient::PhiSection;

    use super::*;

    #[test]
    fn header_is_skipped_and_keys_sectioned() {
        let info = parse_patient_info(
            "key,value\n\
             accession,JD1\n\
             specimen_received,2023-09-16\n\
             f1_affected,False\n"
                .as_bytes(),
        )
        .unwrap();
        assert_eq!(info.proband.get(PhiSection::Patient, "accession").unwrap(), "JD1");
        assert_eq!(info.proband.get(PhiSection::Sample, "specimen_received").unwrap(), "2023-09-16");
        assert_eq!(info.relatives["f1"].get(PhiSection::Family, "affected").unwrap(), "False");
        assert!(info.proband.get(PhiSection::Patient, "key").is_none());
    }

    #[test]
    fn row_without_value_is_malformed() {
        let err = parse_patient_info("key,value\naccession\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ManifestError::Malformed { line: 2, expected: 2, found: 1 }));
    }

    #[test]
    fn report_fields_map_by_position() {
        let fields = parse_report_fields(
            "Opal Patient Information,value\n\
             Patient Last Name,Doe\n\
             Patient First Name,John\n\
             Patient DOB,1/1/00\n\
             Accession ID,JD1\n"
                .as_bytes(),
        )
        .unwrap();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields["Last Name"], "Doe");
        assert_eq!(fields["First Name"], "John");
        assert_eq!(fields["Accession ID"], "JD1");
    }
}
