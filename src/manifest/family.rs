use std::io;
use std::path::Path;

use log::{info, warn};

use crate::manifest::read::{find_manifest, open, FAMILY_MANIFEST};
use crate::manifest::{csv_reader, line_of, require_columns, ManifestError};
use crate::model::family::{Family, FamilyMember, GenomeFile, GenomeSource};
use crate::model::vocab::{Relationship, Sex};

/// Row order of the positional layout
static POSITIONAL_ROLES: [Relationship; 3] = [Relationship::Mother, Relationship::Father, Relationship::Proband];
static POSITIONAL_COLUMNS: usize = 5;
static MAX_RELATIVES: usize = 4;

/// Read `family_manifest.csv` from a genome folder
///
/// Genome filenames in the manifest are resolved relative to the folder.
pub fn read_family_manifest(folder: &Path) -> Result<Family, ManifestError> {
    let path = find_manifest(folder, FAMILY_MANIFEST)?;
    parse_family_manifest(open(&path)?, folder)
}

/// Parse a family manifest, picking the layout from the header row
///
/// A header with a `relationship` column uses the explicit layout:
///
/// | relationship | filename | label | external_id | sex | format | affected | genome_id |
/// | ------------ | -------- | ----- | ----------- | --- | ------ | -------- | --------- |
///
/// Only `relationship` and `sex` are required. Any other header is read positionally as
/// `filename,label,external_id,sex,format` with rows for mother, father and proband.
pub fn parse_family_manifest<R: io::Read>(reader: R, folder: &Path) -> Result<Family, ManifestError> {
    let mut csv = csv_reader(reader);
    let headers = csv.headers()?.clone();
    let columns = ExplicitColumns::from_headers(&headers)?;

    let members = match columns {
        Some(columns) => parse_explicit(&mut csv, &columns, folder)?,
        None => {
            warn!("{FAMILY_MANIFEST} has no relationship column, assuming rows are mother, father, proband");
            warn!("Positional family manifests are deprecated, add a relationship column");
            parse_positional(&mut csv, folder)?
        }
    };

    let family = Family { members };
    check_family(&family)?;
    info!("Read {} family members from manifest", family.members.len());
    Ok(family)
}

/// Column positions for the explicit layout
struct ExplicitColumns {
    width: usize,
    relationship: usize,
    sex: usize,
    filename: Option<usize>,
    label: Option<usize>,
    external_id: Option<usize>,
    format: Option<usize>,
    affected: Option<usize>,
    genome_id: Option<usize>,
}

impl ExplicitColumns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Option<ExplicitColumns>, ManifestError> {
        let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        let relationship = match find("relationship") {
            Some(i) => i,
            None => return Ok(None),
        };
        let sex = find("sex").ok_or(ManifestError::MissingColumn("sex"))?;

        Ok(Some(ExplicitColumns {
            width: headers.len(),
            relationship,
            sex,
            filename: find("filename"),
            label: find("label"),
            external_id: find("external_id"),
            format: find("format"),
            affected: find("affected"),
            genome_id: find("genome_id"),
        }))
    }
}

fn parse_explicit<R: io::Read>(
    csv: &mut csv::Reader<R>,
    columns: &ExplicitColumns,
    folder: &Path,
) -> Result<Vec<FamilyMember>, ManifestError> {
    let mut members = Vec::new();
    for (i, record) in csv.records().enumerate() {
        let record = record?;
        require_columns(&record, i, columns.width)?;
        let line = line_of(&record, i);

        let get = |index: Option<usize>| index.map(|i| &record[i]).filter(|value| !value.is_empty());

        let relationship = record[columns.relationship]
            .parse::<Relationship>()
            .map_err(|message| ManifestError::InvalidValue { line, message })?;
        let sex = record[columns.sex]
            .parse::<Sex>()
            .map_err(|message| ManifestError::InvalidValue { line, message })?;
        let affected = match get(columns.affected) {
            Some(value) => Some(parse_affected(value).map_err(|message| ManifestError::InvalidValue { line, message })?),
            None => None,
        };

        let genome = match (get(columns.filename), get(columns.genome_id)) {
            (Some(_), Some(_)) => return Err(ManifestError::ConflictingGenome { line }),
            (Some(filename), None) => GenomeSource::Upload(GenomeFile {
                path: folder.join(filename),
                label: get(columns.label).unwrap_or(filename).to_string(),
                external_id: get(columns.external_id).unwrap_or_default().to_string(),
                sex,
                format: get(columns.format).map_or_else(|| infer_format(filename), str::to_string),
            }),
            (None, Some(id)) => GenomeSource::Existing(id.parse::<u64>().map_err(|_| ManifestError::InvalidValue {
                line,
                message: format!("genome_id {id:?} is not a number"),
            })?),
            (None, None) => GenomeSource::Unsequenced,
        };

        members.push(FamilyMember {
            relationship,
            genome,
            sex,
            affected: if relationship == Relationship::Proband { Some(affected.unwrap_or(true)) } else { affected },
            label: get(columns.label).map(str::to_string),
        });
    }
    Ok(members)
}

fn parse_positional<R: io::Read>(csv: &mut csv::Reader<R>, folder: &Path) -> Result<Vec<FamilyMember>, ManifestError> {
    let records = csv.records().collect::<Result<Vec<_>, _>>()?;
    if records.len() < POSITIONAL_ROLES.len() {
        return Err(ManifestError::MissingRows { expected: POSITIONAL_ROLES.len(), found: records.len() });
    }
    if records.len() > POSITIONAL_ROLES.len() {
        warn!("Ignoring {} rows after the proband row", records.len() - POSITIONAL_ROLES.len());
    }

    let mut members = Vec::new();
    for (i, (record, relationship)) in records.iter().zip(POSITIONAL_ROLES.iter()).enumerate() {
        require_columns(record, i, POSITIONAL_COLUMNS)?;
        let line = line_of(record, i);
        let sex = record[3]
            .parse::<Sex>()
            .map_err(|message| ManifestError::InvalidValue { line, message })?;

        let file = GenomeFile {
            path: folder.join(&record[0]),
            label: record[1].to_string(),
            external_id: record[2].to_string(),
            sex,
            format: record[4].to_string(),
        };
        members.push(FamilyMember {
            relationship: *relationship,
            label: Some(file.label.clone()),
            genome: GenomeSource::Upload(file),
            sex,
            affected: if *relationship == Relationship::Proband { Some(true) } else { None },
        });
    }
    Ok(members)
}

fn check_family(family: &Family) -> Result<(), ManifestError> {
    let probands = family.members.iter().filter(|m| m.is_proband()).count();
    match probands {
        0 => return Err(ManifestError::MissingProband),
        1 => {}
        n => return Err(ManifestError::MultipleProbands(n)),
    }
    let relatives = family.members.len() - 1;
    if relatives > MAX_RELATIVES {
        return Err(ManifestError::TooManyRelatives(relatives));
    }
    Ok(())
}

pub fn parse_affected(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "affected" | "true" | "yes" | "1" => Ok(true),
        "unaffected" | "false" | "no" | "0" => Ok(false),
        other => Err(format!("unknown affected status {other:?}")),
    }
}

/// Guess the upload format from a genome filename
pub fn infer_format(filename: &str) -> String {
    let lower = filename.to_ascii_lowercase();
    let format = if lower.ends_with(".vcf.gz") {
        "vcf.gz"
    } else if lower.ends_with(".vcf.bz2") {
        "vcf.bz2"
    } else {
        "vcf"
    };
    format.to_string()
}
