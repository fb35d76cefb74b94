use std::io;
use std::path::Path;

use crate::manifest::family::infer_format;
use crate::manifest::read::{find_manifest, open, GENOME_MANIFEST};
use crate::manifest::{csv_reader, line_of, require_columns, ManifestError};
use crate::model::family::GenomeFile;
use crate::model::vocab::Sex;

/// Read `manifest.csv` from a folder of genomes
///
/// Columns are `filename,label,external_id,sex` with an optional fifth `format` column. The
/// format is guessed from the file extension when it's missing.
pub fn read_genome_manifest(folder: &Path) -> Result<Vec<GenomeFile>, ManifestError> {
    let path = find_manifest(folder, GENOME_MANIFEST)?;
    parse_genome_manifest(open(&path)?, folder)
}

pub fn parse_genome_manifest<R: io::Read>(reader: R, folder: &Path) -> Result<Vec<GenomeFile>, ManifestError> {
    let mut csv = csv_reader(reader);
    let mut genomes = Vec::new();
    for (i, record) in csv.records().enumerate() {
        let record = record?;
        require_columns(&record, i, 4)?;
        let line = line_of(&record, i);
        let sex = record[3]
            .parse::<Sex>()
            .map_err(|message| ManifestError::InvalidValue { line, message })?;
        let format = record
            .get(4)
            .filter(|f| !f.is_empty())
            .map_or_else(|| infer_format(&record[0]), str::to_string);

        genomes.push(GenomeFile {
            path: folder.join(&record[0]),
            label: record[1].to_string(),
            external_id: record[2].to_string(),
            sex,
            format,
        });
    }
    Ok(genomes)
}
