use crate::cli::CaseArgs;
use crate::manifest::phi::read_patient_info;
use crate::manifest::ManifestError;
use crate::model::patient::PatientInfo;
use crate::request::case::{CaseOptions, GenomeOptions, RelativeOptions};

impl CaseArgs {
    /// Patient information from `--patient_info_file`, empty without one
    pub fn patient_info(&self) -> Result<PatientInfo, ManifestError> {
        match &self.patient_info_file {
            Some(path) => read_patient_info(path),
            None => Ok(PatientInfo::default()),
        }
    }

    pub fn into_options(self) -> CaseOptions {
        let f1 = RelativeOptions {
            relationship: self.f1_relationship,
            sex: self.f1_sex,
            accession: self.f1_accession,
            affected: self.f1_affected,
            genome: GenomeOptions { name: self.f1_genome, vcf: self.f1_vcf, checksum: self.f1_checksum },
        };
        let f2 = RelativeOptions {
            relationship: self.f2_relationship,
            sex: self.f2_sex,
            accession: self.f2_accession,
            affected: self.f2_affected,
            genome: GenomeOptions { name: self.f2_genome, vcf: self.f2_vcf, checksum: self.f2_checksum },
        };
        CaseOptions {
            test_id: self.test_id,
            assembly: self.assembly,
            accession: self.accession,
            sex: self.sex,
            hpo_terms: self.hpo_terms,
            platform: self.platform,
            genome: GenomeOptions { name: self.genome, vcf: self.vcf, checksum: self.checksum },
            relatives: [f1, f2],
            ..CaseOptions::new(self.analysis)
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use crate::cli::{CaseAction, Cli, Command};
    use crate::model::vocab::{AnalysisType, Relationship, Sex};
    use crate::request::ValidationError;

    use super::*;

    fn case_args(args: &[&str]) -> CaseArgs {
        let cli = Cli::try_parse_from(["fabrica", "case", "create"].iter().chain(args)).unwrap();
        match cli.command {
            Command::Case { action: CaseAction::Create(args) } => args,
            other => panic!("parsed {other:?}"),
        }
    }

    #[test]
    fn relatives_map_to_their_slot() {
        let options = case_args(&[
            "--analysis", "WGS", "MT_PANEL", "--hpo_terms", "HP:0000018", "--f2_relationship", "FATHER",
            "--f2_sex", "MALE", "--f2_accession", "ACC3", "--f2_genome", "dad", "--f2_vcf", "dad.vcf.gz",
        ])
        .into_options();
        assert_eq!(options.analysis_types, vec![AnalysisType::Wgs, AnalysisType::MtPanel]);
        assert_eq!(options.relatives[0], RelativeOptions::default());
        assert_eq!(options.relatives[1].relationship, Some(Relationship::Father));
        assert_eq!(options.relatives[1].sex, Some(Sex::Male));
        assert_eq!(options.relatives[1].genome.name.as_deref(), Some("dad"));
    }

    #[test]
    fn panel_with_relative_fails_validation() {
        let options = case_args(&[
            "--analysis", "PANEL", "--test_id", "5", "--accession", "ACC1", "--sex", "MALE", "--f1_sex", "FEMALE",
        ])
        .into_options();
        assert_eq!(options.validate(), Err(ValidationError::FamilyWithoutWgs));
    }

    #[test]
    fn missing_patient_file_is_empty_info() {
        let args = case_args(&["--analysis", "WGS"]);
        assert_eq!(args.patient_info().unwrap(), PatientInfo::default());
    }
}
