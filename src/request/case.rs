use std::path::PathBuf;

use log::info;
use serde::Serialize;

use crate::manifest::family::parse_affected;
use crate::model::patient::{MemberPhi, PatientInfo};
use crate::model::vocab::{AnalysisType, Assembly, Platform, Relationship, Sex};
use crate::request::{require_file, ValidationError};

/// Everything the user asked for, before validation
///
/// Fields may be missing here and filled in from a patient information file by
/// [`CaseOptions::merge_patient_info`].
#[derive(Debug, Clone, PartialEq)]
pub struct CaseOptions {
    pub analysis_types: Vec<AnalysisType>,
    pub test_id: Option<u64>,
    pub assembly: Assembly,
    pub accession: Option<String>,
    pub sex: Option<Sex>,
    pub hpo_terms: Vec<String>,
    pub platform: Option<Platform>,
    pub genome: GenomeOptions,
    /// Family members `f1` and `f2`
    pub relatives: [RelativeOptions; 2],
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenomeOptions {
    pub name: Option<String>,
    pub vcf: Option<PathBuf>,
    pub checksum: Option<String>,
}

impl GenomeOptions {
    fn any_set(&self) -> bool {
        self.name.is_some() || self.vcf.is_some() || self.checksum.is_some()
    }

    /// Name and file are all-or-nothing, a checksum needs both
    fn resolve(&self) -> Result<Option<CaseGenome>, ()> {
        match (&self.name, &self.vcf) {
            (Some(name), Some(vcf)) => Ok(Some(CaseGenome {
                genome_name: name.clone(),
                vcf: vcf.clone(),
                checksum: self.checksum.clone(),
            })),
            (None, None) if self.checksum.is_none() => Ok(None),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelativeOptions {
    pub relationship: Option<Relationship>,
    pub sex: Option<Sex>,
    pub accession: Option<String>,
    pub affected: Option<bool>,
    pub genome: GenomeOptions,
}

impl RelativeOptions {
    /// An affected flag of `false` is the default and doesn't count as describing a member
    fn describes_member(&self) -> bool {
        self.relationship.is_some() || self.sex.is_some() || self.accession.is_some() || self.affected == Some(true)
    }

    fn any_set(&self) -> bool {
        self.describes_member() || self.genome.any_set()
    }
}

/// Member names used on the command line and in patient information keys
pub static RELATIVE_NAMES: [&str; 2] = ["f1", "f2"];

/// Request body for `POST /case_containers`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseRequest {
    pub analysis_types: Vec<AnalysisType>,
    pub assembly_version: Assembly,
    pub members: Vec<CaseMember>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hpo_terms: Vec<String>,
    #[serde(rename = "sequencing_platform", skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseMember {
    pub accession: String,
    pub sex: Sex,
    pub affected: bool,
    pub relationship: Relationship,
    pub phi: MemberPhi,
}

/// A VCF to upload once the case container exists
#[derive(Debug, Clone, PartialEq)]
pub struct CaseGenome {
    pub genome_name: String,
    pub vcf: PathBuf,
    pub checksum: Option<String>,
}

/// A validated case container request and the genomes to upload into it
///
/// `genomes` runs parallel to `request.members`; the API returns one upload URL per member in
/// the same order.
#[derive(Debug, Clone, PartialEq)]
pub struct CasePlan {
    pub request: CaseRequest,
    pub genomes: Vec<Option<CaseGenome>>,
}

impl CasePlan {
    /// Check every VCF to upload is on disk, since a container can't be removed once created
    pub fn check_files(&self) -> Result<(), ValidationError> {
        self.genomes.iter().flatten().try_for_each(|genome| require_file(&genome.vcf))
    }

    pub fn member_label(&self, index: usize) -> String {
        match index {
            0 => "PROBAND".to_string(),
            _ => self.request.members[index].relationship.to_string().to_uppercase(),
        }
    }
}

impl CaseOptions {
    pub fn new(analysis_types: Vec<AnalysisType>) -> CaseOptions {
        CaseOptions {
            analysis_types,
            test_id: None,
            assembly: Assembly::B38,
            accession: None,
            sex: None,
            hpo_terms: Vec::new(),
            platform: None,
            genome: GenomeOptions::default(),
            relatives: Default::default(),
        }
    }

    /// Fill accession, sex and affected status from patient information
    ///
    /// Command line values win. Fields used here are removed from the PHI so they aren't sent
    /// twice.
    pub fn merge_patient_info(&mut self, info: &mut PatientInfo) -> Result<(), ValidationError> {
        if let Some(accession) = info.take_proband("accession") {
            self.accession.get_or_insert(accession);
        }
        if let Some(sex) = info.take_proband("sex") {
            let parsed = parse_field("sex", &sex, str::parse::<Sex>)?;
            self.sex.get_or_insert(parsed);
        }

        for (name, relative) in RELATIVE_NAMES.iter().zip(self.relatives.iter_mut()) {
            if let Some(accession) = info.take_relative(name, "accession") {
                relative.accession.get_or_insert(accession);
            }
            if let Some(sex) = info.take_relative(name, "sex") {
                let parsed = parse_field(&format!("{name}_sex"), &sex, str::parse::<Sex>)?;
                relative.sex.get_or_insert(parsed);
            }
            if let Some(affected) = info.take_relative(name, "affected") {
                let parsed = parse_field(&format!("{name}_affected"), &affected, parse_affected)?;
                if relative.affected != Some(true) {
                    relative.affected = Some(parsed);
                }
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.analysis_types.is_empty() {
            return Err(ValidationError::NoAnalysis);
        }
        if self.accession.as_deref().map_or(true, |a| a.trim().is_empty()) {
            return Err(ValidationError::MissingAccession);
        }
        if self.sex.is_none() {
            return Err(ValidationError::MissingSex);
        }

        if self.analysis_types.contains(&AnalysisType::Panel) {
            if self.analysis_types.len() > 1 {
                return Err(ValidationError::PanelWithOtherAnalyses);
            }
            if self.test_id.is_none() {
                return Err(ValidationError::MissingTestId);
            }
        }

        if self.genome.resolve().is_err() {
            return Err(ValidationError::IncompleteProbandGenome);
        }

        if !self.analysis_types.contains(&AnalysisType::Wgs) {
            if !self.hpo_terms.is_empty() {
                return Err(ValidationError::HpoWithoutWgs);
            }
            if self.relatives.iter().any(RelativeOptions::any_set) {
                return Err(ValidationError::FamilyWithoutWgs);
            }
            return Ok(());
        }

        if self.hpo_terms.is_empty() {
            return Err(ValidationError::MissingHpo);
        }
        for (name, relative) in RELATIVE_NAMES.iter().zip(self.relatives.iter()) {
            if relative.describes_member()
                && !(relative.relationship.is_some() && relative.sex.is_some() && relative.accession.is_some())
            {
                return Err(ValidationError::IncompleteRelative(name.to_string()));
            }
            if relative.genome.resolve().is_err() {
                return Err(ValidationError::IncompleteRelativeGenome(name.to_string()));
            }
            if relative.genome.any_set() && relative.relationship.is_none() {
                return Err(ValidationError::IncompleteRelative(name.to_string()));
            }
            if let Some(relationship) = relative.relationship {
                if !relationship.is_parent() {
                    return Err(ValidationError::RelativeNotParent(name.to_string(), relationship));
                }
            }
        }
        Ok(())
    }

    /// Validate and build the request, consuming patient information for each member's PHI
    pub fn into_plan(mut self, mut info: PatientInfo) -> Result<CasePlan, ValidationError> {
        self.merge_patient_info(&mut info)?;
        self.validate()?;

        let (accession, sex) = match (self.accession.clone(), self.sex) {
            (Some(accession), Some(sex)) => (accession, sex),
            (None, _) => return Err(ValidationError::MissingAccession),
            (_, None) => return Err(ValidationError::MissingSex),
        };

        let mut members = vec![CaseMember {
            accession,
            sex,
            affected: true,
            relationship: Relationship::Proband,
            phi: info.proband.clone(),
        }];
        let mut genomes = vec![self.genome.resolve().unwrap_or(None)];

        for (name, relative) in RELATIVE_NAMES.iter().zip(self.relatives.iter()) {
            // validate() guarantees the rest of the triple once a relationship is set
            if let (Some(relationship), Some(sex), Some(accession)) =
                (relative.relationship, relative.sex, relative.accession.clone())
            {
                members.push(CaseMember {
                    accession,
                    sex,
                    affected: relative.affected.unwrap_or(false),
                    relationship,
                    phi: info.relative(name),
                });
                genomes.push(relative.genome.resolve().unwrap_or(None));
            }
        }

        let mut analysis_types = self.analysis_types.clone();
        analysis_types.sort();
        analysis_types.dedup();

        let request = CaseRequest {
            analysis_types,
            assembly_version: self.assembly,
            members,
            hpo_terms: self.hpo_terms.clone(),
            platform: self.platform,
            test_id: self.test_id,
        };
        info!(
            "Case container request has {} members and {} genomes to upload",
            request.members.len(),
            genomes.iter().flatten().count()
        );
        Ok(CasePlan { request, genomes })
    }
}

fn parse_field<T, F>(field: &str, value: &str, parse: F) -> Result<T, ValidationError>
where
    F: Fn(&str) -> Result<T, String>,
{
    parse(value).map_err(|message| ValidationError::InvalidPatientInfo { field: field.to_string(), message })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn panel() -> CaseOptions {
        CaseOptions {
            test_id: Some(5),
            accession: Some("ACC1".to_string()),
            sex: Some(Sex::Male),
            ..CaseOptions::new(vec![AnalysisType::Panel])
        }
    }

    fn wgs() -> CaseOptions {
        CaseOptions {
            hpo_terms: vec!["HP:0000018".to_string()],
            ..CaseOptions::new(vec![AnalysisType::Wgs])
        }
        .with_proband("ACC1", Sex::Female)
    }

    impl CaseOptions {
        fn with_proband(mut self, accession: &str, sex: Sex) -> CaseOptions {
            self.accession = Some(accession.to_string());
            self.sex = Some(sex);
            self
        }
    }

    #[test]
    fn panel_rejects_any_family_field() {
        let mut options = panel();
        options.relatives[0].sex = Some(Sex::Female);
        assert_eq!(options.validate(), Err(ValidationError::FamilyWithoutWgs));

        let mut options = panel();
        options.relatives[1].genome.vcf = Some(PathBuf::from("dad.vcf.gz"));
        assert_eq!(options.validate(), Err(ValidationError::FamilyWithoutWgs));

        let mut options = panel();
        options.relatives[0].affected = Some(true);
        assert_eq!(options.validate(), Err(ValidationError::FamilyWithoutWgs));
    }

    #[test]
    fn panel_needs_test_id_and_no_other_analysis() {
        let mut options = panel();
        options.test_id = None;
        assert_eq!(options.validate(), Err(ValidationError::MissingTestId));

        let mut options = panel();
        options.analysis_types.push(AnalysisType::Wgs);
        assert_eq!(options.validate(), Err(ValidationError::PanelWithOtherAnalyses));
    }

    #[test]
    fn wgs_relative_needs_full_triple() {
        let mut options = wgs();
        options.relatives[0].sex = Some(Sex::Female);
        options.relatives[0].accession = Some("mum".to_string());
        assert_eq!(options.validate(), Err(ValidationError::IncompleteRelative("f1".to_string())));

        let mut options = wgs();
        options.relatives[1].relationship = Some(Relationship::Father);
        assert_eq!(options.validate(), Err(ValidationError::IncompleteRelative("f2".to_string())));

        let mut options = wgs();
        options.relatives[1].relationship = Some(Relationship::Father);
        options.relatives[1].sex = Some(Sex::Male);
        options.relatives[1].accession = Some("dad".to_string());
        assert_eq!(options.validate(), Ok(()));
    }

    #[test]
    fn wgs_relative_genome_is_all_or_nothing() {
        let mut options = wgs();
        options.relatives[0] = RelativeOptions {
            relationship: Some(Relationship::Mother),
            sex: Some(Sex::Female),
            accession: Some("mum".to_string()),
            affected: None,
            genome: GenomeOptions { name: Some("mum".to_string()), vcf: None, checksum: None },
        };
        assert_eq!(options.validate(), Err(ValidationError::IncompleteRelativeGenome("f1".to_string())));
    }

    #[test]
    fn wgs_requires_hpo_terms() {
        let mut options = wgs();
        options.hpo_terms.clear();
        assert_eq!(options.validate(), Err(ValidationError::MissingHpo));
    }

    #[test]
    fn relatives_must_be_parents() {
        let mut options = wgs();
        options.relatives[0].relationship = Some(Relationship::Sibling);
        options.relatives[0].sex = Some(Sex::Male);
        options.relatives[0].accession = Some("bro".to_string());
        assert!(matches!(options.validate(), Err(ValidationError::RelativeNotParent(_, Relationship::Sibling))));
    }

    #[test]
    fn panel_payload_has_single_proband_and_no_hpo() {
        let plan = panel().into_plan(PatientInfo::default()).unwrap();
        let body = serde_json::to_value(&plan.request).unwrap();
        assert_eq!(
            body,
            json!({
                "analysis_types": ["PANEL"],
                "assembly_version": "b38",
                "members": [{
                    "accession": "ACC1",
                    "sex": "MALE",
                    "affected": true,
                    "relationship": "PROBAND",
                    "phi": {}
                }],
                "test_id": 5
            })
        );
        assert_eq!(plan.genomes, vec![None]);
    }

    #[test]
    fn patient_info_fills_missing_options() {
        let mut info = PatientInfo::from_pairs(vec![
            ("accession", "JD1"),
            ("sex", "MALE"),
            ("first_name", "John"),
            ("f1_accession", "mother"),
            ("f1_sex", "FEMALE"),
            ("f1_affected", "False"),
            ("f1_dob", "1965-11-30"),
        ]);
        let mut options = CaseOptions {
            hpo_terms: vec!["HP:0000018".to_string()],
            ..CaseOptions::new(vec![AnalysisType::Wgs])
        };
        options.accession = Some("CLI".to_string());
        options.relatives[0].relationship = Some(Relationship::Mother);
        options.merge_patient_info(&mut info).unwrap();

        assert_eq!(options.accession.as_deref(), Some("CLI"));
        assert_eq!(options.sex, Some(Sex::Male));
        assert_eq!(options.relatives[0].accession.as_deref(), Some("mother"));
        assert_eq!(options.relatives[0].affected, Some(false));

        let plan = options.into_plan(info).unwrap();
        let body = serde_json::to_value(&plan.request).unwrap();
        assert_eq!(body["members"].as_array().unwrap().len(), 2);
        assert_eq!(body["members"][0]["phi"]["patient"], json!({"first_name": "John"}));
        assert_eq!(body["members"][1]["relationship"], "MOTHER");
        assert_eq!(body["members"][1]["phi"], json!({"family": {"dob": "1965-11-30"}}));
        assert_eq!(body["hpo_terms"], json!(["HP:0000018"]));
    }

    #[test]
    fn genomes_line_up_with_members() {
        let mut options = wgs();
        options.genome = GenomeOptions { name: Some("kid".to_string()), vcf: Some(PathBuf::from("kid.vcf.gz")), checksum: None };
        options.relatives[1] = RelativeOptions {
            relationship: Some(Relationship::Father),
            sex: Some(Sex::Male),
            accession: Some("dad".to_string()),
            affected: None,
            genome: GenomeOptions { name: Some("dad".to_string()), vcf: Some(PathBuf::from("dad.vcf.gz")), checksum: None },
        };

        let plan = options.into_plan(PatientInfo::default()).unwrap();
        assert_eq!(plan.request.members.len(), 2);
        assert_eq!(plan.genomes.len(), 2);
        assert_eq!(plan.genomes[1].as_ref().unwrap().vcf, PathBuf::from("dad.vcf.gz"));
        assert_eq!(plan.member_label(1), "FATHER");
        assert_eq!(plan.check_files(), Err(ValidationError::MissingFile(PathBuf::from("kid.vcf.gz"))));
    }

    #[test]
    fn bad_sex_in_patient_info_is_reported() {
        let mut info = PatientInfo::from_pairs(vec![("sex", "yes")]);
        let err = panel().merge_patient_info(&mut info).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPatientInfo { ref field, .. } if field == "sex"));
    }
}
