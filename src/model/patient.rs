use std::collections::BTreeMap;
use std::fmt;

use log::warn;
use serde::Serialize;

/// Sections of the patient information form
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PhiSection {
    Patient,
    Sample,
    Order,
    Report,
    Family,
}

impl PhiSection {
    pub const ALL: [PhiSection; 5] = [
        PhiSection::Patient,
        PhiSection::Sample,
        PhiSection::Order,
        PhiSection::Report,
        PhiSection::Family,
    ];

    /// Look up which section a patient information key belongs to
    ///
    /// Workspaces with custom fields need their keys added here.
    pub fn for_key(key: &str) -> Option<PhiSection> {
        match key {
            "accession" | "first_name" | "last_name" | "sex" | "age" | "dob" | "ethnicity"
            | "indication" | "family_id" => Some(PhiSection::Patient),
            "specimen_collected" | "specimen_received" | "specimen_type" => Some(PhiSection::Sample),
            "ordering_physician" => Some(PhiSection::Order),
            "f1_accession" | "f1_affected" | "f1_dob" | "f1_sex" | "f2_accession" | "f2_affected"
            | "f2_dob" | "f2_sex" => Some(PhiSection::Family),
            _ => None,
        }
    }
}

impl fmt::Display for PhiSection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PhiSection::Patient => write!(f, "patient"),
            PhiSection::Sample => write!(f, "sample"),
            PhiSection::Order => write!(f, "order"),
            PhiSection::Report => write!(f, "report"),
            PhiSection::Family => write!(f, "family"),
        }
    }
}

pub type Fields = BTreeMap<String, String>;

/// Patient information for one member, split into form sections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MemberPhi {
    pub sections: BTreeMap<PhiSection, Fields>,
}

impl MemberPhi {
    fn with_all_sections() -> MemberPhi {
        let sections = PhiSection::ALL.iter().map(|s| (*s, Fields::new())).collect();
        MemberPhi { sections }
    }

    pub fn get(&self, section: PhiSection, key: &str) -> Option<&String> {
        self.sections.get(&section).and_then(|fields| fields.get(key))
    }

    pub fn take(&mut self, section: PhiSection, key: &str) -> Option<String> {
        self.sections.get_mut(&section).and_then(|fields| fields.remove(key))
    }

    fn insert(&mut self, section: PhiSection, key: &str, value: &str) {
        self.sections
            .entry(section)
            .or_default()
            .insert(key.to_string(), value.to_string());
    }
}

/// Patient information keyed by member: `proband`, `f1`, `f2`
///
/// Family keys are written as `f1_accession`; the prefix picks the member and the rest becomes
/// the field name inside that member's `family` section.
///
/// Without a patient information file every member's PHI is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientInfo {
    pub proband: MemberPhi,
    pub relatives: BTreeMap<String, MemberPhi>,
}

impl PatientInfo {
    pub fn from_pairs<'a, I>(pairs: I) -> PatientInfo
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut info = PatientInfo { proband: MemberPhi::with_all_sections(), relatives: BTreeMap::new() };
        for (key, value) in pairs {
            match PhiSection::for_key(key) {
                Some(PhiSection::Family) => {
                    // for_key only accepts fN_field family keys
                    if let Some((member, field)) = key.split_once('_') {
                        info.relatives
                            .entry(member.to_string())
                            .or_default()
                            .insert(PhiSection::Family, field, value);
                    }
                }
                Some(section) => info.proband.insert(section, key, value),
                None => warn!("Ignoring unknown patient information key {key:?}"),
            }
        }
        info
    }

    /// Remove a field from the proband's patient section, it is sent elsewhere in the request
    pub fn take_proband(&mut self, key: &str) -> Option<String> {
        self.proband.take(PhiSection::Patient, key)
    }

    pub fn take_relative(&mut self, member: &str, key: &str) -> Option<String> {
        self.relatives
            .get_mut(member)
            .and_then(|phi| phi.take(PhiSection::Family, key))
    }

    pub fn relative(&self, member: &str) -> MemberPhi {
        self.relatives.get(member).cloned().unwrap_or_default()
    }
}

/// Clinical report field names for the legacy positional patient information file
pub static REPORT_FIELD_ROWS: [&str; 11] = [
    "Last Name",
    "First Name",
    "Patient DOB",
    "Accession ID",
    "Patient Sex",
    "Patient Ethnicity",
    "Indication for Testing",
    "Specimen Type",
    "Date Specimen Collected",
    "Date Specimen Received",
    "Ordering Physician",
];
