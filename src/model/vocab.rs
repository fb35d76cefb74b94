use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::Serialize;

/// Sex as written in manifests, on the command line, and in payloads
///
/// The API is not consistent about spelling: genome uploads take `male`, clinical reports take
/// `m`, case containers take `MALE`. Serde uses the case container spelling.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sex {
    #[value(name = "MALE", alias = "male", alias = "m")]
    Male,
    #[value(name = "FEMALE", alias = "female", alias = "f")]
    Female,
    #[value(name = "UNSPECIFIED", alias = "unspecified", alias = "u")]
    Unspecified,
}

impl Sex {
    /// Single letter code used by clinical report requests
    pub fn report_code(&self) -> Option<&'static str> {
        match self {
            Sex::Male => Some("m"),
            Sex::Female => Some("f"),
            Sex::Unspecified => None,
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Sex::Male => write!(f, "male"),
            Sex::Female => write!(f, "female"),
            Sex::Unspecified => write!(f, "unspecified"),
        }
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Sex::Male),
            "female" | "f" => Ok(Sex::Female),
            "unspecified" | "u" | "" => Ok(Sex::Unspecified),
            other => Err(format!("unknown sex {other:?}, expected male, female or unspecified")),
        }
    }
}

/// How a family member relates to the proband
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Relationship {
    #[value(name = "PROBAND", alias = "proband", alias = "self")]
    Proband,
    #[value(name = "MOTHER", alias = "mother")]
    Mother,
    #[value(name = "FATHER", alias = "father")]
    Father,
    #[value(name = "SIBLING", alias = "sibling")]
    Sibling,
    #[value(name = "OTHER", alias = "other")]
    Other,
}

impl Relationship {
    pub fn is_parent(&self) -> bool {
        matches!(self, Relationship::Mother | Relationship::Father)
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Relationship::Proband => write!(f, "proband"),
            Relationship::Mother => write!(f, "mother"),
            Relationship::Father => write!(f, "father"),
            Relationship::Sibling => write!(f, "sibling"),
            Relationship::Other => write!(f, "other"),
        }
    }
}

impl FromStr for Relationship {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "proband" | "self" => Ok(Relationship::Proband),
            "mother" => Ok(Relationship::Mother),
            "father" => Ok(Relationship::Father),
            "sibling" => Ok(Relationship::Sibling),
            "other" | "related" => Ok(Relationship::Other),
            other => Err(format!("unknown relationship {other:?}")),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisType {
    #[value(name = "PANEL")]
    Panel,
    #[value(name = "WGS")]
    Wgs,
    #[value(name = "MT_PANEL")]
    MtPanel,
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AnalysisType::Panel => write!(f, "PANEL"),
            AnalysisType::Wgs => write!(f, "WGS"),
            AnalysisType::MtPanel => write!(f, "MT_PANEL"),
        }
    }
}

/// Family report flavours, named by how many genomes take part
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ReportType {
    Solo,
    Duo,
    Trio,
    Quad,
    Quintet,
}

impl ReportType {
    /// Pick the report type for a proband plus `relatives` family members
    pub fn for_family_size(relatives: usize) -> Option<ReportType> {
        match relatives {
            0 => Some(ReportType::Solo),
            1 => Some(ReportType::Duo),
            2 => Some(ReportType::Trio),
            3 => Some(ReportType::Quad),
            4 => Some(ReportType::Quintet),
            _ => None,
        }
    }

    pub fn relatives(&self) -> usize {
        match self {
            ReportType::Solo => 0,
            ReportType::Duo => 1,
            ReportType::Trio => 2,
            ReportType::Quad => 3,
            ReportType::Quintet => 4,
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ReportType::Solo => "Solo",
            ReportType::Duo => "Duo",
            ReportType::Trio => "Trio",
            ReportType::Quad => "Quad",
            ReportType::Quintet => "Quintet",
        };
        write!(f, "{name}")
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShareRole {
    #[value(name = "CONTRIBUTOR")]
    Contributor,
    #[value(name = "VIEWER")]
    Viewer,
    #[value(name = "NONE")]
    None,
}

impl fmt::Display for ShareRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ShareRole::Contributor => write!(f, "CONTRIBUTOR"),
            ShareRole::Viewer => write!(f, "VIEWER"),
            ShareRole::None => write!(f, "NONE"),
        }
    }
}

/// Reporting decision for a single report variant
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToReport {
    #[value(name = "PRIMARY_FINDING")]
    PrimaryFinding,
    #[value(name = "SECONDARY_FINDING")]
    SecondaryFinding,
    #[value(name = "DO_NOT_REPORT")]
    DoNotReport,
}

impl fmt::Display for ToReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ToReport::PrimaryFinding => write!(f, "PRIMARY_FINDING"),
            ToReport::SecondaryFinding => write!(f, "SECONDARY_FINDING"),
            ToReport::DoNotReport => write!(f, "DO_NOT_REPORT"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum VariantFormat {
    #[value(name = "JSON")]
    Json,
    #[value(name = "VCF")]
    Vcf,
    #[value(name = "CSV")]
    Csv,
}

impl fmt::Display for VariantFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VariantFormat::Json => write!(f, "JSON"),
            VariantFormat::Vcf => write!(f, "VCF"),
            VariantFormat::Csv => write!(f, "CSV"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Assembly {
    B38,
    Hg19,
}

impl fmt::Display for Assembly {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Assembly::B38 => write!(f, "b38"),
            Assembly::Hg19 => write!(f, "hg19"),
        }
    }
}

/// Sequencing platform, Illumina is assumed when none is given
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Serialize)]
pub enum Platform {
    #[value(name = "ONT")]
    #[serde(rename = "ONT")]
    Ont,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Platform::Ont => write!(f, "ONT"),
        }
    }
}
