use std::path::PathBuf;

use serde::Serialize;

use crate::model::vocab::{Relationship, Sex};

/// Genome file and the metadata sent alongside it on upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenomeFile {
    pub path: PathBuf,
    pub label: String,
    pub external_id: String,
    pub sex: Sex,
    pub format: String,
}

/// Where a member's genome comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenomeSource {
    /// A local file that has to be uploaded first
    Upload(GenomeFile),
    /// A genome the remote system already knows about
    Existing(u64),
    /// Not sequenced yet, the report waits for a genome
    Unsequenced,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyMember {
    pub relationship: Relationship,
    pub genome: GenomeSource,
    pub sex: Sex,
    pub affected: Option<bool>,
    pub label: Option<String>,
}

impl FamilyMember {
    pub fn is_proband(&self) -> bool {
        self.relationship == Relationship::Proband
    }

    pub fn upload(&self) -> Option<&GenomeFile> {
        match &self.genome {
            GenomeSource::Upload(file) => Some(file),
            _ => None,
        }
    }
}

/// A proband and its relatives, in manifest order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Family {
    pub members: Vec<FamilyMember>,
}

impl Family {
    pub fn proband(&self) -> Option<&FamilyMember> {
        self.members.iter().find(|m| m.is_proband())
    }

    pub fn relatives(&self) -> impl Iterator<Item = &FamilyMember> {
        self.members.iter().filter(|m| !m.is_proband())
    }

    pub fn uploads(&self) -> impl Iterator<Item = &FamilyMember> {
        self.members.iter().filter(|m| m.upload().is_some())
    }
}

/// What the remote system echoes back after a genome upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedGenome {
    pub genome_id: u64,
    pub label: Option<String>,
    pub external_id: Option<String>,
    pub size: Option<u64>,
}
