//! Command line definitions
//!
//! Each subcommand maps to one API call, except `report launch-family`, `report launch-panel`,
//! `report add-genomes` and `case create` which run a workflow. [`run::run`] dispatches a parsed [`Cli`].

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::manifest::family::parse_affected;
use crate::model::vocab::{AnalysisType, Assembly, Platform, Relationship, Sex, ShareRole, ToReport, VariantFormat};

/// Case container arguments and their conversion to request options
pub mod case;

/// Dispatch a parsed command against the API
pub mod run;

#[derive(Debug, Parser)]
#[command(name = "fabrica", version, about = "Command line client for a clinical genomics REST API", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create and list projects
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },
    /// Upload, list and delete genomes
    Genome {
        #[command(subcommand)]
        action: GenomeAction,
    },
    /// Launch, inspect and update clinical reports
    Report {
        #[command(subcommand)]
        action: ReportAction,
    },
    /// Create case containers
    Case {
        #[command(subcommand)]
        action: CaseAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProjectAction {
    /// Create a project
    Create {
        name: String,
        description: String,
        #[arg(value_enum)]
        share_role: ShareRole,
    },
    /// List projects visible to the account
    List,
}

#[derive(Debug, Subcommand)]
pub enum GenomeAction {
    /// Upload one genome file to a project
    #[command(arg_required_else_help = true)]
    Upload {
        project_id: u64,
        file: PathBuf,
        #[command(flatten)]
        meta: GenomeMeta,
        #[arg(long, value_enum, default_value = "b38")]
        assembly: Assembly,
    },
    /// Upload every genome listed in a folder's manifest.csv
    #[command(arg_required_else_help = true)]
    UploadFolder {
        project_id: u64,
        folder: PathBuf,
        #[arg(long, value_enum, default_value = "b38")]
        assembly: Assembly,
    },
    /// List the genomes in a project
    List { project_id: u64 },
    /// Delete a genome
    Delete { genome_id: u64 },
}

/// Metadata sent with a genome upload
#[derive(Debug, Clone, Args)]
pub struct GenomeMeta {
    /// Label shown in the project, defaults to the file name
    #[arg(long)]
    pub label: Option<String>,
    #[arg(long, value_enum, default_value = "UNSPECIFIED")]
    pub sex: Sex,
    #[arg(long = "external-id", alias = "external_id", default_value = "")]
    pub external_id: String,
    /// File format, inferred from the file name when not given
    #[arg(long)]
    pub format: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum ReportAction {
    /// List every clinical report visible to the account
    List {
        /// Include extended information, slow for many reports
        #[arg(long)]
        extended: bool,
    },
    /// Fetch a clinical report
    Get {
        report_id: u64,
        #[arg(long)]
        extended: bool,
    },
    /// Print only the status of a clinical report
    Status { report_id: u64 },
    /// Fetch report variants, optionally filtered
    Variants {
        report_id: u64,
        /// Variant status, may be repeated
        #[arg(long = "status")]
        statuses: Vec<String>,
        /// Reporting decision, may be repeated
        #[arg(long = "to-report", alias = "to_report", value_enum)]
        to_reports: Vec<ToReport>,
        #[arg(long)]
        extended: bool,
        #[arg(long)]
        chrom: Option<String>,
        #[arg(long = "start-on-chrom", alias = "start_on_chrom")]
        start_on_chrom: Option<u64>,
        #[arg(long = "end-on-chrom", alias = "end_on_chrom")]
        end_on_chrom: Option<u64>,
        #[arg(long)]
        alt: Option<String>,
        #[arg(long, value_enum, default_value = "JSON")]
        format: VariantFormat,
    },
    /// Change a report variant's status or reporting decision
    PatchVariant {
        report_id: u64,
        variant_id: u64,
        #[arg(long)]
        status: Option<String>,
        #[arg(long = "to-report", alias = "to_report", value_enum)]
        to_report: Option<ToReport>,
    },
    /// Change a clinical report's status
    UpdateStatus { report_id: u64, status: String },
    /// Attach patient fields to a clinical report, or show the ones it has
    #[command(arg_required_else_help = true)]
    PatientFields {
        report_id: u64,
        /// Positional clinical report field file
        #[arg(long, conflicts_with_all = ["json", "get"], required_unless_present_any = ["json", "get"])]
        file: Option<PathBuf>,
        /// Field map as a JSON object
        #[arg(long, conflicts_with = "get")]
        json: Option<String>,
        /// Print the report's current patient fields
        #[arg(long)]
        get: bool,
    },
    /// Launch a panel report on an existing or newly uploaded genome
    #[command(arg_required_else_help = true)]
    LaunchPanel(PanelArgs),
    /// Upload a family's genomes from a folder and launch a family report
    #[command(arg_required_else_help = true)]
    LaunchFamily(FamilyArgs),
    /// Upload a family's genomes from a folder and attach them to a report waiting for samples
    #[command(arg_required_else_help = true)]
    AddGenomes {
        report_id: u64,
        #[command(flatten)]
        family: FamilyArgs,
    },
}

#[derive(Debug, Clone, Args)]
pub struct PanelArgs {
    /// Genome already on the remote system
    #[arg(long = "genome-id", alias = "genome_id", conflicts_with = "genome_file", required_unless_present = "genome_file")]
    pub genome_id: Option<u64>,
    /// Project to upload --genome-file into
    #[arg(long = "project-id", alias = "project_id", requires = "genome_file")]
    pub project_id: Option<u64>,
    /// Genome file to upload first
    #[arg(long = "genome-file", alias = "genome_file", requires = "project_id")]
    pub genome_file: Option<PathBuf>,
    #[command(flatten)]
    pub meta: GenomeMeta,
    #[arg(long, value_enum, default_value = "b38")]
    pub assembly: Assembly,
    #[arg(long = "panel-id", alias = "panel_id")]
    pub panel_id: u64,
    #[arg(long = "filter-id", alias = "filter_id")]
    pub filter_id: Option<u64>,
    #[arg(long)]
    pub accession: String,
    /// Positional clinical report field file
    #[arg(long = "patient-info", alias = "patient_info")]
    pub patient_info: Option<PathBuf>,
    /// Leave an uploaded genome in place if the report can't be created
    #[arg(long = "keep-uploads", alias = "keep_uploads")]
    pub keep_uploads: bool,
}

#[derive(Debug, Clone, Args)]
pub struct FamilyArgs {
    pub project_id: u64,
    /// Folder with family_manifest.csv and the genome files
    pub folder: PathBuf,
    #[arg(long)]
    pub accession: String,
    #[arg(long = "score-indels", alias = "score_indels")]
    pub score_indels: bool,
    /// Reporting cutoff percentile
    #[arg(long)]
    pub cutoff: Option<u32>,
    /// HPO term ids, e.g. HP:0000018
    #[arg(long = "hpo", num_args = 1..)]
    pub hpo_terms: Vec<String>,
    #[arg(long, value_enum, default_value = "b38")]
    pub assembly: Assembly,
    /// Positional clinical report field file
    #[arg(long = "patient-info", alias = "patient_info")]
    pub patient_info: Option<PathBuf>,
    /// Leave uploaded genomes in place if the report can't be created
    #[arg(long = "keep-uploads", alias = "keep_uploads")]
    pub keep_uploads: bool,
}

#[derive(Debug, Subcommand)]
pub enum CaseAction {
    /// Create a case container and upload member genomes into it
    #[command(arg_required_else_help = true)]
    Create(CaseArgs),
}

#[derive(Debug, Clone, Args)]
pub struct CaseArgs {
    /// PANEL on its own, or WGS and/or MT_PANEL
    #[arg(long, value_enum, num_args = 1.., required = true)]
    pub analysis: Vec<AnalysisType>,
    /// Test id, required for PANEL
    #[arg(long = "test_id", alias = "test-id")]
    pub test_id: Option<u64>,
    #[arg(long, value_enum, default_value = "b38")]
    pub assembly: Assembly,
    /// Label for the proband genome
    #[arg(long)]
    pub genome: Option<String>,
    /// Proband VCF
    #[arg(long)]
    pub vcf: Option<PathBuf>,
    #[arg(long)]
    pub checksum: Option<String>,
    /// key,value patient information file
    #[arg(long = "patient_info_file", alias = "patient-info-file")]
    pub patient_info_file: Option<PathBuf>,
    /// Proband accession, may come from the patient information file instead
    #[arg(long)]
    pub accession: Option<String>,
    /// Proband sex, may come from the patient information file instead
    #[arg(long, value_enum)]
    pub sex: Option<Sex>,
    /// HPO term ids, required for WGS
    #[arg(long = "hpo_terms", alias = "hpo-terms", num_args = 1..)]
    pub hpo_terms: Vec<String>,
    #[arg(long, value_enum)]
    pub platform: Option<Platform>,

    #[arg(long = "f1_accession", alias = "f1-accession")]
    pub f1_accession: Option<String>,
    #[arg(long = "f1_sex", alias = "f1-sex", value_enum)]
    pub f1_sex: Option<Sex>,
    /// Give only when family member 1 is affected
    #[arg(long = "f1_affected", alias = "f1-affected", num_args = 0..=1, default_missing_value = "true", value_parser = parse_affected)]
    pub f1_affected: Option<bool>,
    #[arg(long = "f1_relationship", alias = "f1-relationship", value_enum)]
    pub f1_relationship: Option<Relationship>,
    #[arg(long = "f1_genome", alias = "f1-genome")]
    pub f1_genome: Option<String>,
    #[arg(long = "f1_vcf", alias = "f1-vcf")]
    pub f1_vcf: Option<PathBuf>,
    #[arg(long = "f1_checksum", alias = "f1-checksum")]
    pub f1_checksum: Option<String>,

    #[arg(long = "f2_accession", alias = "f2-accession")]
    pub f2_accession: Option<String>,
    #[arg(long = "f2_sex", alias = "f2-sex", value_enum)]
    pub f2_sex: Option<Sex>,
    /// Give only when family member 2 is affected
    #[arg(long = "f2_affected", alias = "f2-affected", num_args = 0..=1, default_missing_value = "true", value_parser = parse_affected)]
    pub f2_affected: Option<bool>,
    #[arg(long = "f2_relationship", alias = "f2-relationship", value_enum)]
    pub f2_relationship: Option<Relationship>,
    #[arg(long = "f2_genome", alias = "f2-genome")]
    pub f2_genome: Option<String>,
    #[arg(long = "f2_vcf", alias = "f2-vcf")]
    pub f2_vcf: Option<PathBuf>,
    #[arg(long = "f2_checksum", alias = "f2-checksum")]
    pub f2_checksum: Option<String>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn definitions_are_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn panel_launch_needs_a_genome() {
        let result = Cli::try_parse_from(["fabrica", "report", "launch-panel", "--panel-id", "4", "--accession", "ACC1"]);
        assert!(result.is_err());

        let cli = Cli::try_parse_from([
            "fabrica", "report", "launch-panel", "--genome-id", "9", "--panel-id", "4", "--accession", "ACC1",
        ])
        .unwrap();
        let Command::Report { action: ReportAction::LaunchPanel(args) } = cli.command else { panic!("wrong command") };
        assert_eq!(args.genome_id, Some(9));
    }

    #[test]
    fn variant_filters_repeat() {
        let cli = Cli::try_parse_from([
            "fabrica", "report", "variants", "12", "--status", "REVIEW", "--status", "FAILED_CONFIRMATION",
            "--to-report", "PRIMARY_FINDING", "--format", "VCF",
        ])
        .unwrap();
        let Command::Report { action: ReportAction::Variants { statuses, to_reports, format, .. } } = cli.command else {
            panic!("wrong command")
        };
        assert_eq!(statuses, vec!["REVIEW", "FAILED_CONFIRMATION"]);
        assert_eq!(to_reports, vec![ToReport::PrimaryFinding]);
        assert_eq!(format, VariantFormat::Vcf);
    }

    #[test]
    fn affected_flag_takes_an_optional_value() {
        let cli = Cli::try_parse_from([
            "fabrica", "case", "create", "--analysis", "WGS", "--f1_affected", "--f2_affected", "false",
        ])
        .unwrap();
        let Command::Case { action: CaseAction::Create(args) } = cli.command else { panic!("wrong command") };
        assert_eq!(args.f1_affected, Some(true));
        assert_eq!(args.f2_affected, Some(false));
    }

    #[test]
    fn add_genomes_takes_the_report_before_the_folder() {
        let cli = Cli::try_parse_from([
            "fabrica", "report", "add-genomes", "63", "9", "/data/trio", "--accession", "ACC1", "--keep-uploads",
        ])
        .unwrap();
        let Command::Report { action: ReportAction::AddGenomes { report_id, family } } = cli.command else {
            panic!("wrong command")
        };
        assert_eq!(report_id, 63);
        assert_eq!(family.project_id, 9);
        assert_eq!(family.folder, PathBuf::from("/data/trio"));
        assert!(family.keep_uploads);
    }

    #[test]
    fn patient_fields_reads_or_writes() {
        let cli = Cli::try_parse_from(["fabrica", "report", "patient-fields", "12", "--get"]).unwrap();
        let Command::Report { action: ReportAction::PatientFields { get, file, json, .. } } = cli.command else {
            panic!("wrong command")
        };
        assert!(get);
        assert!(file.is_none() && json.is_none());

        assert!(Cli::try_parse_from(["fabrica", "report", "patient-fields", "12", "--get", "--json", "{}"]).is_err());
        assert!(Cli::try_parse_from(["fabrica", "report", "patient-fields", "12", "--extended"]).is_err());
    }
}
