use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use log::{info, warn};
use serde_json::Value;

use crate::api::client::{FabricClient, VariantQuery};
use crate::api::FabricApi;
use crate::cli::{CaseAction, Cli, Command, FamilyArgs, GenomeAction, GenomeMeta, PanelArgs, ProjectAction, ReportAction};
use crate::config::Config;
use crate::display::{print_json, render_case, render_genome, render_report};
use crate::manifest::family::infer_format;
use crate::manifest::genomes::read_genome_manifest;
use crate::manifest::phi::read_report_fields;
use crate::model::family::GenomeFile;
use crate::request::patch::{status_patch, variant_patch};
use crate::request::report::FamilyReportOptions;
use crate::workflow::case::create_case;
use crate::workflow::family::{launch_family_report, FamilyLaunch};
use crate::workflow::fields_json;
use crate::workflow::panel::{launch_panel_report, PanelGenome, PanelLaunch};

pub fn run(cli: Cli, config: &Config) -> anyhow::Result<()> {
    let client = FabricClient::new(config).context("Can't set up HTTP client")?;
    match cli.command {
        Command::Project { action } => project(&client, action),
        Command::Genome { action } => genome(&client, action),
        Command::Report { action } => report(&client, action),
        Command::Case { action: CaseAction::Create(args) } => {
            let info = args.patient_info().context("Can't read patient information file")?;
            let outcome = create_case(&client, args.into_options(), info)?;
            print!("{}", render_case(&outcome.container, &outcome.uploaded_members)?);
            Ok(())
        }
    }
}

fn project(client: &FabricClient, action: ProjectAction) -> anyhow::Result<()> {
    let response = match action {
        ProjectAction::Create { name, description, share_role } => client.create_project(&name, &description, share_role)?,
        ProjectAction::List => client.list_projects()?,
    };
    print_json(&response);
    Ok(())
}

fn genome(client: &FabricClient, action: GenomeAction) -> anyhow::Result<()> {
    match action {
        GenomeAction::Upload { project_id, file, meta, assembly } => {
            let genome = genome_file(file, &meta);
            let uploaded = client.upload_genome(project_id, &genome, assembly)?;
            print!("{}", render_genome(&uploaded)?);
        }
        GenomeAction::UploadFolder { project_id, folder, assembly } => {
            let genomes = read_genome_manifest(&folder)?;
            let mut failed = 0;
            for genome in genomes.iter() {
                match client.upload_genome(project_id, genome, assembly) {
                    Ok(uploaded) => print!("{}", render_genome(&uploaded)?),
                    Err(e) => {
                        warn!("Upload of {} failed: {e}", genome.path.display());
                        failed += 1;
                    }
                }
            }
            if failed > 0 {
                bail!("{failed} of {} uploads failed", genomes.len());
            }
            info!("Uploaded {} genomes", genomes.len());
        }
        GenomeAction::List { project_id } => print_json(&client.list_genomes(project_id)?),
        GenomeAction::Delete { genome_id } => print_json(&client.delete_genome(genome_id)?),
    }
    Ok(())
}

fn report(client: &FabricClient, action: ReportAction) -> anyhow::Result<()> {
    match action {
        ReportAction::List { extended } => print_json(&client.list_reports(extended)?),
        ReportAction::Get { report_id, extended } => print_json(&client.get_report(report_id, extended)?),
        ReportAction::Status { report_id } => {
            let report = client.get_report(report_id, false)?;
            match report.get("status") {
                Some(Value::String(status)) => println!("{status}"),
                _ => println!("Missing"),
            }
        }
        ReportAction::Variants {
            report_id,
            statuses,
            to_reports,
            extended,
            chrom,
            start_on_chrom,
            end_on_chrom,
            alt,
            format,
        } => {
            let query = VariantQuery {
                statuses,
                to_reports,
                extended,
                chrom,
                start_on_chrom,
                end_on_chrom,
                alt,
                format: Some(format),
            };
            print_json(&client.report_variants(report_id, &query)?);
        }
        ReportAction::PatchVariant { report_id, variant_id, status, to_report } => {
            let ops = variant_patch(status.as_deref(), to_report)?;
            print_json(&client.patch_variant(report_id, variant_id, &ops)?);
        }
        ReportAction::UpdateStatus { report_id, status } => {
            print_json(&client.update_report_status(report_id, &status_patch(&status))?);
        }
        ReportAction::PatientFields { report_id, get: true, .. } => print_json(&client.get_patient_fields(report_id)?),
        ReportAction::PatientFields { report_id, file, json, .. } => {
            let fields = match (file, json) {
                (Some(path), _) => fields_json(read_report_fields(&path)?),
                (None, Some(text)) => parse_fields(&text)?,
                (None, None) => bail!("give one of --file, --json or --get"),
            };
            print_json(&client.add_patient_fields(report_id, &fields)?);
        }
        ReportAction::LaunchPanel(args) => launch_panel(client, args)?,
        ReportAction::LaunchFamily(args) => launch_family(client, args, None)?,
        ReportAction::AddGenomes { report_id, family } => launch_family(client, family, Some(report_id))?,
    }
    Ok(())
}

fn launch_panel(client: &FabricClient, args: PanelArgs) -> anyhow::Result<()> {
    let genome = match (args.genome_id, args.project_id, args.genome_file) {
        (Some(genome_id), _, _) => PanelGenome::Existing(genome_id),
        (None, Some(project_id), Some(file)) => PanelGenome::Upload {
            project_id,
            genome: genome_file(file, &args.meta),
            assembly: args.assembly,
        },
        _ => bail!("give either --genome-id, or --project-id with --genome-file"),
    };
    let launch = PanelLaunch {
        genome,
        panel_id: args.panel_id,
        filter_id: args.filter_id,
        accession_id: args.accession,
        patient_fields: args.patient_info,
        keep_uploads: args.keep_uploads,
    };
    let outcome = launch_panel_report(client, &launch)?;
    if let Some(uploaded) = &outcome.upload {
        print!("{}", render_genome(uploaded)?);
    }
    print!("{}", render_report("Launched Clinical Report", &outcome.report)?);
    if let Some(fields) = &outcome.patient_fields {
        print_json(fields);
    }
    Ok(())
}

/// Launch a family report, or attach the family's genomes to `report_id` when given
fn launch_family(client: &FabricClient, args: FamilyArgs, report_id: Option<u64>) -> anyhow::Result<()> {
    let launch = FamilyLaunch {
        project_id: args.project_id,
        folder: args.folder,
        assembly: args.assembly,
        options: FamilyReportOptions {
            accession_id: args.accession,
            score_indels: args.score_indels,
            reporting_cutoff: args.cutoff,
            project_id: Some(args.project_id),
            hpo_terms: args.hpo_terms,
        },
        report_id,
        patient_fields: args.patient_info,
        keep_uploads: args.keep_uploads,
    };
    let outcome = launch_family_report(client, &launch)?;
    for uploaded in outcome.uploads.iter() {
        print!("{}", render_genome(uploaded)?);
    }
    let heading = match report_id {
        Some(_) => "Updated Family Report",
        None => "Launched Family Report",
    };
    print!("{}", render_report(heading, &outcome.report)?);
    if let Some(fields) = &outcome.patient_fields {
        print_json(fields);
    }
    Ok(())
}

/// Build upload metadata for a single file, filling label and format from its name
fn genome_file(path: PathBuf, meta: &GenomeMeta) -> GenomeFile {
    let name = file_name(&path);
    GenomeFile {
        label: meta.label.clone().unwrap_or_else(|| name.clone()),
        external_id: meta.external_id.clone(),
        sex: meta.sex,
        format: meta.format.clone().unwrap_or_else(|| infer_format(&name)),
        path,
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

fn parse_fields(text: &str) -> anyhow::Result<Value> {
    let value: Value = serde_json::from_str(text).context("--json is not valid JSON")?;
    match value.is_object() {
        true => Ok(value),
        false => bail!("--json must be a JSON object of field names to values"),
    }
}

#[cfg(test)]
mod tests {
    use crate::model::vocab::Sex;

    use super::*;

    #[test]
    fn single_upload_defaults_come_from_the_file_name() {
        let meta = GenomeMeta { label: None, sex: Sex::Female, external_id: "7".to_string(), format: None };
        let genome = genome_file(PathBuf::from("/data/NA12878.vcf.gz"), &meta);
        assert_eq!(genome.label, "NA12878.vcf.gz");
        assert_eq!(genome.format, "vcf.gz");
        assert_eq!(genome.sex, Sex::Female);
    }

    #[test]
    fn inline_fields_must_be_an_object() {
        assert!(parse_fields("{\"Last Name\": \"Doe\"}").is_ok());
        assert!(parse_fields("[1, 2]").is_err());
        assert!(parse_fields("{oops").is_err());
    }
}
