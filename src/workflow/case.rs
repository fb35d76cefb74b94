use log::{info, warn};

use crate::api::{ApiError, CaseContainer, FabricApi};
use crate::model::patient::PatientInfo;
use crate::request::case::{CaseOptions, CasePlan};
use crate::request::schema::{self, Schema};
use crate::request::ValidationError;
use crate::workflow::{Created, Progress, WorkflowError, WorkflowState};

#[derive(Debug, Clone, PartialEq)]
pub struct CaseOutcome {
    pub container: CaseContainer,
    /// Member ids that received a genome
    pub uploaded_members: Vec<u64>,
}

/// Validate a case request, create the case container and upload each member's VCF
///
/// Case containers can't be deleted through the API. When a member upload fails the container
/// is left in place and the members still waiting for a genome are logged.
pub fn create_case<A: FabricApi + ?Sized>(
    api: &A,
    options: CaseOptions,
    info: PatientInfo,
) -> Result<CaseOutcome, WorkflowError> {
    let mut progress = Progress::new();

    let plan = options
        .into_plan(info)
        .and_then(|plan| plan.check_files().map(|_| plan))
        .map_err(|e| WorkflowError::new(&progress, e))?;
    let payload = serde_json::to_value(&plan.request).map_err(|e| {
        let error = ValidationError::Schema { schema: Schema::CaseContainer.name(), errors: vec![e.to_string()] };
        WorkflowError::new(&progress, error)
    })?;
    schema::validate(Schema::CaseContainer, &payload).map_err(|e| WorkflowError::new(&progress, e))?;
    progress.advance(WorkflowState::ManifestParsed);

    let container = api.create_case_container(&plan.request).map_err(|e| WorkflowError::new(&progress, e))?;
    info!("Created case container {}", container.case_container_id);
    progress.advance(WorkflowState::ContainerCreated);

    let uploaded_members = upload_member_genomes(api, &plan, &container, &mut progress)?;

    progress.advance(WorkflowState::Done);
    Ok(CaseOutcome { container, uploaded_members })
}

fn upload_member_genomes<A: FabricApi + ?Sized>(
    api: &A,
    plan: &CasePlan,
    container: &CaseContainer,
    progress: &mut Progress,
) -> Result<Vec<u64>, WorkflowError> {
    let mut uploaded = Vec::new();
    let mut count = 0;
    for (index, genome) in plan.genomes.iter().enumerate() {
        let Some(genome) = genome else { continue };
        let label = plan.member_label(index);
        // upload URLs come back in member order
        let result = match container.urls.get(index) {
            Some(member) => {
                info!("Uploading {label} genome {} for member {}", genome.genome_name, member.member_id);
                api.upload_case_genome(&member.url, genome, plan.request.assembly_version, plan.request.platform)
                    .map(|_| member.member_id)
            }
            None => Err(ApiError::UnexpectedResponse {
                expected: "an upload url for every member",
                body: container.raw.to_string(),
            }),
        };

        match result {
            Ok(member_id) => {
                uploaded.push(member_id);
                count += 1;
                progress.advance(WorkflowState::GenomesUploaded(count));
            }
            Err(e) => {
                let waiting: Vec<String> = plan
                    .genomes
                    .iter()
                    .enumerate()
                    .skip(index)
                    .filter(|(_, genome)| genome.is_some())
                    .map(|(i, _)| match container.urls.get(i) {
                        Some(member) => format!("{} (member {})", plan.member_label(i), member.member_id),
                        None => plan.member_label(i),
                    })
                    .collect();
                warn!(
                    "Case container {} still needs genomes for: {}",
                    container.case_container_id,
                    waiting.join(", ")
                );
                return Err(WorkflowError::new(progress, e).with_created(Created::CaseContainer(container.case_container_id)));
            }
        }
    }
    Ok(uploaded)
}
