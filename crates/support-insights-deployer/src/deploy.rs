//! Deployment workflows behind the CLI subcommands

use crate::aws::{BucketOperations, OrganizationOperations, StackParameter, StackSetOperations};
use crate::config::{CaseCollectorConfig, DeployConfig, MemberStackConfig, PolicyConfig, StackSetConfig};
use crate::policy::{PolicyOutcome, publish_bucket_policy};
use crate::resolver::resolve_ou_ids;
use crate::stackset::{
    StackSetHandle, StackSetRequest, deploy_stack, deploy_stack_set, timestamped_name,
    wait_for_stack_set,
};
use anyhow::{Result, bail};
use chrono::NaiveDateTime;
use support_insights_common::defaults::{STACKSET_HISTORICAL_PREFIX, STACKSET_PREFIX};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Template bodies for the organization-wide rollout
#[derive(Debug, Clone)]
pub struct OrgTemplates {
    pub member: String,
    pub historical: String,
}

/// What the organization-wide rollout did
#[derive(Debug, Clone)]
pub struct OrgDeployReport {
    pub resources: StackSetHandle,
    pub historical: StackSetHandle,
    pub policy: PolicyOutcome,
}

/// Roll out the support collector to every account under the selected OUs.
///
/// The member resources StackSet must succeed before the bucket policy is
/// generated and the historical sync StackSet is deployed.
#[allow(clippy::too_many_arguments)]
pub async fn deploy_support_collector<C, O, B>(
    cfn: &C,
    org: &O,
    buckets: &B,
    config: &DeployConfig,
    templates: &OrgTemplates,
    region: &str,
    now: NaiveDateTime,
    cancel: Option<&CancellationToken>,
) -> Result<OrgDeployReport>
where
    C: StackSetOperations,
    O: OrganizationOperations,
    B: BucketOperations,
{
    let bucket = config.policy.bucket.as_str();
    if !buckets.bucket_exists(bucket).await? {
        bail!("Bucket {bucket} does not exist");
    }

    let ou_ids = resolve_ou_ids(org, &config.ou_ids).await?;

    info!("Creating CloudFormation StackSet for member accounts");
    let resources_params = vec![
        StackParameter::new("LambdaRoleName", &config.policy.role_name),
        StackParameter::new("SupportDataManagementBucketName", bucket),
    ];
    let resources_name = timestamped_name(STACKSET_PREFIX, now);
    let resources = deploy_stack_set(
        cfn,
        &StackSetRequest {
            name: &resources_name,
            template_body: &templates.member,
            region,
            parameters: &resources_params,
            ou_ids: &ou_ids,
        },
    )
    .await?;
    wait_for_stack_set(cfn, &resources, &config.poll, cancel).await?;

    info!("Generating policy for the data bucket");
    let policy = publish_bucket_policy(org, buckets, &config.policy, &ou_ids).await?;

    info!("Deploying a StackSet with a one time rule to sync historical support data");
    let historical_params = vec![StackParameter::new("SupportDataManagementBucketName", bucket)];
    let historical_name = timestamped_name(STACKSET_HISTORICAL_PREFIX, now);
    let historical = deploy_stack_set(
        cfn,
        &StackSetRequest {
            name: &historical_name,
            template_body: &templates.historical,
            region,
            parameters: &historical_params,
            ou_ids: &ou_ids,
        },
    )
    .await?;
    wait_for_stack_set(cfn, &historical, &config.poll, cancel).await?;

    info!("StackSets completed, all done");
    Ok(OrgDeployReport {
        resources,
        historical,
        policy,
    })
}

/// Deploy one StackSet to the resolved OUs and wait for it
pub async fn deploy_single_stack_set<C, O>(
    cfn: &C,
    org: &O,
    config: &StackSetConfig,
    template_body: &str,
    region: &str,
    cancel: Option<&CancellationToken>,
) -> Result<StackSetHandle>
where
    C: StackSetOperations,
    O: OrganizationOperations,
{
    let ou_ids = resolve_ou_ids(org, &config.ou_ids).await?;
    let handle = deploy_stack_set(
        cfn,
        &StackSetRequest {
            name: &config.name,
            template_body,
            region,
            parameters: &config.parameters,
            ou_ids: &ou_ids,
        },
    )
    .await?;
    wait_for_stack_set(cfn, &handle, &config.poll, cancel).await?;
    Ok(handle)
}

/// Generate the bucket policy for the resolved OUs without deploying anything
pub async fn bucket_policy_only<O, B>(
    org: &O,
    buckets: &B,
    config: &PolicyConfig,
    ou_input: &str,
) -> Result<PolicyOutcome>
where
    O: OrganizationOperations,
    B: BucketOperations,
{
    let ou_ids = resolve_ou_ids(org, ou_input).await?;
    publish_bucket_policy(org, buckets, config, &ou_ids).await
}

/// Deploy the central case collector stack, then a member StackSet to every
/// OU under the root.
///
/// Returns `None` when the Organization has no OUs to target.
#[allow(clippy::too_many_arguments)]
pub async fn deploy_case_collector<C, O>(
    cfn: &C,
    org: &O,
    config: &CaseCollectorConfig,
    central_account_id: &str,
    central_template: &str,
    member_template: &str,
    region: &str,
    cancel: Option<&CancellationToken>,
) -> Result<Option<StackSetHandle>>
where
    C: StackSetOperations,
    O: OrganizationOperations,
{
    deploy_stack(
        cfn,
        &config.central_stack_name,
        central_template,
        &[],
        &config.poll,
        cancel,
    )
    .await?;
    info!("Central account stack deployed successfully");

    let root_id = org.root_id().await?;
    let ou_ids = org.list_child_ous(&root_id).await?;
    if ou_ids.is_empty() {
        warn!("No Organizational Units found, skipping member account StackSet deployment");
        return Ok(None);
    }

    let params = vec![StackParameter::new("ManagementAccountID", central_account_id)];
    let handle = deploy_stack_set(
        cfn,
        &StackSetRequest {
            name: &config.member_stack_set_name,
            template_body: member_template,
            region,
            parameters: &params,
            ou_ids: &ou_ids,
        },
    )
    .await?;
    wait_for_stack_set(cfn, &handle, &config.poll, cancel).await?;
    Ok(Some(handle))
}

/// Deploy the collector Lambda stack into the current account
pub async fn deploy_member_stack<C: StackSetOperations>(
    cfn: &C,
    config: &MemberStackConfig,
    template_body: &str,
    cancel: Option<&CancellationToken>,
) -> Result<()> {
    let params = vec![
        StackParameter::new("LambdaRoleName", &config.role_name),
        StackParameter::new("MasterAccountBucketName", &config.master_bucket),
        StackParameter::new("MemberBucketName", &config.member_bucket),
    ];
    deploy_stack(
        cfn,
        &config.stack_name,
        template_body,
        &params,
        &config.poll,
        cancel,
    )
    .await
}
