//! StackSet and stack deployment with status polling

use crate::aws::{StackParameter, StackProgress, StackSetOperations};
use crate::wait::{PollConfig, poll_until};
use anyhow::{Context, Result, bail};
use chrono::NaiveDateTime;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// An in-flight StackSet instance operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackSetHandle {
    pub name: String,
    pub operation_id: String,
}

/// Everything needed to roll a StackSet out to a set of OUs
#[derive(Debug, Clone)]
pub struct StackSetRequest<'a> {
    pub name: &'a str,
    pub template_body: &'a str,
    pub region: &'a str,
    pub parameters: &'a [StackParameter],
    pub ou_ids: &'a [String],
}

/// `<prefix>-<YYYYmmddHHMMSS>`
pub fn timestamped_name(prefix: &str, now: NaiveDateTime) -> String {
    format!("{prefix}-{}", now.format("%Y%m%d%H%M%S"))
}

pub async fn read_template(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read template {}", path.display()))
}

/// Create the StackSet and its instances for every OU in the region.
///
/// Any failure is returned; no handle exists without an operation id.
pub async fn deploy_stack_set<C: StackSetOperations>(
    cfn: &C,
    request: &StackSetRequest<'_>,
) -> Result<StackSetHandle> {
    cfn.create_stack_set(request.name, request.template_body, request.parameters)
        .await?;
    info!(stack_set = %request.name, "StackSet created");

    let operation_id = cfn
        .create_stack_instances(request.name, request.ou_ids, request.region)
        .await?;
    info!(
        stack_set = %request.name,
        region = %request.region,
        operation_id = %operation_id,
        "Stack instances are being deployed"
    );

    Ok(StackSetHandle {
        name: request.name.to_string(),
        operation_id,
    })
}

/// Poll the operation until `SUCCEEDED` (ok) or `FAILED`/`STOPPED` (error)
pub async fn wait_for_stack_set<C: StackSetOperations>(
    cfn: &C,
    handle: &StackSetHandle,
    poll: &PollConfig,
    cancel: Option<&CancellationToken>,
) -> Result<()> {
    info!(
        stack_set = %handle.name,
        "Waiting for the StackSet operation to complete, please do not exit"
    );

    let status = poll_until(
        poll,
        cancel,
        move || async move {
            let status = cfn
                .operation_status(&handle.name, &handle.operation_id)
                .await?;
            info!(stack_set = %handle.name, status = %status, "StackSet operation status");
            Ok(status.is_terminal().then_some(status))
        },
        &handle.name,
    )
    .await?;

    if !status.is_success() {
        bail!(
            "StackSet {} operation {} ended with status {status}, check the CloudFormation console for details",
            handle.name,
            handle.operation_id
        );
    }
    info!(stack_set = %handle.name, "StackSet operation completed successfully");
    Ok(())
}

/// Create a stack in the current account and wait for `CREATE_COMPLETE`
pub async fn deploy_stack<C: StackSetOperations>(
    cfn: &C,
    name: &str,
    template_body: &str,
    parameters: &[StackParameter],
    poll: &PollConfig,
    cancel: Option<&CancellationToken>,
) -> Result<()> {
    cfn.create_stack(name, template_body, parameters).await?;
    info!(stack = %name, "Stack is being created");

    let (status, progress) = poll_until(
        poll,
        cancel,
        move || async move {
            let status = cfn.stack_status(name).await?;
            let progress = StackProgress::from_create_status(&status);
            info!(stack = %name, status = %status, "Stack status");
            Ok((progress != StackProgress::InProgress).then_some((status, progress)))
        },
        name,
    )
    .await?;

    if progress == StackProgress::Failed {
        bail!("Stack {name} ended with status {status}");
    }
    info!(stack = %name, "Stack created successfully");
    Ok(())
}
