//! CloudFormation stacks and service-managed StackSets

use anyhow::{Context, Result, anyhow, bail};
use aws_sdk_cloudformation::Client;
use aws_sdk_cloudformation::types::{
    AutoDeployment, Capability, DeploymentTargets, Parameter, PermissionModels,
};
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use support_insights_aws::{AwsContext, into_aws_error};
use support_insights_common::OperationStatus;
use tracing::{debug, info};

/// One `KEY=VALUE` template parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackParameter {
    pub key: String,
    pub value: String,
}

impl StackParameter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    fn to_sdk(&self) -> Parameter {
        Parameter::builder()
            .parameter_key(&self.key)
            .parameter_value(&self.value)
            .build()
    }
}

impl FromStr for StackParameter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("Expected KEY=VALUE, got '{s}'"))?;
        let key = key.trim();
        if key.is_empty() {
            bail!("Parameter key is empty in '{s}'");
        }
        Ok(Self::new(key, value.trim()))
    }
}

impl fmt::Display for StackParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Coarse progress of a single stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackProgress {
    InProgress,
    Complete,
    Failed,
}

impl StackProgress {
    /// Classify a `StackStatus` while waiting for creation
    pub fn from_create_status(status: &str) -> Self {
        match status {
            "CREATE_COMPLETE" => Self::Complete,
            s if s.ends_with("_IN_PROGRESS") => Self::InProgress,
            _ => Self::Failed,
        }
    }
}

/// Trait for CloudFormation operations that can be faked in tests.
pub trait StackSetOperations: Send + Sync {
    /// Create a service-managed StackSet with auto-deployment enabled
    fn create_stack_set(
        &self,
        name: &str,
        template_body: &str,
        parameters: &[StackParameter],
    ) -> impl Future<Output = Result<()>> + Send;

    /// Create stack instances for `ou_ids` in `region`, returning the operation id
    fn create_stack_instances(
        &self,
        name: &str,
        ou_ids: &[String],
        region: &str,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Current status of a StackSet operation
    fn operation_status(
        &self,
        name: &str,
        operation_id: &str,
    ) -> impl Future<Output = Result<OperationStatus>> + Send;

    /// Create a single stack in the current account
    fn create_stack(
        &self,
        name: &str,
        template_body: &str,
        parameters: &[StackParameter],
    ) -> impl Future<Output = Result<()>> + Send;

    /// Current `StackStatus` of a stack
    fn stack_status(&self, name: &str) -> impl Future<Output = Result<String>> + Send;
}

/// CloudFormation client
#[derive(Clone)]
pub struct CloudFormationClient {
    client: Client,
}

impl CloudFormationClient {
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.cloudformation_client(),
        }
    }
}

impl StackSetOperations for CloudFormationClient {
    async fn create_stack_set(
        &self,
        name: &str,
        template_body: &str,
        parameters: &[StackParameter],
    ) -> Result<()> {
        info!(stack_set = %name, params = parameters.len(), "Creating StackSet");

        self.client
            .create_stack_set()
            .stack_set_name(name)
            .template_body(template_body)
            .set_parameters(Some(parameters.iter().map(StackParameter::to_sdk).collect()))
            .capabilities(Capability::CapabilityNamedIam)
            .capabilities(Capability::CapabilityAutoExpand)
            .permission_model(PermissionModels::ServiceManaged)
            .auto_deployment(
                AutoDeployment::builder()
                    .enabled(true)
                    .retain_stacks_on_account_removal(false)
                    .build(),
            )
            .send()
            .await
            .map_err(into_aws_error)
            .with_context(|| format!("Failed to create StackSet {name}"))?;

        Ok(())
    }

    async fn create_stack_instances(
        &self,
        name: &str,
        ou_ids: &[String],
        region: &str,
    ) -> Result<String> {
        let response = self
            .client
            .create_stack_instances()
            .stack_set_name(name)
            .deployment_targets(
                DeploymentTargets::builder()
                    .set_organizational_unit_ids(Some(ou_ids.to_vec()))
                    .build(),
            )
            .regions(region)
            .send()
            .await
            .map_err(into_aws_error)
            .with_context(|| format!("Failed to create stack instances for {name}"))?;

        let operation_id = response
            .operation_id()
            .context("CreateStackInstances returned no operation id")?
            .to_string();

        debug!(stack_set = %name, operation_id = %operation_id, "Stack instances requested");
        Ok(operation_id)
    }

    async fn operation_status(&self, name: &str, operation_id: &str) -> Result<OperationStatus> {
        let response = self
            .client
            .describe_stack_set_operation()
            .stack_set_name(name)
            .operation_id(operation_id)
            .send()
            .await
            .map_err(into_aws_error)
            .with_context(|| format!("Failed to describe operation {operation_id} of {name}"))?;

        let status = response
            .stack_set_operation()
            .and_then(|op| op.status())
            .map(|s| s.as_str())
            .context("StackSet operation has no status")?;

        OperationStatus::parse(status)
            .ok_or_else(|| anyhow!("Unknown StackSet operation status '{status}'"))
    }

    async fn create_stack(
        &self,
        name: &str,
        template_body: &str,
        parameters: &[StackParameter],
    ) -> Result<()> {
        info!(stack = %name, params = parameters.len(), "Creating stack");

        self.client
            .create_stack()
            .stack_name(name)
            .template_body(template_body)
            .set_parameters(Some(parameters.iter().map(StackParameter::to_sdk).collect()))
            .capabilities(Capability::CapabilityNamedIam)
            .capabilities(Capability::CapabilityAutoExpand)
            .send()
            .await
            .map_err(into_aws_error)
            .with_context(|| format!("Failed to create stack {name}"))?;

        Ok(())
    }

    async fn stack_status(&self, name: &str) -> Result<String> {
        let response = self
            .client
            .describe_stacks()
            .stack_name(name)
            .send()
            .await
            .map_err(into_aws_error)
            .with_context(|| format!("Failed to describe stack {name}"))?;

        response
            .stacks()
            .first()
            .and_then(|s| s.stack_status())
            .map(|s| s.as_str().to_string())
            .with_context(|| format!("Stack {name} has no status"))
    }
}
