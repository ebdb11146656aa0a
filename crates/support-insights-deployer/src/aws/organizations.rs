//! AWS Organizations tree lookups

use anyhow::{Context, Result};
use aws_sdk_organizations::Client;
use std::future::Future;
use support_insights_aws::{AwsContext, into_aws_error};
use tracing::debug;

/// Trait for Organizations reads that can be faked in tests.
pub trait OrganizationOperations: Send + Sync {
    /// Id of the Organization root
    fn root_id(&self) -> impl Future<Output = Result<String>> + Send;

    /// Id of the Organization itself
    fn organization_id(&self) -> impl Future<Output = Result<String>> + Send;

    /// Ids of the OUs directly under `parent_id`
    fn list_child_ous(&self, parent_id: &str) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Ids of the accounts directly under `parent_id` (no recursion)
    fn list_accounts_for_parent(
        &self,
        parent_id: &str,
    ) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Ids of every account in the Organization
    fn list_accounts(&self) -> impl Future<Output = Result<Vec<String>>> + Send;
}

/// Organizations client
#[derive(Clone)]
pub struct OrganizationsClient {
    client: Client,
}

impl OrganizationsClient {
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.organizations_client(),
        }
    }
}

impl OrganizationOperations for OrganizationsClient {
    async fn root_id(&self) -> Result<String> {
        let response = self
            .client
            .list_roots()
            .send()
            .await
            .map_err(into_aws_error)
            .context("Failed to list Organization roots")?;

        response
            .roots()
            .first()
            .and_then(|root| root.id())
            .map(str::to_string)
            .context("No roots found in the Organization")
    }

    async fn organization_id(&self) -> Result<String> {
        let response = self
            .client
            .describe_organization()
            .send()
            .await
            .map_err(into_aws_error)
            .context("Failed to describe Organization")?;

        response
            .organization()
            .and_then(|org| org.id())
            .map(str::to_string)
            .context("Organization has no id")
    }

    async fn list_child_ous(&self, parent_id: &str) -> Result<Vec<String>> {
        let mut ou_ids = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_organizational_units_for_parent()
                .parent_id(parent_id);
            if let Some(token) = &next_token {
                request = request.next_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(into_aws_error)
                .with_context(|| format!("Failed to list OUs under {parent_id}"))?;
            ou_ids.extend(
                response
                    .organizational_units()
                    .iter()
                    .filter_map(|ou| ou.id())
                    .map(str::to_string),
            );

            match response.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        debug!(parent = %parent_id, count = ou_ids.len(), "Listed OUs");
        Ok(ou_ids)
    }

    async fn list_accounts_for_parent(&self, parent_id: &str) -> Result<Vec<String>> {
        let mut account_ids = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let mut request = self.client.list_accounts_for_parent().parent_id(parent_id);
            if let Some(token) = &next_token {
                request = request.next_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(into_aws_error)
                .with_context(|| format!("Failed to list accounts under {parent_id}"))?;
            account_ids.extend(
                response
                    .accounts()
                    .iter()
                    .filter_map(|account| account.id())
                    .map(str::to_string),
            );

            match response.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        debug!(parent = %parent_id, count = account_ids.len(), "Listed accounts");
        Ok(account_ids)
    }

    async fn list_accounts(&self) -> Result<Vec<String>> {
        let mut account_ids = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let mut request = self.client.list_accounts();
            if let Some(token) = &next_token {
                request = request.next_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(into_aws_error)
                .context("Failed to list Organization accounts")?;
            account_ids.extend(
                response
                    .accounts()
                    .iter()
                    .filter_map(|account| account.id())
                    .map(str::to_string),
            );

            match response.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        Ok(account_ids)
    }
}
