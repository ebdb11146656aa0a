//! In-memory fakes for the AWS seams used by deployer tests

use crate::aws::{MockBucketOperations, OrganizationOperations, StackParameter, StackSetOperations};
use anyhow::{Result, bail};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicU32, Ordering};
use support_insights_collector::{CaseQuery, ObjectSink, SupportApi};
use support_insights_common::{OperationStatus, SupportCase, TrustedAdvisorResult};

/// Organization with a single root (`r-root`) in `o-fake`
pub struct FakeOrganization {
    root_ous: Vec<String>,
    accounts_by_parent: HashMap<String, Vec<String>>,
    all_accounts: Vec<String>,
}

impl FakeOrganization {
    pub fn new(root_ous: &[&str]) -> Self {
        Self {
            root_ous: root_ous.iter().map(|s| s.to_string()).collect(),
            accounts_by_parent: HashMap::new(),
            all_accounts: Vec::new(),
        }
    }

    pub fn with_accounts(mut self, parent: &str, accounts: &[&str]) -> Self {
        self.accounts_by_parent.insert(
            parent.to_string(),
            accounts.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    pub fn with_all_accounts(mut self, accounts: &[&str]) -> Self {
        self.all_accounts = accounts.iter().map(|s| s.to_string()).collect();
        self
    }
}

impl OrganizationOperations for FakeOrganization {
    async fn root_id(&self) -> Result<String> {
        Ok("r-root".to_string())
    }

    async fn organization_id(&self) -> Result<String> {
        Ok("o-fake".to_string())
    }

    async fn list_child_ous(&self, parent_id: &str) -> Result<Vec<String>> {
        if parent_id != "r-root" {
            return Ok(Vec::new());
        }
        Ok(self.root_ous.clone())
    }

    async fn list_accounts_for_parent(&self, parent_id: &str) -> Result<Vec<String>> {
        Ok(self
            .accounts_by_parent
            .get(parent_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_accounts(&self) -> Result<Vec<String>> {
        Ok(self.all_accounts.clone())
    }
}

/// Mutating CloudFormation calls, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CfnCall {
    CreateStackSet {
        name: String,
        parameters: Vec<StackParameter>,
    },
    CreateStackInstances {
        name: String,
        ou_ids: Vec<String>,
        region: String,
    },
    CreateStack {
        name: String,
        parameters: Vec<StackParameter>,
    },
}

/// CloudFormation replaying queued statuses.
///
/// Once a queue is drained every poll reports success.
#[derive(Default)]
pub struct FakeCloudFormation {
    calls: Mutex<Vec<CfnCall>>,
    operation_statuses: Mutex<VecDeque<OperationStatus>>,
    stack_statuses: Mutex<VecDeque<String>>,
    operation_polls: AtomicU32,
    stack_polls: AtomicU32,
    fail_stack_set_creation: bool,
}

impl FakeCloudFormation {
    pub fn with_operation_statuses(self, statuses: &[OperationStatus]) -> Self {
        *self.operation_statuses.lock().unwrap() = statuses.iter().copied().collect();
        self
    }

    pub fn with_stack_statuses(self, statuses: &[&str]) -> Self {
        *self.stack_statuses.lock().unwrap() = statuses.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn failing_stack_set_creation(mut self) -> Self {
        self.fail_stack_set_creation = true;
        self
    }

    pub fn calls(&self) -> Vec<CfnCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn operation_polls(&self) -> u32 {
        self.operation_polls.load(Ordering::SeqCst)
    }

    pub fn stack_polls(&self) -> u32 {
        self.stack_polls.load(Ordering::SeqCst)
    }
}

impl StackSetOperations for FakeCloudFormation {
    async fn create_stack_set(
        &self,
        name: &str,
        _template_body: &str,
        parameters: &[StackParameter],
    ) -> Result<()> {
        self.calls.lock().unwrap().push(CfnCall::CreateStackSet {
            name: name.to_string(),
            parameters: parameters.to_vec(),
        });
        if self.fail_stack_set_creation {
            bail!("NameAlreadyExistsException: StackSet {name} already exists");
        }
        Ok(())
    }

    async fn create_stack_instances(
        &self,
        name: &str,
        ou_ids: &[String],
        region: &str,
    ) -> Result<String> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(CfnCall::CreateStackInstances {
            name: name.to_string(),
            ou_ids: ou_ids.to_vec(),
            region: region.to_string(),
        });
        let instances = calls
            .iter()
            .filter(|c| matches!(c, CfnCall::CreateStackInstances { .. }))
            .count();
        Ok(format!("op-{instances}"))
    }

    async fn operation_status(&self, _name: &str, _operation_id: &str) -> Result<OperationStatus> {
        self.operation_polls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .operation_statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(OperationStatus::Succeeded))
    }

    async fn create_stack(
        &self,
        name: &str,
        _template_body: &str,
        parameters: &[StackParameter],
    ) -> Result<()> {
        self.calls.lock().unwrap().push(CfnCall::CreateStack {
            name: name.to_string(),
            parameters: parameters.to_vec(),
        });
        Ok(())
    }

    async fn stack_status(&self, _name: &str) -> Result<String> {
        self.stack_polls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .stack_statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "CREATE_COMPLETE".to_string()))
    }
}

/// Mocked central bucket; `exists` answers every HeadBucket
pub fn mock_buckets(exists: bool) -> MockBucketOperations {
    let mut buckets = MockBucketOperations::new();
    buckets
        .expect_bucket_exists()
        .returning(move |_| Ok(exists));
    buckets
}

/// Expect policies to be applied and collect them as `(bucket, json)`
pub fn record_policies(buckets: &mut MockBucketOperations) -> Arc<Mutex<Vec<(String, String)>>> {
    let applied = Arc::new(Mutex::new(Vec::new()));
    let sink = applied.clone();
    buckets
        .expect_put_bucket_policy()
        .returning(move |bucket, json| {
            sink.lock()
                .unwrap()
                .push((bucket.to_string(), json.to_string()));
            Ok(())
        });
    applied
}

/// Object store keyed by object key; a later write replaces the object
#[derive(Default)]
pub struct MemorySink {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemorySink {
    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }
}

impl ObjectSink for MemorySink {
    async fn put_object(&self, _bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        self.objects.lock().unwrap().insert(key.to_string(), body);
        Ok(())
    }
}

/// Support API returning a fixed set of cases
pub struct CannedSupport {
    cases: Vec<SupportCase>,
}

impl CannedSupport {
    pub fn one_case(display_id: &str) -> Self {
        Self {
            cases: vec![SupportCase {
                display_id: Some(display_id.to_string()),
                subject: Some("Quota increase".to_string()),
                time_created: Some("2024-05-20T08:00:00.000Z".to_string()),
                ..Default::default()
            }],
        }
    }
}

impl SupportApi for CannedSupport {
    async fn describe_cases(&self, _query: CaseQuery) -> Result<Vec<SupportCase>> {
        Ok(self.cases.clone())
    }

    async fn list_check_ids(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn check_result(&self, _check_id: &str) -> Result<Option<TrustedAdvisorResult>> {
        Ok(None)
    }
}
