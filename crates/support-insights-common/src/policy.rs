//! Central bucket policy document
//!
//! The data bucket grants each member account's collector role read/write
//! access to its objects, restricted to principals under the selected OUs.

use serde::Serialize;
use std::collections::BTreeMap;

pub const POLICY_VERSION: &str = "2012-10-17";

/// Object actions granted to member account roles
pub const BUCKET_ACTIONS: &[&str] = &["s3:GetObject", "s3:PutObject", "s3:PutObjectAcl"];

/// Role ARN for the collector role in a member account
pub fn role_arn(account_id: &str, role_name: &str) -> String {
    format!("arn:aws:iam::{account_id}:role/{role_name}")
}

/// Organization path pattern matching every principal under an OU
pub fn org_path(org_id: &str, root_id: &str, ou_id: &str) -> String {
    format!("{org_id}/{root_id}/{ou_id}/*")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BucketPolicy {
    pub version: String,
    pub statement: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    pub effect: String,
    pub principal: Principal,
    pub action: Vec<String>,
    pub resource: String,
    pub condition: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Principal {
    #[serde(rename = "AWS")]
    pub aws: Vec<String>,
}

impl BucketPolicy {
    /// Build the single-statement policy for `bucket`.
    ///
    /// One principal is emitted per entry in `account_ids`, in order.
    pub fn for_accounts(
        bucket: &str,
        org_id: &str,
        root_id: &str,
        ou_ids: &[String],
        account_ids: &[String],
        role_name: &str,
    ) -> Self {
        let principals = account_ids
            .iter()
            .map(|account| role_arn(account, role_name))
            .collect();

        let paths = ou_ids
            .iter()
            .map(|ou| org_path(org_id, root_id, ou))
            .collect();

        let condition = BTreeMap::from([(
            "ForAnyValue:StringLike".to_string(),
            BTreeMap::from([("aws:PrincipalOrgPaths".to_string(), paths)]),
        )]);

        Self {
            version: POLICY_VERSION.to_string(),
            statement: vec![Statement {
                effect: "Allow".to_string(),
                principal: Principal { aws: principals },
                action: BUCKET_ACTIONS.iter().map(|a| a.to_string()).collect(),
                resource: format!("arn:aws:s3:::{bucket}/*"),
                condition,
            }],
        }
    }

    /// Compact JSON, as sent to `PutBucketPolicy`
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Four-space indented JSON for the local policy file
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        // serde_json only emits valid UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
