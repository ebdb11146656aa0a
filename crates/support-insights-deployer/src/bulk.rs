//! Cross-account support case upload
//!
//! Assumes a role in every Organization account and writes that account's
//! recent cases to the central bucket with the Cases collector.

use crate::aws::OrganizationOperations;
use crate::config::BulkUploadConfig;
use anyhow::Result;
use chrono::NaiveDate;
use std::future::Future;
use support_insights_collector::collectors::cases::upload_cases;
use support_insights_collector::{ObjectSink, SupportApi};
use tracing::{error, info};

/// Per-account outcome of a bulk upload
#[derive(Debug, Default)]
pub struct BulkReport {
    /// `(account, objects written)` for each account that succeeded
    pub uploaded: Vec<(String, usize)>,
    /// `(account, error)` for each account that failed
    pub failed: Vec<(String, String)>,
}

impl BulkReport {
    pub fn total_uploaded(&self) -> usize {
        self.uploaded.iter().map(|(_, n)| n).sum()
    }
}

/// Upload cases for every account except the excluded ones.
///
/// `support_for` yields a Support client acting in the given account.
/// Accounts are processed one at a time; a failure is recorded and the next
/// account still runs.
pub async fn upload_cases_across_accounts<O, K, F, Fut, S>(
    org: &O,
    sink: &K,
    config: &BulkUploadConfig,
    today: NaiveDate,
    support_for: F,
) -> Result<BulkReport>
where
    O: OrganizationOperations,
    K: ObjectSink,
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<S>>,
    S: SupportApi,
{
    let accounts = org.list_accounts().await?;
    let mut report = BulkReport::default();

    for account_id in accounts {
        if config.exclude_accounts.contains(&account_id) {
            info!(account_id = %account_id, "Skipping excluded account");
            continue;
        }

        let result = async {
            let support = support_for(account_id.clone()).await?;
            upload_cases(
                &support,
                sink,
                &config.bucket,
                &account_id,
                config.past_days,
                today,
            )
            .await
        }
        .await;

        match result {
            Ok(written) => {
                info!(account_id = %account_id, written, "Account cases uploaded");
                report.uploaded.push((account_id, written));
            }
            Err(e) => {
                error!(account_id = %account_id, error = %format!("{e:#}"), "Account case upload failed");
                report.failed.push((account_id, format!("{e:#}")));
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CannedSupport, FakeOrganization, MemorySink};
    use anyhow::bail;

    fn config(exclude: &[&str]) -> BulkUploadConfig {
        BulkUploadConfig {
            bucket: "central-data".to_string(),
            role_name: "CentralUserSupportCaseInsightsRole".to_string(),
            session_name: "SupportCaseSession".to_string(),
            past_days: 180,
            exclude_accounts: exclude.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[tokio::test]
    async fn uploads_each_account_except_excluded() {
        let org = FakeOrganization::new(&[]).with_all_accounts(&[
            "111111111111",
            "222222222222",
            "333333333333",
        ]);
        let sink = MemorySink::default();

        let report = upload_cases_across_accounts(&org, &sink, &config(&["222222222222"]), today(), |account| async move {
            Ok(CannedSupport::one_case(&format!("case-{account}")))
        })
        .await
        .unwrap();

        assert_eq!(report.total_uploaded(), 2);
        assert!(report.failed.is_empty());
        assert_eq!(
            sink.keys(),
            vec![
                "support-cases/111111111111/2024/05/case-111111111111.json",
                "support-cases/333333333333/2024/05/case-333333333333.json",
            ]
        );
    }

    #[tokio::test]
    async fn one_account_failure_does_not_stop_the_next() {
        let org = FakeOrganization::new(&[]).with_all_accounts(&["111111111111", "222222222222"]);
        let sink = MemorySink::default();

        let report = upload_cases_across_accounts(&org, &sink, &config(&[]), today(), |account| async move {
            if account == "111111111111" {
                bail!("AccessDenied: cannot assume role");
            }
            Ok(CannedSupport::one_case("42"))
        })
        .await
        .unwrap();

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "111111111111");
        assert_eq!(report.uploaded, vec![("222222222222".to_string(), 1)]);
    }
}
