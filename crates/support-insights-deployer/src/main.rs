//! support-insights: deploys Support insights collection across an AWS Organization

use anyhow::{Result, bail};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use support_insights_aws::{AwsContext, S3Client, assume_role, get_current_account_id};
use support_insights_common::defaults::{
    BUCKET_POLICY_FILE, DEFAULT_CASE_MEMBER_STACKSET_NAME, DEFAULT_CASE_MEMBER_TEMPLATE,
    DEFAULT_CENTRAL_STACK_NAME, DEFAULT_CENTRAL_TEMPLATE, DEFAULT_HISTORICAL_SYNC_TEMPLATE,
    DEFAULT_MEMBER_STACK_NAME, DEFAULT_MEMBER_TEMPLATE, DEFAULT_PAST_DAYS, LAMBDA_ROLE_NAME,
    MEMBER_ACCOUNT_ROLE_NAME, ROLE_SESSION_NAME,
};
use support_insights_common::split_csv;
use support_insights_collector::SupportClient;
use support_insights_deployer::aws::{CloudFormationClient, OrganizationsClient, StackParameter};
use support_insights_deployer::config::{
    AwsConfig, BulkUploadConfig, CaseCollectorConfig, DeployConfig, MemberStackConfig,
    PolicyConfig, StackSetConfig,
};
use support_insights_deployer::wait::PollConfig;
use support_insights_deployer::{bulk, deploy, stackset};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "support-insights")]
#[command(about = "Deploy Support insights collection across an AWS Organization")]
#[command(version)]
struct Args {
    /// AWS region (defaults to the SDK's resolved region)
    #[arg(long, global = true)]
    region: Option<String>,

    /// AWS profile to use (overrides AWS_PROFILE env var)
    #[arg(long, global = true)]
    aws_profile: Option<String>,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    fn aws(&self) -> AwsConfig {
        AwsConfig {
            region: self.region.clone(),
            aws_profile: self.aws_profile.clone(),
        }
    }
}

/// Arguments shared by every policy-producing command
#[derive(clap::Args, Debug)]
struct PolicyArgs {
    /// Central data bucket name
    #[arg(long)]
    data_bucket: String,

    /// Role name granted access in each member account
    #[arg(long, default_value = LAMBDA_ROLE_NAME)]
    role_name: String,

    /// Local file the generated bucket policy is written to
    #[arg(long, default_value = BUCKET_POLICY_FILE)]
    policy_output: String,

    /// Replace the live bucket policy with the generated one
    #[arg(long)]
    overwrite_data_bucket_policy: bool,
}

impl From<PolicyArgs> for PolicyConfig {
    fn from(args: PolicyArgs) -> Self {
        Self {
            bucket: args.data_bucket,
            role_name: args.role_name,
            output_path: args.policy_output.into(),
            overwrite: args.overwrite_data_bucket_policy,
        }
    }
}

/// Arguments for the deploy command
#[derive(clap::Args, Debug)]
struct DeployArgs {
    #[command(flatten)]
    policy: PolicyArgs,

    /// Organizational Units to deploy to (e.g. ou-xxxx-1111,ou-xxxx-2222)
    #[arg(long)]
    ou_ids: String,

    /// Member account resources template
    #[arg(long, default_value = DEFAULT_MEMBER_TEMPLATE)]
    member_template: String,

    /// Historical data sync template
    #[arg(long, default_value = DEFAULT_HISTORICAL_SYNC_TEMPLATE)]
    historical_template: String,

    /// Stop polling a StackSet operation after this many status checks
    #[arg(long)]
    max_attempts: Option<u32>,
}

impl DeployArgs {
    fn into_config(self) -> DeployConfig {
        DeployConfig {
            policy: self.policy.into(),
            ou_ids: self.ou_ids,
            member_template: self.member_template.into(),
            historical_template: self.historical_template.into(),
            poll: PollConfig::with_max_attempts(self.max_attempts),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Deploy the support collector to member accounts, publish the bucket
    /// policy and trigger the historical data sync
    Deploy(Box<DeployArgs>),

    /// Deploy one StackSet to a set of OUs and wait for it
    DeployStackset {
        /// StackSet name
        #[arg(long)]
        stackset_name: String,

        /// CloudFormation template file
        #[arg(long)]
        template_file: String,

        /// Organizational Units to deploy to (comma-separated)
        #[arg(long)]
        ou_ids: String,

        /// Template parameter as KEY=VALUE (repeatable)
        #[arg(long = "parameter", value_name = "KEY=VALUE")]
        parameters: Vec<StackParameter>,

        /// Stop polling after this many status checks
        #[arg(long)]
        max_attempts: Option<u32>,
    },

    /// Generate the data bucket policy for a set of OUs
    BucketPolicy {
        #[command(flatten)]
        policy: PolicyArgs,

        /// Organizational Units whose accounts are granted access
        #[arg(long)]
        ou_ids: String,
    },

    /// Deploy the central case collector stack and member account roles
    DeployCaseCollector {
        /// Central account trusted by member roles (defaults to the caller's account)
        #[arg(short, long)]
        account_id: Option<String>,

        #[arg(long, default_value = DEFAULT_CENTRAL_TEMPLATE)]
        central_template: String,

        #[arg(long, default_value = DEFAULT_CENTRAL_STACK_NAME)]
        central_stack_name: String,

        #[arg(long, default_value = DEFAULT_CASE_MEMBER_TEMPLATE)]
        member_template: String,

        #[arg(long, default_value = DEFAULT_CASE_MEMBER_STACKSET_NAME)]
        member_stackset_name: String,

        /// Stop polling after this many status checks
        #[arg(long)]
        max_attempts: Option<u32>,
    },

    /// Deploy the collector Lambda stack into the current account only
    DeployMemberStack {
        /// Bucket holding the Lambda package
        #[arg(long)]
        bucket_name: String,

        /// Central data bucket
        #[arg(long)]
        master_account_bucket_name: String,

        #[arg(long, default_value = DEFAULT_MEMBER_TEMPLATE)]
        template_file: String,

        #[arg(long, default_value = DEFAULT_MEMBER_STACK_NAME)]
        stack_name: String,

        #[arg(long, default_value = LAMBDA_ROLE_NAME)]
        role_name: String,

        /// Stop polling after this many status checks
        #[arg(long)]
        max_attempts: Option<u32>,
    },

    /// Upload recent support cases from every Organization account
    BulkUploadCases {
        /// Central data bucket
        #[arg(long)]
        bucket: String,

        /// Collect cases created in the last N days
        #[arg(long, default_value_t = DEFAULT_PAST_DAYS)]
        past_days: u32,

        /// Account ids to skip (comma-separated or repeated)
        #[arg(long = "exclude-account")]
        exclude_accounts: Vec<String>,

        /// Role assumed in each member account
        #[arg(long, default_value = MEMBER_ACCOUNT_ROLE_NAME)]
        role_name: String,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();

    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }

    if let Some(suggestion) = e
        .chain()
        .find_map(|cause| cause.downcast_ref::<support_insights_aws::AwsError>())
        .and_then(|aws| aws.suggestion())
    {
        let _ = writeln!(stderr, "\n\x1b[36mHint:\x1b[0m {suggestion}");
    }

    if std::env::var("RUST_BACKTRACE").is_err() {
        let _ = writeln!(
            stderr,
            "\n\x1b[2mSet RUST_BACKTRACE=1 for a detailed backtrace\x1b[0m"
        );
    } else {
        let backtrace = e.backtrace();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            let _ = writeln!(stderr, "\n\x1b[2mBacktrace:\x1b[0m\n{backtrace}");
        }
    }
}

/// Cancel `token` on Ctrl-C so polling loops stop early
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping");
            trigger.cancel();
        }
    });
    token
}

fn require_region(ctx: &AwsContext) -> Result<String> {
    if ctx.region().is_empty() {
        bail!("No AWS region configured; pass --region or set AWS_REGION");
    }
    Ok(ctx.region().to_string())
}

async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let aws = args.aws();
    if let Some(profile) = &aws.aws_profile {
        info!(profile = %profile, "Using AWS profile");
    }
    let ctx = aws.load().await;
    let cancel = cancel_on_ctrl_c();

    match args.command {
        Command::Deploy(deploy_args) => {
            let config = (*deploy_args).into_config();
            let region = require_region(&ctx)?;
            let templates = deploy::OrgTemplates {
                member: stackset::read_template(&config.member_template).await?,
                historical: stackset::read_template(&config.historical_template).await?,
            };

            let report = deploy::deploy_support_collector(
                &CloudFormationClient::from_context(&ctx),
                &OrganizationsClient::from_context(&ctx),
                &S3Client::from_context(&ctx),
                &config,
                &templates,
                &region,
                Local::now().naive_local(),
                Some(&cancel),
            )
            .await?;

            info!(
                resources = %report.resources.name,
                historical = %report.historical.name,
                policy_applied = report.policy.applied,
                "Deployment finished"
            );
        }

        Command::DeployStackset {
            stackset_name,
            template_file,
            ou_ids,
            parameters,
            max_attempts,
        } => {
            let config = StackSetConfig {
                name: stackset_name,
                template: template_file.into(),
                ou_ids,
                parameters,
                poll: PollConfig::with_max_attempts(max_attempts),
            };
            let region = require_region(&ctx)?;
            let template = stackset::read_template(&config.template).await?;

            let handle = deploy::deploy_single_stack_set(
                &CloudFormationClient::from_context(&ctx),
                &OrganizationsClient::from_context(&ctx),
                &config,
                &template,
                &region,
                Some(&cancel),
            )
            .await?;
            info!(stack_set = %handle.name, operation_id = %handle.operation_id, "StackSet deployed");
        }

        Command::BucketPolicy { policy, ou_ids } => {
            let config: PolicyConfig = policy.into();
            let outcome = deploy::bucket_policy_only(
                &OrganizationsClient::from_context(&ctx),
                &S3Client::from_context(&ctx),
                &config,
                &ou_ids,
            )
            .await?;
            info!(
                path = %config.output_path.display(),
                applied = outcome.applied,
                "Bucket policy generated"
            );
        }

        Command::DeployCaseCollector {
            account_id,
            central_template,
            central_stack_name,
            member_template,
            member_stackset_name,
            max_attempts,
        } => {
            let config = CaseCollectorConfig {
                central_account_id: account_id,
                central_template: central_template.into(),
                central_stack_name,
                member_template: member_template.into(),
                member_stack_set_name: member_stackset_name,
                poll: PollConfig::with_max_attempts(max_attempts),
            };
            let region = require_region(&ctx)?;
            let central_account_id = match &config.central_account_id {
                Some(id) => id.clone(),
                None => get_current_account_id(&ctx).await?.to_string(),
            };
            let central = stackset::read_template(&config.central_template).await?;
            let member = stackset::read_template(&config.member_template).await?;

            let handle = deploy::deploy_case_collector(
                &CloudFormationClient::from_context(&ctx),
                &OrganizationsClient::from_context(&ctx),
                &config,
                &central_account_id,
                &central,
                &member,
                &region,
                Some(&cancel),
            )
            .await?;
            if let Some(handle) = handle {
                info!(stack_set = %handle.name, "Member account StackSet deployed");
            }
        }

        Command::DeployMemberStack {
            bucket_name,
            master_account_bucket_name,
            template_file,
            stack_name,
            role_name,
            max_attempts,
        } => {
            let config = MemberStackConfig {
                template: template_file.into(),
                stack_name,
                role_name,
                master_bucket: master_account_bucket_name,
                member_bucket: bucket_name,
                poll: PollConfig::with_max_attempts(max_attempts),
            };
            let template = stackset::read_template(&config.template).await?;

            deploy::deploy_member_stack(
                &CloudFormationClient::from_context(&ctx),
                &config,
                &template,
                Some(&cancel),
            )
            .await?;
        }

        Command::BulkUploadCases {
            bucket,
            past_days,
            exclude_accounts,
            role_name,
        } => {
            let config = BulkUploadConfig {
                bucket,
                role_name,
                session_name: ROLE_SESSION_NAME.to_string(),
                past_days,
                exclude_accounts: exclude_accounts.iter().flat_map(|a| split_csv(a)).collect(),
            };
            let sink = S3Client::from_context(&ctx);

            let report = bulk::upload_cases_across_accounts(
                &OrganizationsClient::from_context(&ctx),
                &sink,
                &config,
                Utc::now().date_naive(),
                |account_id| {
                    let ctx = &ctx;
                    let config = &config;
                    async move {
                        let member =
                            assume_role(ctx, &account_id, &config.role_name, &config.session_name)
                                .await?;
                        Ok(SupportClient::from_context(&member))
                    }
                },
            )
            .await?;

            info!(
                accounts = report.uploaded.len(),
                objects = report.total_uploaded(),
                "Bulk case upload finished"
            );
            if !report.failed.is_empty() {
                let failed: Vec<_> = report.failed.iter().map(|(a, _)| a.as_str()).collect();
                bail!(
                    "Case upload failed for {} account(s): {}",
                    failed.len(),
                    failed.join(", ")
                );
            }
        }
    }

    Ok(())
}
