//! Support insights collector Lambda
//!
//! Copies AWS Support cases, Trusted Advisor recommendations and AWS Health
//! events of the account it runs in into a central S3 bucket.

pub mod collectors;
pub mod config;
pub mod dispatch;
pub mod health;
pub mod sink;
pub mod support;

#[cfg(test)]
mod testing;

pub use collectors::{Collector, CollectorBackend, Collectors};
pub use config::CollectorConfig;
pub use dispatch::{DispatchError, HandlerResponse, dispatch};
pub use health::{HealthApi, HealthClient};
pub use sink::ObjectSink;
pub use support::{CaseQuery, SupportApi, SupportClient};

use anyhow::Context as _;
use lambda_runtime::{Error, LambdaEvent, service_fn};
use serde_json::Value;
use std::sync::Arc;
use support_insights_aws::{AwsContext, S3Client};
use support_insights_common::CheckCatalog;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

/// Collectors wired to the real AWS clients
pub type AwsCollectors = Collectors<SupportClient, HealthClient, S3Client>;

struct State {
    config: CollectorConfig,
    collectors: AwsCollectors,
}

fn load_catalog(config: &CollectorConfig) -> anyhow::Result<CheckCatalog> {
    let catalog = match &config.checks_info_path {
        Some(path) => CheckCatalog::from_file(path)?,
        None => CheckCatalog::bundled()?,
    };
    Ok(catalog)
}

/// Build the AWS clients once and serve invocations until the runtime stops
pub async fn run() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .init();

    let config = CollectorConfig::from_env();
    let ctx = AwsContext::new(None, None).await;
    let catalog = load_catalog(&config).context("Failed to load Trusted Advisor check metadata")?;
    info!(
        region = %ctx.region(),
        health_region = %config.health_region,
        checks = catalog.len(),
        "Collector initialized"
    );

    let collectors = Collectors::new(
        SupportClient::from_context(&ctx),
        HealthClient::from_context(&ctx, &config.health_region),
        S3Client::from_context(&ctx),
        catalog,
    );
    let state = Arc::new(State { config, collectors });

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let state = Arc::clone(&state);
        async move {
            let function_arn = event.context.invoked_function_arn.clone();
            let response =
                dispatch(&state.collectors, &state.config, &function_arn, event.payload).await?;
            Ok::<HandlerResponse, Error>(response)
        }
    }))
    .await
}
