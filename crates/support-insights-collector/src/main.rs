#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    support_insights_collector::run().await
}
