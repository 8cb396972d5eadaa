use anyhow::Context;
use fileshare_diff::config::{AccountCredentials, CrawlConfig, Target};
use fileshare_diff::crawl::{CrawlResult, TreeEnumerator};
use fileshare_diff::diff::{DiffEngine, DiffResult};
use fileshare_diff::listing::ShareClient;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout carries only the report
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fileshare_diff=info")),
        )
        .init();
    fileshare_diff::metrics::init_metrics();

    let config = CrawlConfig::from_env().context("Invalid crawl configuration")?;
    let source = AccountCredentials::from_env(Target::Source)
        .context("Invalid source share configuration")?;
    let destination = AccountCredentials::from_env(Target::Destination)
        .context("Invalid destination share configuration")?;

    let source_result = crawl(Target::Source, source, &config).await?;
    let dest_result = crawl(Target::Destination, destination, &config).await?;

    let diff = DiffEngine::diff(&source_result, &dest_result);
    print_report(&diff);

    Ok(())
}

async fn crawl(
    target: Target,
    credentials: AccountCredentials,
    config: &CrawlConfig,
) -> anyhow::Result<CrawlResult> {
    let share = credentials.share_name.clone();
    let client = ShareClient::new(credentials, config.clone())
        .with_context(|| format!("Cannot set up {} share {}", target, share))?;

    let result = TreeEnumerator::new(client, config.clone())
        .enumerate()
        .await
        .with_context(|| format!("Crawling {} share {} failed", target, share))?;

    println!(
        "fetch from {}  consumes {:.3}s",
        result.share,
        result.elapsed.as_secs_f64()
    );
    Ok(result)
}

fn print_report(diff: &DiffResult) {
    println!("incremental files nums needed to add:{}", diff.to_add.len());
    println!("incremental files nums needed to delete:{}", diff.to_remove.len());

    println!("\nto add:");
    for path in diff.sorted_additions() {
        println!("  {}", path);
    }
    println!("\nto delete:");
    for path in diff.sorted_removals() {
        println!("  {}", path);
    }
}
