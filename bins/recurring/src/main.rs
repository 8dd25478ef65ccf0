//! Recurring entry runner.
//!
//! Fires every due recurring journal entry for every company, then exits.
//! Meant to be scheduled once a day.
//!
//! Usage:
//!   tally-recurring [YYYY-MM-DD]
//!
//! The date defaults to today in UTC.

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use tally_core::recurring::ProcessDueReport;
use tally_db::{CompanyRepository, RecurringRepository, connect_with};
use tally_shared::AppConfig;
use tally_shared::config::LogConfig;
use tally_shared::types::CompanyId;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.log);

    let today = match std::env::args().nth(1) {
        Some(arg) => NaiveDate::parse_from_str(&arg, "%Y-%m-%d")
            .with_context(|| format!("Invalid run date {arg:?}, expected YYYY-MM-DD"))?,
        None => Utc::now().date_naive(),
    };

    let db = connect_with(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database");

    let companies = CompanyRepository::new(db.clone())
        .list_ids()
        .await
        .context("Failed to list companies")?;
    let repo = RecurringRepository::new(db);

    let results: Vec<(CompanyId, ProcessDueReport)> = stream::iter(companies)
        .map(|company_id| {
            let repo = repo.clone();
            async move {
                match repo.process_due(company_id, today).await {
                    Ok(report) => Some((company_id, report)),
                    Err(err) => {
                        error!(company_id = %company_id, error = %err, "Recurring run failed");
                        None
                    }
                }
            }
        })
        .buffer_unordered(config.scheduler.max_concurrent_companies.max(1))
        .filter_map(|result| async move { result })
        .collect()
        .await;

    let created: usize = results.iter().map(|(_, r)| r.created_count()).sum();
    let failures: usize = results.iter().map(|(_, r)| r.failures.len()).sum();
    let skipped: usize = results.iter().map(|(_, r)| r.skipped_lines.len()).sum();
    info!(
        %today,
        companies = results.len(),
        created,
        skipped_lines = skipped,
        failures,
        "Recurring run finished"
    );

    Ok(())
}

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let registry = tracing_subscriber::registry().with(filter);
    if log.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
