use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use log::{error, info};

use bulkshare::client::types::Offering;
use bulkshare::lookup::{format_capital, CapitalLookup};
use bulkshare::offerings::{format_offering, OfferingService};
use bulkshare::orchestrator::ProgressReporter;
use bulkshare::{
    accounts, config, report, Account, ApplicationRecord, BulkOrchestrator, MeroshareClient,
    Result, RunReport, Settings,
};

/// Prints per-account progress as results arrive.
struct ConsoleProgress;

impl ProgressReporter for ConsoleProgress {
    fn completed(&self, index: usize, total: usize, record: &ApplicationRecord) {
        let marker = if record.is_successful() { "ok" } else { "FAILED" };
        println!(
            "[{:2}/{}] {}: {}{}",
            index,
            total,
            record.user_name,
            marker,
            if record.error_message.is_empty() {
                String::new()
            } else {
                format!(" ({})", record.error_message)
            }
        );
    }

    fn retrying(&self, record: &ApplicationRecord, max_attempts: u32) {
        println!(
            "Retrying {} (attempt {}/{})",
            record.user_name,
            record.attempts + 1,
            max_attempts
        );
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    info!(
        "Starting {} v{}",
        config::APP_NAME,
        env!("CARGO_PKG_VERSION")
    );

    if let Err(e) = run() {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[tokio::main]
async fn run() -> Result<()> {
    let settings = Settings::from_env()?;

    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("lookup") {
        let term = args[2..].join(" ");
        return run_lookup(&settings, &term);
    }

    run_bulk_application(&settings).await
}

/// Capital name/code/id lookup mode (`bulkshare lookup <term>`).
fn run_lookup(settings: &Settings, term: &str) -> Result<()> {
    if term.trim().is_empty() {
        eprintln!("Usage: bulkshare lookup <capital name or code>");
        return Ok(());
    }

    let lookup = CapitalLookup::load(&settings.capitals_file)?;
    let results = lookup.search(term);

    if results.is_empty() {
        println!("No capitals found matching '{}'.", term);
        return Ok(());
    }

    println!("Found {} matching capital(s):", results.len());
    for (i, capital) in results.iter().take(10).enumerate() {
        println!("{:2}. {}", i + 1, format_capital(capital));
    }
    if results.len() > 10 {
        println!("... and {} more. Try a more specific term.", results.len() - 10);
    }
    Ok(())
}

async fn run_bulk_application(settings: &Settings) -> Result<()> {
    println!("Loading accounts from {}...", settings.accounts_file.display());
    let accounts = accounts::load_accounts(&settings.accounts_file)?;
    if accounts.is_empty() {
        eprintln!("No accounts loaded. Please check the accounts file.");
        return Ok(());
    }
    println!("{}", accounts::account_summary(&accounts));

    let api = Arc::new(MeroshareClient::new(settings)?);

    println!("Fetching available IPOs...");
    let offering_service = OfferingService::new(api.clone());
    let offerings = offering_service.available_offerings(&accounts[0]).await;
    if offerings.is_empty() {
        eprintln!("No IPOs available for application.");
        return Ok(());
    }

    println!("\nAvailable IPOs ({} found):", offerings.len());
    for (i, offering) in offerings.iter().enumerate() {
        println!("{:2}. {}", i + 1, format_offering(offering));
    }

    let Some(offering) = select_offering(&offerings) else {
        eprintln!("Invalid selection.");
        return Ok(());
    };
    println!("Selected: {}", offering.company_name);

    let Some(kitta) = prompt_kitta(&offering_service, offering) else {
        println!("Operation cancelled.");
        return Ok(());
    };

    println!(
        "\nReady to apply for {} across {} account(s) ({} kitta each).",
        offering.company_name,
        accounts.len(),
        kitta
    );
    if !confirm("Proceed with bulk application? (y/N): ") {
        println!("Operation cancelled.");
        return Ok(());
    }

    let orchestrator = BulkOrchestrator::new(api, settings);
    let mut result = orchestrator
        .run(&accounts, offering.company_share_id, kitta, &ConsoleProgress)
        .await?;

    display_results(&result);
    report::save_snapshot(&result, &settings.results_file)?;

    if result.failed() > 0 {
        let prompt = format!("Retry {} failed application(s)? (y/N): ", result.failed());
        if confirm(&prompt) {
            println!(
                "Waiting {}s before retry...",
                settings.auto_retry_delay.as_secs()
            );
            tokio::time::sleep(settings.auto_retry_delay).await;

            let accounts_by_id: HashMap<u32, Account> = accounts
                .iter()
                .map(|a| (a.client_id, a.clone()))
                .collect();
            let retried = orchestrator
                .retry_failed(&mut result, &accounts_by_id, &ConsoleProgress)
                .await;
            println!("Retried {} application(s).", retried);

            display_results(&result);
            report::save_snapshot(&result, &settings.results_file)?;
        }
    }

    println!("Bulk IPO application completed.");
    Ok(())
}

fn select_offering(offerings: &[Offering]) -> Option<&Offering> {
    let input = prompt(&format!("Select IPO (1-{}): ", offerings.len()))?;
    let choice: usize = input.trim().parse().ok()?;
    offerings.get(choice.checked_sub(1)?)
}

fn prompt_kitta(service: &OfferingService, offering: &Offering) -> Option<u32> {
    loop {
        let input = prompt("Enter number of kittas to apply: ")?;
        match input.trim().parse::<u32>() {
            Ok(kitta) if kitta > 0 && service.validate_kitta(offering, kitta) => {
                return Some(kitta)
            }
            Ok(_) => eprintln!("Kitta amount outside the offering's limits, try again."),
            Err(_) => eprintln!("Please enter a valid number."),
        }
    }
}

fn confirm(message: &str) -> bool {
    prompt(message)
        .map(|answer| answer.trim().eq_ignore_ascii_case("y"))
        .unwrap_or(false)
}

/// Reads one line from stdin; `None` on EOF or an I/O error.
fn prompt(message: &str) -> Option<String> {
    print!("{}", message);
    std::io::stdout().flush().ok()?;
    let mut input = String::new();
    let read = std::io::stdin().read_line(&mut input).ok()?;
    (read > 0).then_some(input)
}

fn display_results(result: &RunReport) {
    let stats = result.statistics();

    println!("\nApplication Results Summary");
    println!("{}", "=".repeat(60));
    println!("Total Accounts: {}", stats.total_accounts);
    println!("Successful:     {}", stats.successful);
    println!("Failed:         {}", stats.failed);
    println!("Success Rate:   {}%", stats.success_rate);
    println!("Duration:       {}s", stats.duration_seconds);

    if stats.failed > 0 {
        println!("\nError Summary:");
        for (error_type, count) in &stats.error_summary {
            println!("  - {}: {}", error_type, count);
        }
    }
}
