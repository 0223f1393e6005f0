#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! CLI for administering mailbox delegate access

use clap::{Parser, Subcommand};
use mailbox_delegates::{
    BatchOutcome, DelegationRequest, OperationResult, ServiceConfig, ServiceCredential,
    batch_fingerprint, parse_batch, run_batch,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "delegates-cli")]
#[command(
    about = "Administer mailbox delegate access via service-account impersonation"
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// List the delegates of a mailbox
    List {
        /// Mailbox owner email
        mailbox: String,
    },

    /// Grant a delegate access to a mailbox
    Add {
        /// Mailbox owner email
        mailbox: String,

        /// Delegate email to grant access to
        delegate: String,
    },

    /// Revoke a delegate's access to a mailbox
    Remove {
        /// Mailbox owner email
        mailbox: String,

        /// Delegate email to revoke
        delegate: String,

        /// Confirm the removal
        #[arg(long)]
        yes: bool,
    },

    /// Execute a batch file of delegation requests
    Apply {
        /// Batch file: one `kind,mailboxOwner,delegateEmail` per line
        file: PathBuf,

        /// Confirmation token printed by a previous submission
        #[arg(long)]
        confirm: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = ServiceConfig::from_env()?;

    let (requests, confirmed) = match &args.command {
        Command::List { mailbox } => (vec![DelegationRequest::list(mailbox)], false),
        Command::Add { mailbox, delegate } => {
            (vec![DelegationRequest::add(mailbox, delegate)], false)
        }
        Command::Remove {
            mailbox,
            delegate,
            yes,
        } => (vec![DelegationRequest::remove(mailbox, delegate)], *yes),
        Command::Apply { file, confirm } => {
            let text = std::fs::read_to_string(file)?;
            let requests = parse_batch(&text)?;
            let confirmed = confirm
                .as_deref()
                .is_some_and(|token| confirmation_matches(token, &requests));
            (requests, confirmed)
        }
    };

    let credential = load_credential(&config)?;

    match run_batch(&config, credential, &requests, confirmed).await {
        BatchOutcome::AwaitingConfirmation(pending) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&pending)?);
            } else {
                println!(
                    "{} removal(s) pending confirmation; no changes made.",
                    pending.removals
                );
                println!(
                    "Re-run with --confirm {} to execute (or --yes for a single remove).",
                    pending.fingerprint
                );
            }
        }
        BatchOutcome::Completed(results) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                print_result_table(&results);
            }

            let failures = results.iter().filter(|r| !r.success).count();
            if failures > 0 {
                anyhow::bail!("{failures} operation(s) failed");
            }
        }
    }

    Ok(())
}

/// A confirmation token is only honored if it matches the batch as
/// parsed now; an edited batch re-enters the confirmation step.
fn confirmation_matches(token: &str, requests: &[DelegationRequest]) -> bool {
    if token == batch_fingerprint(requests) {
        true
    } else {
        eprintln!("Confirmation token does not match this batch (was it edited?); holding again.");
        false
    }
}

fn load_credential(config: &ServiceConfig) -> anyhow::Result<ServiceCredential> {
    let json = std::fs::read_to_string(&config.key_file)?;
    Ok(ServiceCredential::from_json_key(&json)?)
}

fn print_result_table(results: &[OperationResult]) {
    if results.is_empty() {
        println!("Empty batch.");
        return;
    }

    let header = format!(
        "{:<4} {:<7} {:<30} {:<30} {:<6} {}",
        "#", "KIND", "MAILBOX", "DELEGATE", "RESULT", "MESSAGE"
    );
    println!("{header}");
    println!("{}", "-".repeat(100));

    for (idx, result) in results.iter().enumerate() {
        println!(
            "{:<4} {:<7} {:<30} {:<30} {:<6} {}",
            idx + 1,
            result.request.kind.as_str(),
            truncate(&result.request.mailbox_owner, 28),
            truncate(result.request.delegate.as_deref().unwrap_or("-"), 28),
            if result.success { "ok" } else { "FAIL" },
            result.message,
        );

        if let Some(delegates) = &result.delegates {
            for delegate in delegates {
                println!(
                    "     - {} ({})",
                    delegate.delegate_email,
                    delegate
                        .verification_status
                        .map_or("unverified", |s| s.as_str()),
                );
            }
        }
    }

    let failures = results.iter().filter(|r| !r.success).count();
    println!(
        "\n{} request(s), {} failed",
        results.len(),
        failures
    );
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String =
            s.chars().take(max.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}
