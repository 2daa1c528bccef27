use std::net::IpAddr;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::api;
use crate::application::{LedgerPage, LedgerService, LedgerSummary};
use crate::config::Config;
use crate::domain::{
    format_cents, parse_cents, parse_date_bound, DayBound, DocumentKind, LedgerFilter, NewEntry,
    PartyKey, PartyType,
};

/// Khata - supplier and customer ledger
#[derive(Parser)]
#[command(name = "khata")]
#[command(about = "Running-balance ledger for suppliers and customers")]
#[command(version)]
pub struct Cli {
    /// Database file path (overrides KHATA_DATABASE)
    #[arg(short, long)]
    pub database: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Record a ledger entry
    Add {
        /// Party type: supplier or customer
        #[arg(long)]
        party_type: PartyType,

        /// Party identifier
        #[arg(long)]
        party_id: String,

        /// Party display name
        #[arg(long)]
        name: String,

        /// Entry type, e.g. Sale, Purchase, Payment, Receipt
        #[arg(short = 't', long = "type")]
        kind: String,

        /// Invoice or voucher number
        #[arg(short, long)]
        reference: String,

        /// Debit amount (e.g. "50.00"), decreases the balance
        #[arg(long)]
        debit: Option<String>,

        /// Credit amount (e.g. "50.00"), increases the balance
        #[arg(long)]
        credit: Option<String>,

        /// Party mobile number
        #[arg(long)]
        mobile: Option<String>,

        /// Payment method, e.g. Cash, UPI, Cheque
        #[arg(long)]
        payment_method: Option<String>,

        /// Effective date (YYYY-MM-DD or RFC 3339, defaults to now)
        #[arg(long)]
        date: Option<String>,

        /// Due date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        due_date: Option<String>,
    },

    /// Show a supplier or customer ledger
    Ledger {
        /// Party type: supplier or customer
        party_type: PartyType,

        #[command(flatten)]
        filter: FilterArgs,

        /// Page number (1-based)
        #[arg(long)]
        page: Option<i64>,

        /// Entries per page
        #[arg(short, long)]
        limit: Option<i64>,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Show the current balance of a party
    Balance {
        /// Party type: supplier or customer
        party_type: PartyType,

        /// Party identifier
        party_id: String,
    },

    /// Allocate the next document number
    NextNumber {
        /// Document kind: purchase, return, supplier
        kind: DocumentKind,
    },

    /// Export a ledger to CSV
    Export {
        /// Party type: supplier or customer
        party_type: PartyType,

        #[command(flatten)]
        filter: FilterArgs,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Run the HTTP API
    Serve {
        /// Bind address (overrides KHATA_HTTP_HOST)
        #[arg(long)]
        host: Option<IpAddr>,

        /// Port (overrides KHATA_HTTP_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Match party name, party id or reference number (case-insensitive)
    #[arg(short, long)]
    pub search: Option<String>,

    /// Filter by entry type
    #[arg(short = 't', long = "type")]
    pub kind: Option<String>,

    /// From date (YYYY-MM-DD)
    #[arg(long)]
    pub from_date: Option<String>,

    /// To date (YYYY-MM-DD, whole day included)
    #[arg(long)]
    pub to_date: Option<String>,
}

impl FilterArgs {
    fn into_filter(self, page: Option<i64>, limit: Option<i64>) -> LedgerFilter {
        LedgerFilter {
            search: self.search,
            kind: self.kind,
            from_date: self.from_date,
            to_date: self.to_date,
            page,
            limit,
        }
    }
}

impl Cli {
    /// Log level implied by the flags.
    pub fn log_level<'a>(&self, config: &'a Config) -> &'a str {
        if self.verbose {
            "debug"
        } else {
            &config.log_level
        }
    }

    pub async fn run(self, mut config: Config) -> Result<()> {
        if let Some(database) = self.database {
            config.database = database;
        }

        match self.command {
            Commands::Init => {
                LedgerService::init(&config.database).await?;
                println!("Database initialized: {}", config.database);
            }

            Commands::Add {
                party_type,
                party_id,
                name,
                kind,
                reference,
                debit,
                credit,
                mobile,
                payment_method,
                date,
                due_date,
            } => {
                let service = connect(&config).await?;

                let mut entry = NewEntry::new(party_type, party_id, name, kind, reference);
                entry.debit = parse_amount(debit.as_deref(), "debit")?;
                entry.credit = parse_amount(credit.as_deref(), "credit")?;
                entry.mobile_number = mobile;
                entry.payment_method = payment_method;
                entry.date = parse_optional_date(date.as_deref())?;
                entry.due_date = parse_optional_date(due_date.as_deref())?;

                let recorded = service.record_entry(entry).await?;
                println!(
                    "Recorded {} {} for {} ({}): debit {} credit {}, balance {}",
                    recorded.kind,
                    recorded.reference_no,
                    recorded.party_name,
                    recorded.party_key(),
                    format_cents(recorded.debit),
                    format_cents(recorded.credit),
                    format_cents(recorded.balance)
                );
            }

            Commands::Ledger {
                party_type,
                filter,
                page,
                limit,
                format,
            } => {
                let service = connect(&config).await?;
                let filter = filter.into_filter(page, limit);

                match format.as_str() {
                    "json" => {
                        let ledger = service.query_ledger(party_type, &filter).await?;
                        let response = api::LedgerResponse::from(ledger);
                        println!("{}", serde_json::to_string_pretty(&response)?);
                    }
                    "table" => {
                        let ledger = service.query_ledger(party_type, &filter).await?;
                        print_ledger_table(party_type, &ledger);
                    }
                    // Every matching entry, pagination ignored
                    "csv" => run_export_command(&service, party_type, &filter, None).await?,
                    other => anyhow::bail!(
                        "Invalid format '{}'. Valid formats: table, json, csv",
                        other
                    ),
                }
            }

            Commands::Balance {
                party_type,
                party_id,
            } => {
                let service = connect(&config).await?;
                let party = PartyKey::new(party_type, party_id);
                let balance = service.party_balance(&party).await?;
                println!("{}: {}", party, format_cents(balance));
            }

            Commands::NextNumber { kind } => {
                let service = connect(&config).await?;
                println!("{}", service.next_document_number(kind).await?);
            }

            Commands::Export {
                party_type,
                filter,
                output,
            } => {
                let service = connect(&config).await?;
                run_export_command(
                    &service,
                    party_type,
                    &filter.into_filter(None, None),
                    output.as_deref(),
                )
                .await?;
            }

            Commands::Serve { host, port } => {
                if let Some(host) = host {
                    config.http_host = host;
                }
                if let Some(port) = port {
                    config.http_port = port;
                }
                // The server creates the schema on first start
                let service = LedgerService::init(&config.database)
                    .await?
                    .with_default_limit(config.default_page_limit);
                api::serve(service, config.http_addr()).await?;
            }
        }

        Ok(())
    }
}

async fn connect(config: &Config) -> Result<LedgerService> {
    let service = LedgerService::connect(&config.database)
        .await
        .with_context(|| {
            format!(
                "Failed to open database '{}'. Run `khata init` first",
                config.database
            )
        })?;
    Ok(service.with_default_limit(config.default_page_limit))
}

fn parse_amount(input: Option<&str>, field: &str) -> Result<Option<i64>> {
    input
        .map(|a| {
            parse_cents(a)
                .with_context(|| format!("Invalid {} amount '{}'. Use '50.00' or '50'", field, a))
        })
        .transpose()
}

fn parse_optional_date(input: Option<&str>) -> Result<Option<chrono::DateTime<chrono::Utc>>> {
    input
        .map(|d| parse_date_bound(d, DayBound::Start).context("Invalid date"))
        .transpose()
}

async fn run_export_command(
    service: &LedgerService,
    party_type: PartyType,
    filter: &LedgerFilter,
    output: Option<&str>,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{stdout, Write};

    let exporter = Exporter::new(service);

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    let count = exporter
        .export_ledger_csv(party_type, filter, writer)
        .await?;
    if output.is_some() {
        eprintln!("Exported {} {} ledger entries", count, party_type);
    }

    Ok(())
}

fn print_ledger_table(party_type: PartyType, ledger: &LedgerPage) {
    if ledger.entries.is_empty() {
        println!("No {} ledger entries found.", party_type);
    } else {
        println!(
            "{:<10} {:<12} {:<20} {:<10} {:<12} {:>12} {:>12} {:>12}",
            "DATE", "PARTY", "NAME", "TYPE", "REFERENCE", "DEBIT", "CREDIT", "BALANCE"
        );
        println!("{}", "-".repeat(106));

        for entry in &ledger.entries {
            println!(
                "{:<10} {:<12} {:<20} {:<10} {:<12} {:>12} {:>12} {:>12}",
                entry.date.format("%Y-%m-%d"),
                truncate(&entry.party_id, 12),
                truncate(&entry.party_name, 20),
                truncate(entry.kind.as_str(), 10),
                truncate(&entry.reference_no, 12),
                format_cents(entry.debit),
                format_cents(entry.credit),
                format_cents(entry.balance)
            );
        }
        println!("{}", "-".repeat(106));
    }

    println!(
        "Page {} (limit {}), {} matching entries",
        ledger.page.page, ledger.page.limit, ledger.total_count
    );
    println!("Total debit:  {}", format_cents(ledger.totals.debit));
    println!("Total credit: {}", format_cents(ledger.totals.credit));
    match ledger.summary {
        LedgerSummary::Supplier { net_balance } => {
            println!("Net balance:  {}", format_cents(net_balance));
        }
        LedgerSummary::Customer {
            customers_with_balance,
        } => {
            println!("Customers with balance: {}", customers_with_balance);
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Acme", 10), "Acme");
        assert_eq!(truncate("Acme Traders Pvt Ltd", 8), "Acme Tr…");
    }

    #[test]
    fn test_parse_ledger_command() {
        let cli = Cli::try_parse_from([
            "khata",
            "ledger",
            "customer",
            "--search",
            "acme",
            "--type",
            "Sale",
            "--to-date",
            "2024-03-15",
            "--limit",
            "50",
        ])
        .unwrap();

        match cli.command {
            Commands::Ledger {
                party_type,
                filter,
                limit,
                format,
                ..
            } => {
                assert_eq!(party_type, PartyType::Customer);
                assert_eq!(filter.search.as_deref(), Some("acme"));
                assert_eq!(filter.kind.as_deref(), Some("Sale"));
                assert_eq!(filter.to_date.as_deref(), Some("2024-03-15"));
                assert_eq!(limit, Some(50));
                assert_eq!(format, "table");
            }
            _ => panic!("expected ledger command"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_party_type() {
        assert!(Cli::try_parse_from(["khata", "balance", "vendor", "V-1"]).is_err());
    }

    #[test]
    fn test_verbose_overrides_log_level() {
        let config = Config::default();
        let cli = Cli::try_parse_from(["khata", "-v", "init"]).unwrap();
        assert_eq!(cli.log_level(&config), "debug");

        let cli = Cli::try_parse_from(["khata", "init"]).unwrap();
        assert_eq!(cli.log_level(&config), "info");
    }
}
