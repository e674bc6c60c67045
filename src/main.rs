use clap::Parser;
use sitewatch::cli::{BaselineArgs, Cli, Command};
use sitewatch::config::{Config, ConfigFile};
use sitewatch::cycle;
use sitewatch::logging::{self, Format};
use sitewatch::notify::{CommandNotifier, Notifier, StdoutNotifier};
use sitewatch::snapshot::{format_timestamp, Snapshot};
use sitewatch::store::StateStore;
use tracing::error;

fn print_baseline(store: &StateStore, snapshot: &Snapshot, full: bool) {
    println!("State file: {}", store.path().display());
    println!("Captured:   {}", format_timestamp(snapshot.timestamp));
    println!("Files:      {}", snapshot.files.len());
    println!("Tables:     {} ({} rows)", snapshot.tables.len(), snapshot.row_count());

    if !snapshot.tables.is_empty() {
        println!();
        println!("{:<30} {:<20} {:>10}", "Table", "Primary key", "Rows");
        println!("{}", "-".repeat(62));
        for table in snapshot.tables.values() {
            println!(
                "{:<30} {:<20} {:>10}",
                table.table_name,
                table.primary_key_column,
                table.rows.len()
            );
        }
    }

    if full && !snapshot.files.is_empty() {
        println!();
        for entry in snapshot.files.values() {
            println!("{}  {}", entry.short_hash(), entry.path);
        }
    }
}

fn baseline(cli_config: Option<&std::path::Path>, args: &BaselineArgs) {
    let file = ConfigFile::load(cli_config).unwrap_or_else(|e| {
        error!("{e}");
        std::process::exit(2);
    });

    let store = StateStore::new(file.state_file(args.state_file.as_deref()));

    match store.peek() {
        Ok(Some(snapshot)) => print_baseline(&store, &snapshot, args.full),
        Ok(None) => {
            println!("No baseline at {}. Run 'sitewatch scan' to create one.", store.path().display());
        }
        Err(e) => {
            eprintln!("Error reading baseline: {e}");
            std::process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let format = if cli.json_logs { Format::Json } else { Format::Pretty };
    logging::init(format, cli.verbose);

    match cli.command {
        Command::Scan(args) => {
            let config = ConfigFile::load(cli.config.as_deref())
                .and_then(|file| Config::from_scan_args(file, &args))
                .unwrap_or_else(|e| {
                    error!("{e}");
                    std::process::exit(2);
                });

            let notifier: Box<dyn Notifier> = match &config.mail {
                Some(mail) if !config.dry_run => Box::new(CommandNotifier::new(mail.clone())),
                _ => Box::new(StdoutNotifier),
            };

            let store = StateStore::new(&config.state_file);

            if cycle::run(&config, &store, notifier.as_ref()).is_err() {
                std::process::exit(1);
            }
        }
        Command::Baseline(args) => baseline(cli.config.as_deref(), &args),
    }
}
