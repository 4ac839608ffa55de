use clap::Parser;
use number_lookup::config::LookupConfig;
use number_lookup::utils::error::ErrorCategory;
use number_lookup::utils::{logger, validation::Validate};
use number_lookup::{HttpFetcher, LookupEngine};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "lookup")]
#[command(about = "Run a single number lookup and print the JSON result")]
struct Args {
    /// Phone number to look up, any formatting
    number: String,

    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Only print the configured sources, do not fetch anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init_cli_logger(args.verbose);

    let config = match &args.config {
        Some(path) => LookupConfig::from_file(path)?,
        None => LookupConfig::default(),
    };

    if let Err(e) = config.validate() {
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let settings = config.settings();
    let engine = LookupEngine::from_config(&config, Arc::new(HttpFetcher::new(&settings)?));

    if args.dry_run {
        let number = match engine.normalize(&args.number) {
            Ok(number) => number,
            Err(e) => {
                eprintln!("❌ {}", e.user_friendly_message());
                std::process::exit(2);
            }
        };
        println!("🔍 DRY RUN for {}", number);
        for probe in engine.probes() {
            println!(
                "  {:<28} {:<15} {}",
                probe.platform,
                probe.strategy.to_string(),
                probe.render(&number)
            );
        }
        return Ok(());
    }

    match engine.lookup(&args.number).await {
        Ok(response) => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            let exit_code = match e.category() {
                ErrorCategory::Input => 2,
                _ => 1,
            };
            std::process::exit(exit_code);
        }
    }
}
