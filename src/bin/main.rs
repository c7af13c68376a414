use clap::Parser;
use std::path::PathBuf;
use tracing::{error, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "eoka-catalog")]
#[command(about = "Extract a record catalog from an infinite-scroll grid")]
#[command(version)]
struct Cli {
    /// Config file to run
    config: PathBuf,

    /// Run in headless mode (overrides config)
    #[arg(long)]
    headless: bool,

    /// Set a parameter (can be used multiple times)
    #[arg(short = 'P', long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,

    /// Output file (overrides config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Maximum number of records (overrides config)
    #[arg(long)]
    max: Option<usize>,

    /// Verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Validate config without running
    #[arg(long)]
    check: bool,

    /// Quiet mode (only errors)
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    if let Err(e) = run(cli).await {
        error!("{}", e);
        eprintln!("✗ Failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> eoka_catalog::Result<()> {
    let params = eoka_catalog::Params::from_args(&cli.params)?;
    let mut config = eoka_catalog::Config::load_with_params(&cli.config, &params)?;

    if let Some(output) = cli.output {
        config.output.path = output;
    }
    if let Some(max) = cli.max {
        if max == 0 {
            return Err(eoka_catalog::Error::Config(
                "--max must be at least 1".into(),
            ));
        }
        config.extract.max_records = max;
    }
    if cli.headless {
        config.browser.headless = true;
    }

    if cli.check {
        println!("Config valid: {}", config.name);
        println!("  Target: {}", config.target.url);
        println!("  Login: {}", config.login_url());
        println!("  Steps: {}", config.steps.join(" → "));
        println!("  Max records: {}", config.extract.max_records);
        println!("  Session: {}", config.session.path.display());
        println!("  Output: {}", config.output.path.display());
        if !config.params.is_empty() {
            println!("  Parameters: {}", config.params.len());
            for (name, def) in &config.params {
                let req = if def.required { " (required)" } else { "" };
                let desc = def.description.as_deref().unwrap_or("");
                println!("    - {}{}: {}", name, req, desc);
            }
        }
        return Ok(());
    }

    println!("Running: {}", config.name);

    let runner = eoka_catalog::Runner::new(&config.browser).await?;
    let result = runner.run(&config).await;
    if let Err(e) = runner.close().await {
        warn!("Failed to close browser: {}", e);
    }
    let report = result?;

    println!();
    println!("✓ Success");
    println!("  Records: {}", report.records);
    println!("  Stopped: {:?}", report.stop_reason);
    println!("  Scrolls: {}", report.scrolls);
    println!(
        "  Session: {}",
        if report.session_restored {
            "restored"
        } else {
            "new"
        }
    );
    println!("  Output: {}", report.output_path.display());
    println!("  Duration: {}ms", report.duration_ms);

    Ok(())
}
