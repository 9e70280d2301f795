mod browser;
mod config;
mod error;
mod models;
mod pipeline;
mod report;
mod scraper;
mod utils;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::browser::webdriver::WebDriverBrowser;
use crate::config::{AppConfig, Credentials};
use crate::models::DateWindow;
use crate::pipeline::Pipeline;
use crate::report::{report_file_name, ReportFormat, ReportWriter};
use crate::scraper::http_client::HttpClient;
use crate::scraper::page::{self, FieldSpec, SelectorScraper};

#[derive(Parser)]
#[command(name = "sharp-signals", about = "MLB sharp report signal scraper", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and export the sharp report signals for a date window (default)
    Signals(SignalsArgs),

    /// Fetch one page over plain HTTP and save selected fields as JSON
    Fetch {
        url: String,

        /// CSS selector for one record
        #[arg(long)]
        item: String,

        /// name=css or name=css@attr, repeatable
        #[arg(long = "field")]
        fields: Vec<FieldSpec>,

        #[arg(short, long, default_value = "scraped_data.json")]
        output: String,
    },
}

#[derive(Args, Default)]
struct SignalsArgs {
    /// First date, YYYY-MM-DD (default: run.start_date)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last date, YYYY-MM-DD (default: run.end_date, else today)
    #[arg(long)]
    end: Option<NaiveDate>,

    #[arg(long, value_enum)]
    format: Option<ReportFormat>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "sharp_signals=info,warn",
        1 => "sharp_signals=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load()?;

    match cli.command.unwrap_or_else(|| Command::Signals(SignalsArgs::default())) {
        Command::Signals(args) => signals(&config, args).await?,
        Command::Fetch { url, item, fields, output } => {
            let _t = utils::Timer::start(format!("fetch {}", url));
            let client = HttpClient::new(&config.http)?;
            let scraper = SelectorScraper::new(&url, &item, fields)?;
            let path = page::run(&scraper, &client, &config.http.output_dir, &output).await?;
            println!("Saved to {}", path.display());
        }
    }

    Ok(())
}

async fn signals(config: &AppConfig, args: SignalsArgs) -> Result<()> {
    let credentials = Credentials::from_env()?;
    let start = args.start.unwrap_or(config.run.start_date);
    let end = args
        .end
        .or(config.run.end_date)
        .unwrap_or_else(|| Local::now().date_naive());
    let window = DateWindow::new(start, end)?;
    let format = args.format.unwrap_or(config.run.format);

    let _t = utils::Timer::start("sharp report scrape");
    let browser = WebDriverBrowser::connect(&config.browser)
        .await
        .with_context(|| format!("No WebDriver at {}", config.browser.webdriver_url))?;

    let (result, stats) = Pipeline::new(&browser, config, &credentials)
        .run(&window)
        .await?;

    let file_name = report_file_name(&config.run.file_prefix, &window, format);
    let path = ReportWriter::new(format, &config.run.output_dir).write(&result, &file_name)?;

    info!(
        "{} games over {} dates ({} skipped)",
        stats.games, stats.dates_processed, stats.dates_skipped
    );
    println!("Saved {} rows to {}", result.len(), path.display());
    Ok(())
}
