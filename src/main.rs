use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use log::{info, warn};

use eve_scraper::Scraper;
use eve_scraper::config::{
    Credentials, DEFAULT_MAX_LOOKBACK, DEFAULT_START_YEAR, PASSWORD_VAR, PeriodSelection,
    ProjectConfig, ScraperConfig, USERNAME_VAR, load_static_metadata,
};

/// Publish FAO EVE flood-event data as a global and per-country dataset.
///
/// Credentials can be passed as flags or through DIEM_USERNAME and
/// DIEM_PASSWORD, optionally set in a local .env file.
#[derive(Parser, Debug)]
#[command(name = "eve-scraper")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Project configuration YAML
    #[arg(long, default_value = "config/project_configuration.yaml")]
    config: PathBuf,

    /// Static dataset metadata YAML merged into the manifest
    #[arg(long, default_value = "config/hdx_dataset_static.yaml")]
    static_config: PathBuf,

    /// Directory for the CSV files and manifest
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Period to publish: "latest", "all" or a period number
    #[arg(long, default_value = "latest")]
    period: PeriodSelection,

    /// First year of period numbering
    #[arg(long, default_value_t = DEFAULT_START_YEAR)]
    start_year: i32,

    /// How many periods back to look for data
    #[arg(long, default_value_t = DEFAULT_MAX_LOOKBACK)]
    max_lookback: u32,

    /// Only write resources for the first N countries
    #[arg(long)]
    max_groups: Option<usize>,

    /// Save fetched data to the saved-data directory
    #[arg(long)]
    save: bool,

    /// Use saved data instead of querying the service
    #[arg(long)]
    use_saved: bool,

    /// Saved-data directory
    #[arg(long, default_value = "saved_data")]
    saved_dir: PathBuf,

    /// Prefix CSV files with a UTF-8 byte-order mark
    #[arg(long)]
    bom: bool,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,

    /// DIEM portal user name
    #[arg(long, env = USERNAME_VAR)]
    username: Option<String>,

    /// DIEM portal password
    #[arg(long, env = PASSWORD_VAR, hide_env_values = true)]
    password: Option<String>,
}

impl Cli {
    fn scraper_config(&self) -> ScraperConfig {
        ScraperConfig {
            period: self.period,
            start_year: self.start_year,
            max_lookback: self.max_lookback,
            max_groups: self.max_groups,
            output_dir: self.output.clone(),
            write_bom: self.bom,
            http_timeout: Duration::from_secs(self.timeout_secs),
            saved_dir: self.saved_dir.clone(),
            save: self.save,
            use_saved: self.use_saved,
        }
    }

    fn credentials(&self) -> eve_scraper::Result<Credentials> {
        Credentials::from_lookup(|name| match name {
            USERNAME_VAR => self.username.clone(),
            PASSWORD_VAR => self.password.clone(),
            _ => None,
        })
    }
}

fn main() -> anyhow::Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Local runs keep credentials in .env; CI provides them directly
    if std::env::var_os("GITHUB_ACTIONS").is_none()
        && let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        warn!("Could not load .env file: {e}");
    }

    let cli = Cli::parse();

    let project = ProjectConfig::load(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    let static_metadata = load_static_metadata(&cli.static_config)
        .with_context(|| format!("Failed to load {}", cli.static_config.display()))?;
    let scraper = Scraper::new(project, static_metadata, cli.scraper_config());

    let credentials = if cli.use_saved {
        None
    } else {
        Some(cli.credentials().context("DIEM credentials are required")?)
    };

    let source = scraper
        .open_source(credentials.as_ref())
        .context("Failed to open feature source")?;
    let today = chrono::Utc::now().date_naive();
    let summary = scraper.run(&source, today).context("Scraper run failed")?;

    info!("Run completed");
    eprintln!();
    eprintln!("Dataset:    {}", summary.dataset.name);
    match summary.period {
        Some(period) => eprintln!("Period:     {period}"),
        None => eprintln!("Period:     all"),
    }
    eprintln!("Time span:  {}", summary.dataset.time_period);
    eprintln!("Records:    {}", summary.records);
    eprintln!("Countries:  {}", summary.countries);
    eprintln!("Resources:  {}", summary.resources);
    eprintln!("Manifest:   {}", summary.manifest.display());

    Ok(())
}
