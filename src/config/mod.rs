pub mod toml_config;

use crate::domain::model::Encoding;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use chrono::Datelike;
use std::time::Duration;
use toml_config::TomlConfig;

pub const DEFAULT_API_ENDPOINT: &str = "http://localhost:5000";
pub const DEFAULT_OUTPUT_PATH: &str = "./output";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_FORMATS: [Encoding; 2] = [Encoding::Csv, Encoding::Xlsx];

#[cfg(feature = "cli")]
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "santa-etl")]
#[command(about = "Validate an employee roster, request Secret Santa assignments and export them")]
pub struct CliConfig {
    /// Employee roster to upload (.csv or .xlsx)
    #[arg(long)]
    pub roster: String,

    /// Optional TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(long)]
    pub api_endpoint: Option<String>,

    #[arg(long)]
    pub output_path: Option<String>,

    /// Export formats, comma separated (csv, xlsx)
    #[arg(long, value_delimiter = ',')]
    pub formats: Option<Vec<Encoding>>,

    /// Assignment year; defaults to the current calendar year
    #[arg(long)]
    pub year: Option<i32>,

    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    /// Validate the roster only, without calling the assignment service
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

/// Effective settings after merging CLI flags over the TOML file over defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub roster_file: String,
    pub api_endpoint: String,
    pub output_path: String,
    pub formats: Vec<Encoding>,
    pub year: i32,
    pub timeout_seconds: u64,
}

pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

impl Settings {
    pub fn new(roster_file: impl Into<String>) -> Self {
        Self {
            roster_file: roster_file.into(),
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            formats: DEFAULT_FORMATS.to_vec(),
            year: current_year(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }

    /// Apply values from a TOML file on top of the defaults.
    pub fn with_toml(mut self, toml: &TomlConfig) -> Self {
        if let Some(endpoint) = toml.endpoint() {
            self.api_endpoint = endpoint.to_string();
        }
        if let Some(timeout) = toml.timeout_seconds() {
            self.timeout_seconds = timeout;
        }
        if let Some(output_path) = toml.output_path() {
            self.output_path = output_path.to_string();
        }
        if let Some(formats) = toml.formats() {
            self.formats = formats.to_vec();
        }
        if let Some(year) = toml.year() {
            self.year = year;
        }
        self
    }

    #[cfg(feature = "cli")]
    pub fn resolve(cli: &CliConfig, toml: Option<&TomlConfig>) -> Self {
        let mut settings = Settings::new(cli.roster.clone());
        if let Some(toml) = toml {
            settings = settings.with_toml(toml);
        }

        if let Some(endpoint) = &cli.api_endpoint {
            settings.api_endpoint = endpoint.clone();
        }
        if let Some(output_path) = &cli.output_path {
            settings.output_path = output_path.clone();
        }
        if let Some(formats) = &cli.formats {
            settings.formats = formats.clone();
        }
        if let Some(year) = cli.year {
            settings.year = year;
        }
        if let Some(timeout) = cli.timeout_seconds {
            settings.timeout_seconds = timeout;
        }
        settings
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validation::validate_file_extension("roster", &self.roster_file, &["csv", "xlsx"])?;
        validation::validate_url("api_endpoint", &self.api_endpoint)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_non_empty("formats", &self.formats)?;
        validation::validate_positive_number("timeout_seconds", self.timeout_seconds, 1)?;
        Ok(())
    }
}

impl ConfigProvider for Settings {
    fn api_endpoint(&self) -> &str {
        &self.api_endpoint
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn roster_file(&self) -> &str {
        &self.roster_file
    }

    fn export_formats(&self) -> &[Encoding] {
        &self.formats
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    fn year(&self) -> i32 {
        self.year
    }
}
