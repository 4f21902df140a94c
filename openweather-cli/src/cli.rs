use anyhow::{Context, anyhow};
use chrono::{DateTime, FixedOffset, Utc};
use clap::{Parser, Subcommand};
use openweather_core::{
    Config, ErrorKind, FetchOutcome, LocationQuery, QueryVariant, RequestOrchestrator,
    WeatherModel, project,
};
use tracing::{debug, info};

/// Shown when every retry failed.
const SERVERS_DOWN: &str = "Try again later. Our servers are down.";

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "openweather", version, about = "Current weather from OpenWeather")]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key in the config file.
    Configure {
        /// API key; prompted for when omitted.
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Show current weather for a location.
    Show {
        /// City name.
        city: String,

        /// State code (requires --country).
        #[arg(long, requires = "country")]
        state: Option<String>,

        /// Country code, e.g. "GB".
        #[arg(long)]
        country: Option<String>,

        /// Query template: city, city-country or city-state-country.
        /// Inferred from the given segments when absent.
        #[arg(long, value_parser = parse_variant)]
        variant: Option<QueryVariant>,

        /// Retry a failed lookup up to this many times.
        #[arg(long, default_value_t = 0)]
        retries: u32,

        /// Print the decoded response as JSON instead of a summary.
        #[arg(long)]
        json: bool,
    },
}

fn parse_variant(value: &str) -> Result<QueryVariant, String> {
    QueryVariant::try_from(value).map_err(|e| e.to_string())
}

impl Cli {
    /// Default log filter for the requested verbosity.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { api_key } => configure(api_key),
            Command::Show {
                city,
                state,
                country,
                variant,
                retries,
                json,
            } => {
                let query = LocationQuery::new(city, state, country)?;
                let variant = variant.unwrap_or_else(|| query.variant());
                show(query, variant, retries, json).await
            }
        }
    }
}

fn configure(api_key: Option<String>) -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let api_key = match api_key {
        Some(key) => key,
        None => inquire::Password::new("OpenWeather API key:")
            .without_confirmation()
            .with_display_mode(inquire::PasswordDisplayMode::Masked)
            .prompt()
            .context("Failed to read API key")?,
    };

    let api_key = api_key.trim().to_string();
    if api_key.is_empty() {
        return Err(anyhow!("API key must not be empty"));
    }

    cfg.set_api_key(api_key);
    let path = cfg.save()?;
    println!("Saved API key to {}", path.display());

    Ok(())
}

async fn show(
    query: LocationQuery,
    variant: QueryVariant,
    retries: u32,
    json: bool,
) -> anyhow::Result<()> {
    let cfg = Config::load()?;
    let orch = cfg.orchestrator()?;
    let label = query.to_string();

    let (outcome, retried) = fetch_with_retries(&orch, variant, query, retries).await;

    debug!(variant = ?orch.current_variant(), retried, "lookup finished");

    match outcome {
        FetchOutcome::Success(model) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&model)?);
            } else {
                print!("{}", render(&model));
            }
            Ok(())
        }
        FetchOutcome::Failure(kind) => Err(anyhow!(
            "Could not get weather for '{label}' ({variant} query): {}",
            failure_hint(kind, retried)
        )),
    }
}

/// Issues the lookup, then repeats it up to `retries` times while it keeps
/// failing. Invalid queries are never retried. Returns the final outcome and
/// how many retries were made.
async fn fetch_with_retries(
    orch: &RequestOrchestrator,
    variant: QueryVariant,
    query: LocationQuery,
    retries: u32,
) -> (FetchOutcome, u32) {
    let mut outcome = orch.get_data(variant, query).await;
    let mut retried = 0;

    while let FetchOutcome::Failure(kind) = outcome {
        if kind == ErrorKind::InvalidQuery || retried >= retries {
            break;
        }
        retried += 1;
        info!(attempt = retried, of = retries, "retrying after {kind}");
        outcome = orch.retry().await;
    }

    (outcome, retried)
}

fn failure_hint(kind: ErrorKind, retried: u32) -> &'static str {
    match kind {
        ErrorKind::InvalidQuery => "enter all required location fields and try again",
        _ if retried > 0 => SERVERS_DOWN,
        ErrorKind::NetworkFailure => {
            "the weather service could not be reached or rejected the request (try --retries)"
        }
        ErrorKind::DecodeFailure => "the weather service returned an unreadable response",
    }
}

/// Projection lines followed by whatever extra details the response carries.
fn render(model: &WeatherModel) -> String {
    let mut out = project(model).to_string();

    if let Some(main) = &model.main {
        if let Some(h) = main.humidity {
            out.push_str(&format!("Humidity: {h}%\n"));
        }
        if let Some(p) = main.pressure {
            out.push_str(&format!("Pressure: {p} hPa\n"));
        }
    }

    if let Some(speed) = model.wind.as_ref().and_then(|w| w.speed) {
        match model.wind.as_ref().and_then(|w| w.deg) {
            Some(deg) => out.push_str(&format!("Wind: {speed} m/s at {deg}°\n")),
            None => out.push_str(&format!("Wind: {speed} m/s\n")),
        }
    }

    let offset = model.timezone.and_then(|tz| i32::try_from(tz).ok());
    if let Some(sunrise) = model.sunrise_at() {
        out.push_str(&format!("Sunrise: {}\n", local_time(sunrise, offset)));
    }
    if let Some(sunset) = model.sunset_at() {
        out.push_str(&format!("Sunset: {}\n", local_time(sunset, offset)));
    }

    out
}

fn local_time(at: DateTime<Utc>, offset_secs: Option<i32>) -> String {
    match offset_secs.and_then(FixedOffset::east_opt) {
        Some(offset) => at.with_timezone(&offset).format("%H:%M").to_string(),
        None => at.format("%H:%M UTC").to_string(),
    }
}
