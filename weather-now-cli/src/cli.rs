use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use inquire::{Confirm, CustomType, Select};
use weather_now_core::{
    Config, Controller, Coordinates, TemperatureUnit, services_from_config, weather_panel,
};

use crate::interactive;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-now", version, about = "Check current weather anywhere")]
pub struct Cli {
    /// Log debug output to stderr (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Args)]
pub struct UnitArg {
    /// Temperature unit: celsius (c) or fahrenheit (f). Defaults to the configured unit.
    #[arg(long)]
    pub unit: Option<TemperatureUnit>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the default unit and the position used by "use my location".
    Configure,

    /// Show weather for a city.
    Show {
        /// City name to search for.
        city: String,

        /// Which suggestion to use (1-based); prompts when omitted and several match.
        #[arg(long)]
        pick: Option<usize>,

        #[command(flatten)]
        unit: UnitArg,
    },

    /// Show weather for the current position.
    Here {
        /// Latitude; overrides the configured home position.
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude; overrides the configured home position.
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        #[command(flatten)]
        unit: UnitArg,
    },

    /// Search-as-you-type widget in the terminal (default).
    Interactive {
        #[command(flatten)]
        unit: UnitArg,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let command = self.command.unwrap_or(Command::Interactive {
            unit: UnitArg { unit: None },
        });

        tracing::debug!(?command, "dispatching command");
        match command {
            Command::Configure => configure(),
            Command::Show { city, pick, unit } => {
                let config = Config::load()?;
                let controller = controller_for(&config, None, unit);
                show(controller, &city, pick).await
            }
            Command::Here { lat, lon, unit } => {
                let config = Config::load()?;
                let position = lat.zip(lon).map(|(lat, lon)| Coordinates::new(lat, lon));
                let controller = controller_for(&config, position, unit);
                here(controller).await
            }
            Command::Interactive { unit } => {
                let config = Config::load()?;
                interactive::run(controller_for(&config, None, unit)).await
            }
        }
    }
}

fn controller_for(config: &Config, position: Option<Coordinates>, unit: UnitArg) -> Controller {
    let unit = unit.unit.unwrap_or_else(|| config.default_unit());
    Controller::new(services_from_config(config, position), unit)
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let unit = Select::new("Default temperature unit:", TemperatureUnit::all().to_vec())
        .with_starting_cursor(if config.default_unit() == TemperatureUnit::Fahrenheit {
            1
        } else {
            0
        })
        .prompt()
        .context("Failed to read temperature unit")?;
    config.set_unit(unit);

    let set_home = Confirm::new("Set a position for \"use my location\"?")
        .with_default(config.home.is_some())
        .prompt()
        .context("Failed to read answer")?;

    if set_home {
        let latitude = CustomType::<f64>::new("Latitude:")
            .with_error_message("Please type a number, e.g. 48.85")
            .prompt()
            .context("Failed to read latitude")?;
        let longitude = CustomType::<f64>::new("Longitude:")
            .with_error_message("Please type a number, e.g. 2.35")
            .prompt()
            .context("Failed to read longitude")?;
        config.set_home(Coordinates::new(latitude, longitude));
    } else {
        config.clear_home();
    }

    config.save()?;
    println!("Saved {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(mut controller: Controller, city: &str, pick: Option<usize>) -> anyhow::Result<()> {
    controller.set_query(city);
    controller.settle().await;

    let labels = weather_now_core::view::suggestion_labels(controller.state());
    if labels.is_empty() {
        bail!("No places found for '{city}'.");
    }

    let index = match pick {
        Some(0) => bail!("--pick is 1-based."),
        Some(n) if n > labels.len() => {
            bail!("--pick {n} is out of range: only {} place(s) found.", labels.len())
        }
        Some(n) => n - 1,
        None if labels.len() == 1 => 0,
        None => {
            Select::new("Which place?", labels)
                .raw_prompt()
                .context("Failed to read place selection")?
                .index
        }
    };

    choose_place(&mut controller, index)?;
    controller.settle().await;

    print_weather(&controller)
}

fn choose_place(controller: &mut Controller, index: usize) -> anyhow::Result<()> {
    if !controller.select_suggestion(index) {
        bail!("Place {} is no longer available.", index + 1);
    }
    Ok(())
}

async fn here(mut controller: Controller) -> anyhow::Result<()> {
    controller.use_my_location();
    controller.settle().await;

    if !controller.state().query().is_empty() {
        println!("{}", controller.state().query());
    }
    print_weather(&controller)
}

fn print_weather(controller: &Controller) -> anyhow::Result<()> {
    let state = controller.state();
    if let Some(message) = state.weather_request().error() {
        bail!("{message}");
    }
    println!("{}", weather_panel(state));
    Ok(())
}
