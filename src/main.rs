mod commands;

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use wdash_core::{Config, RefreshPolicy};
use wdash_services::{
    AutoRefresh, FileStore, KeyValueStore, RefreshFuture, RefreshTask, SearchOrchestrator,
    SearchOutcome,
};
use wdash_weather::{location, LocationProvider};

use commands::{Command, HELP};

/// Look up current weather and a 5-day outlook from the terminal.
#[derive(Debug, Parser)]
#[command(name = "wdash", version, about)]
struct Cli {
    /// Path to the config file (defaults to the platform config directory)
    #[arg(long, env = "WDASH_CONFIG")]
    config: Option<PathBuf>,

    /// Search this city on start instead of resuming the last one
    #[arg(long)]
    city: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    wdash_core::init()?;
    let cli = Cli::parse();

    // Rejects invalid files and logs warnings.
    let (config, _) =
        Config::load_validated(cli.config.as_deref()).context("Failed to load configuration")?;

    let store: Arc<dyn KeyValueStore> = Arc::new(
        FileStore::open(&config.data_dir).context("Failed to open local storage")?,
    );
    let orchestrator = Arc::new(
        SearchOrchestrator::new(&config, store).context("Failed to create weather clients")?,
    );
    let location: Arc<dyn LocationProvider> = Arc::from(location::from_config(&config.location));

    let auto_refresh = AutoRefresh::new(
        Duration::from_secs(config.refresh.interval_secs),
        refresh_task(Arc::clone(&orchestrator), config.refresh.policy),
    );

    tracing::info!("wdash started");

    let shell = Shell {
        orchestrator,
        location,
        auto_refresh,
    };

    // Startup search runs inline so its result prints before the prompt.
    let startup = match cli.city {
        Some(city) => Some(shell.orchestrator.search_by_name(&city).await),
        None => shell.orchestrator.resume().await,
    };
    if let Some(outcome) = startup {
        report(&shell.orchestrator, &outcome);
    } else {
        println!("{}", shell.orchestrator.panel());
    }
    shell.auto_refresh.start();

    shell.run().await?;

    shell.auto_refresh.stop();
    tracing::info!("wdash exiting");
    Ok(())
}

struct Shell {
    orchestrator: Arc<SearchOrchestrator>,
    location: Arc<dyn LocationProvider>,
    auto_refresh: AutoRefresh,
}

impl Shell {
    async fn run(&self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        println!("Type `help` for commands.");

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line.context("Failed to read input")? else {
                        break;
                    };
                    match Command::parse(&line) {
                        Ok(Command::Quit) => break,
                        Ok(command) => self.dispatch(command),
                        Err(e) => println!("{e}"),
                    }
                }
                _ = tokio::signal::ctrl_c() => break,
            }
        }
        Ok(())
    }

    fn dispatch(&self, command: Command) {
        let orchestrator = Arc::clone(&self.orchestrator);
        match command {
            Command::Search(city) => {
                self.spawn_search(async move { orchestrator.search_by_name(&city).await })
            }
            Command::Here => {
                let location = Arc::clone(&self.location);
                self.spawn_search(async move {
                    orchestrator.search_by_geolocation(location.as_ref()).await
                })
            }
            Command::Coords { lat, lon } => self.spawn_search(async move {
                let label = format!("{lat:.4}, {lon:.4}");
                orchestrator.search_by_coordinates(lat, lon, &label).await
            }),
            Command::Refresh => self.spawn_search(async move { orchestrator.refresh().await }),
            Command::ToggleUnit => {
                let unit = orchestrator.toggle_unit();
                tracing::debug!("Unit switched to {:?}", unit);
                println!("{}", orchestrator.panel());
            }
            Command::AddFavorite => match orchestrator.add_favorite() {
                Ok(true) => println!("Favorites: {}", orchestrator.favorites_view()),
                Ok(false) => println!("Nothing new to add to favorites."),
                Err(e) => {
                    tracing::error!("Failed to save favorite: {}", e);
                    println!("{}", e.user_message());
                }
            },
            Command::RemoveFavorite(name) => match orchestrator.remove_favorite(&name) {
                Ok(()) => println!("Favorites: {}", orchestrator.favorites_view()),
                Err(e) => {
                    tracing::error!("Failed to remove favorite: {}", e);
                    println!("{}", e.user_message());
                }
            },
            Command::Favorites => println!("Favorites: {}", orchestrator.favorites_view()),
            Command::Samples => {
                orchestrator.show_samples();
                println!("{}", orchestrator.panel());
            }
            Command::Hide => {
                self.auto_refresh.set_visible(false);
                println!("Auto refresh paused.");
            }
            Command::Show => {
                self.auto_refresh.set_visible(true);
                println!("Auto refresh resumed.");
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => {}
        }
    }

    /// Run a search in the background and print its panel when it lands.
    fn spawn_search<F>(&self, search: F)
    where
        F: Future<Output = SearchOutcome> + Send + 'static,
    {
        let orchestrator = Arc::clone(&self.orchestrator);
        tokio::spawn(async move {
            let outcome = search.await;
            report(&orchestrator, &outcome);
        });
    }
}

fn refresh_task(orchestrator: Arc<SearchOrchestrator>, policy: RefreshPolicy) -> RefreshTask {
    Arc::new(move || -> RefreshFuture {
        let orchestrator = Arc::clone(&orchestrator);
        Box::pin(async move {
            let outcome = match policy {
                RefreshPolicy::PreferCoordinates => orchestrator.refresh().await,
                RefreshPolicy::LastSearchedCity => orchestrator.refresh_last_city().await,
            };
            if !matches!(outcome, SearchOutcome::NothingToRefresh) {
                report(&orchestrator, &outcome);
            }
        })
    })
}

fn report(orchestrator: &SearchOrchestrator, outcome: &SearchOutcome) {
    match outcome {
        SearchOutcome::Superseded => tracing::debug!("Search superseded; view unchanged"),
        _ => println!("{}", orchestrator.panel()),
    }
}
