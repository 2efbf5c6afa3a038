use anyhow::Result;
use clap::{Parser, Subcommand};
use pfrscraper::{
    fetch::{Fantasy, Player},
    FieldParser, Registry, StatsTable,
};
use reqwest::Client;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about = "Scrape Pro Football Reference stat tables as JSON")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Season fantasy rankings
    Fantasy {
        /// e.g. 2023
        season: String,

        /// Split the player column into id, sort key and name
        #[arg(long)]
        player_ids: bool,
    },
    /// A player's game log; the career log when no season is given
    Gamelog {
        /// Site player id, e.g. AlleJo02
        player_id: String,

        season: Option<String>,

        /// Read the playoffs table instead of the regular season
        #[arg(long)]
        playoffs: bool,

        #[arg(long)]
        player_ids: bool,
    },
}

impl Command {
    /// Page-specific bindings layered over the defaults.
    fn overrides(&self) -> Option<Registry> {
        let (Command::Fantasy { player_ids, .. } | Command::Gamelog { player_ids, .. }) = self;
        player_ids.then(|| Registry::new().with("player", FieldParser::player()))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging (stderr, stdout carries the JSON) ──────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    // ─── 2) arguments; unknown flags exit with usage ────────────────
    let cli = Cli::parse();
    let overrides = cli.command.overrides();

    // ─── 3) fetch + parse ───────────────────────────────────────────
    let client = Client::new();
    let table = match &cli.command {
        Command::Fantasy { season, .. } => {
            Fantasy::new(season.as_str())
                .rankings(&client, overrides.as_ref())
                .await?
        }
        Command::Gamelog {
            player_id,
            season,
            playoffs,
            ..
        } => {
            let player = Player::new(player_id.as_str(), player_id.as_str());
            let season = season.as_deref();
            if *playoffs {
                player
                    .playoffs_gamelog(&client, season, overrides.as_ref())
                    .await?
            } else {
                player
                    .regular_season_gamelog(&client, season, overrides.as_ref())
                    .await?
            }
        }
    };

    report(&table)
}

fn report(table: &StatsTable) -> Result<()> {
    info!(rows = table.len(), columns = table.width(), "parsed");
    println!("{}", serde_json::to_string_pretty(&table.records()?)?);
    Ok(())
}
