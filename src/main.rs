use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tokio::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod aggregate;
mod collector;
mod config;
mod distribution;
mod fetch;
mod output;
mod pipeline;
mod rank;
mod rate_limiter;
mod riot_api;
mod sampler;
#[cfg(test)]
mod test_support;

use collector::{CollectOptions, FailurePolicy, MatchCollector, Projection};
use config::Config;
use rank::{Division, Tier};
use riot_api::{FetchTarget, LeagueEntry};
use sampler::SamplingStrategy;

#[derive(Parser, Debug)]
#[command(
    name = "riot-match-collector",
    about = "Samples ranked players and collects their recent matches from the Riot Games API",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sample players from the ladder and download their recent matches
    Collect(CollectArgs),
    /// Download recent matches of a single player by riot id
    Player(PlayerArgs),
    /// Print the PUUID of a riot id
    Puuid(RiotIdArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    AllDivisions,
    Division,
    Distribution,
}

#[derive(Args, Debug)]
struct CollectArgs {
    #[arg(long, value_enum, default_value = "division")]
    mode: Mode,

    #[arg(long, value_enum, default_value = "matches")]
    target: FetchTarget,

    /// Players per division, or the total to split in distribution mode
    count: usize,

    /// Recent matches fetched per player
    depth: usize,

    /// Output file (`.json` is appended when no extension is given)
    output: PathBuf,

    #[arg(long, value_enum, ignore_case = true, required_if_eq("mode", "division"))]
    tier: Option<Tier>,

    #[arg(long, value_enum, ignore_case = true, default_value = "I")]
    division: Division,

    /// CSV with `tier,division,percentage` rows
    #[arg(long, required_if_eq("mode", "distribution"))]
    distribution: Option<PathBuf>,

    #[command(flatten)]
    collect: CollectFlags,

    #[command(flatten)]
    limits: LimitArgs,
}

#[derive(Args, Debug)]
struct PlayerArgs {
    #[command(flatten)]
    riot_id: RiotIdArgs,

    #[arg(long, value_enum, default_value = "matches")]
    target: FetchTarget,

    depth: usize,

    output: PathBuf,

    #[command(flatten)]
    collect: CollectFlags,

    #[command(flatten)]
    limits: LimitArgs,
}

#[derive(Args, Debug)]
struct RiotIdArgs {
    /// Riot game name (e.g., Summoner name)
    #[arg(long = "game-name")]
    game_name: String,

    /// Riot tag line (e.g., region tag)
    #[arg(long = "tag-line")]
    tag_line: String,
}

#[derive(Args, Debug)]
struct CollectFlags {
    #[arg(long, value_enum, default_value = "full")]
    projection: Projection,

    #[arg(long = "failure-policy", value_enum, default_value = "discard-player")]
    failure_policy: FailurePolicy,
}

#[derive(Args, Debug)]
struct LimitArgs {
    /// Platform routing value for league endpoints
    #[arg(long, default_value = config::DEFAULT_PLATFORM)]
    platform: String,

    /// Regional routing value for account and match endpoints
    #[arg(long, default_value = config::DEFAULT_REGION)]
    region: String,

    #[arg(long = "max-req-per-sec")]
    max_req_per_sec: Option<u32>,

    #[arg(long = "max-req-per-2min")]
    max_req_per_2min: Option<u32>,

    /// Requests allowed in flight at once
    #[arg(long = "max-in-flight")]
    max_in_flight: Option<usize>,

    /// Consecutive 429 responses tolerated per request
    #[arg(long = "max-retries")]
    max_retries: Option<u32>,
}

impl LimitArgs {
    fn apply(&self, mut config: Config) -> Config {
        config.platform = self.platform.clone();
        config.region = self.region.clone();
        if let Some(v) = self.max_req_per_sec {
            config.max_reqs_per_sec = v;
        }
        if let Some(v) = self.max_req_per_2min {
            config.max_reqs_per_2min = v;
        }
        if let Some(v) = self.max_in_flight {
            config.max_in_flight = v;
        }
        if let Some(v) = self.max_retries {
            config.retry.max_retries = v;
        }
        config
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let args = Cli::parse();

    if let Err(err) = dispatch(args.command).await {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn log_limits(config: &Config) {
    let limiter = config.rate_limiter();
    info!(
        "Pacing requests {:?} apart with at most {} in flight (platform {}, region {})",
        limiter.min_interval(),
        limiter.max_in_flight(),
        config.platform,
        config.region
    );
}

async fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Collect(args) => run_collect(args).await,
        Command::Player(args) => run_player(args).await,
        Command::Puuid(args) => {
            let client = Config::from_env()?.build_client()?;
            let account = client
                .get_account_by_riot_id(&args.game_name, &args.tag_line)
                .await?;
            println!("{}", account.puuid);
            Ok(())
        }
    }
}

async fn run_collect(args: CollectArgs) -> Result<()> {
    let strategy = match args.mode {
        Mode::AllDivisions => SamplingStrategy::AllDivisions { count: args.count },
        Mode::Division => {
            let Some(tier) = args.tier else {
                bail!("--tier is required for division mode");
            };
            SamplingStrategy::Division {
                tier,
                division: args.division,
                count: args.count,
            }
        }
        Mode::Distribution => {
            let Some(path) = &args.distribution else {
                bail!("--distribution is required for distribution mode");
            };
            let entries = distribution::load_distribution(path)
                .with_context(|| format!("loading {}", path.display()))?;
            SamplingStrategy::Distribution {
                entries,
                total: args.count,
            }
        }
    };

    let config = args.limits.apply(Config::from_env()?);
    let client = config.build_client()?;
    log_limits(&config);
    let options = CollectOptions {
        depth: args.depth,
        target: args.target,
        projection: args.collect.projection,
        failure_policy: args.collect.failure_policy,
    };

    let report = pipeline::run(&client, &strategy, options).await?;
    report.log_summary();

    let written = output::write_records(&args.output, &report.records)?;
    info!("Wrote {} records to {}", report.records.len(), written.display());
    Ok(())
}

async fn run_player(args: PlayerArgs) -> Result<()> {
    let config = args.limits.apply(Config::from_env()?);
    let client = config.build_client()?;
    log_limits(&config);

    let started_at = Utc::now();
    let start = Instant::now();
    let account = client
        .get_account_by_riot_id(&args.riot_id.game_name, &args.riot_id.tag_line)
        .await?;
    info!("Resolved {}#{} to {}", args.riot_id.game_name, args.riot_id.tag_line, account.puuid);

    let options = CollectOptions {
        depth: args.depth,
        target: args.target,
        projection: args.collect.projection,
        failure_policy: args.collect.failure_policy,
    };
    let outcomes = MatchCollector::new(&client, options)
        .collect(&[LeagueEntry::from_puuid(account.puuid)])
        .await;
    let report = aggregate::flatten(outcomes, started_at, start.elapsed());
    report.log_summary();

    let written = output::write_records(&args.output, &report.records)?;
    info!("Wrote {} records to {}", report.records.len(), written.display());
    Ok(())
}
