// gaffer entry point.
//
// Startup sequence:
// 1. Parse arguments
// 2. Initialize tracing (stderr, so stdout carries only the report)
// 3. Load config (copying defaults on first run)
// 4. Load and normalize the player pool
// 5. Run the requested operation and print its report

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;

use gaffer_core::config::{self, Config};
use gaffer_core::player::pool::{self, NormalizedPool};
use gaffer_core::player::Player;
use gaffer_core::selection::{select_best_xi, Squad, SquadStatus};
use gaffer_core::simulation::{
    CaptaincyRanker, CaptaincyReport, RunLimits, UncertaintyEstimator, VarianceProfile,
};

#[derive(Parser)]
#[command(name = "gaffer")]
#[command(about = "Fantasy football lineup, captaincy and uncertainty engine", long_about = None)]
struct Cli {
    /// Directory holding config/ and defaults/
    #[arg(long, global = true, default_value = ".")]
    base_dir: PathBuf,

    /// Emit JSON instead of a text report
    #[arg(long, global = true)]
    json: bool,

    /// Abort sampling after this many milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pick the best legal starting XI
    BestXi {
        /// Player pool (CSV, or JSON by extension)
        #[arg(long)]
        players: PathBuf,
    },

    /// Rank captaincy candidates by simulated captain points
    Captain {
        /// Player pool (CSV, or JSON by extension)
        #[arg(long)]
        players: PathBuf,

        /// Candidate ids, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<String>,

        /// Samples per candidate (default from simulation.toml)
        #[arg(long)]
        sims: Option<usize>,

        /// Seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Floor / median / ceiling for one player
    Uncertainty {
        /// Player pool (CSV, or JSON by extension)
        #[arg(long)]
        players: PathBuf,

        /// Player id
        #[arg(long)]
        id: String,

        /// Samples (default from simulation.toml)
        #[arg(long)]
        sims: Option<usize>,

        /// Seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing()?;

    let config = config::load_config_in(&cli.base_dir).context("failed to load configuration")?;
    info!(
        "Config loaded: budget {:.1}, {} per team, squad of {}",
        config.capacity.budget_cap,
        config.capacity.max_per_team,
        config.capacity.target_size()
    );

    let limits = match cli.timeout_ms {
        Some(ms) => RunLimits::unbounded().with_timeout(Duration::from_millis(ms)),
        None => RunLimits::unbounded(),
    };

    match cli.command {
        Commands::BestXi { players } => {
            let pool = load_players(&players)?;
            let squad = select_best_xi(&pool.players, &config.capacity);
            if cli.json {
                print_json(&json!({
                    "squad": squad,
                    "formation": squad.formation(),
                    "total_predicted_score": squad.total_predicted_score(),
                    "remaining_budget": squad.remaining_budget(),
                }))?;
            } else {
                print_squad(&squad);
            }
        }

        Commands::Captain {
            players,
            ids,
            sims,
            seed,
        } => {
            let pool = load_players(&players)?;
            let candidates = pick_players(&pool, &ids)?;
            let n = sims.unwrap_or(config.simulation.samples.captaincy);
            let reports = CaptaincyRanker::new(&config.simulation)
                .with_limits(limits)
                .compare_captains(&candidates, n, seed)
                .context("captaincy comparison failed")?;
            if cli.json {
                print_json(&reports)?;
            } else {
                print_captaincy(&reports, &config);
            }
        }

        Commands::Uncertainty {
            players,
            id,
            sims,
            seed,
        } => {
            let pool = load_players(&players)?;
            let player = pool
                .find(&id)
                .with_context(|| format!("player {id} not found in {}", players.display()))?;
            let n = sims.unwrap_or(config.simulation.samples.uncertainty);
            let band = UncertaintyEstimator::new(config.simulation.uncertainty)
                .with_limits(limits)
                .estimate_uncertainty(player, n, seed)
                .context("uncertainty estimate failed")?;
            let profile = VarianceProfile::classify(player.position, &band);
            if cli.json {
                print_json(&json!({
                    "player": player,
                    "band": band,
                    "profile": profile,
                    "description": profile.description(),
                }))?;
            } else {
                println!("{} ({}, {})", player.name, player.position, player.team);
                println!("  Predicted: {:>6.2}", player.predicted_score);
                println!("  Floor:     {:>6.2}  (p10)", band.p10);
                println!("  Median:    {:>6.2}  (p50)", band.p50);
                println!("  Ceiling:   {:>6.2}  (p90)", band.p90);
                println!("  Spread:    {:>6.2}", profile.spread);
                println!("  {}", profile.description());
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load_players(path: &Path) -> anyhow::Result<NormalizedPool> {
    pool::load_pool(path)
        .with_context(|| format!("failed to load player pool from {}", path.display()))
}

fn pick_players(pool: &NormalizedPool, ids: &[String]) -> anyhow::Result<Vec<Player>> {
    let mut picked = Vec::with_capacity(ids.len());
    for id in ids {
        let id = id.trim();
        match pool.find(id) {
            Some(player) => picked.push(player.clone()),
            None => bail!("player {id} not found in pool"),
        }
    }
    Ok(picked)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to serialize report")?;
    println!("{out}");
    Ok(())
}

fn print_squad(squad: &Squad) {
    println!("Best XI ({})", squad.formation());
    for (position, players) in squad.by_position() {
        println!();
        println!("{}", position.group_label());
        for p in players {
            println!(
                "  {:<24} {:<5} {:>5.1}  {:>6.2}",
                p.name, p.team, p.cost, p.predicted_score
            );
        }
    }
    println!();
    println!(
        "Players: {}/{}  Cost: {:.1}  Remaining: {:.1}  Predicted: {:.2}",
        squad.len(),
        squad.target_size(),
        squad.total_cost(),
        squad.remaining_budget(),
        squad.total_predicted_score()
    );
    match squad.status() {
        SquadStatus::Complete => println!("Status: complete"),
        SquadStatus::Incomplete { missing, unfilled } => {
            println!("Status: incomplete ({missing} slots empty)");
            for q in unfilled {
                println!("  {}: {}/{}", q.position, q.selected, q.required);
            }
        }
    }
}

fn print_captaincy(reports: &[CaptaincyReport], config: &Config) {
    let thresholds = &config.simulation.thresholds;
    println!(
        "{:<4} {:<24} {:<4} {:>6} {:>6} {:>8} {:>7} {:>7}",
        "#",
        "Player",
        "Pos",
        "Pred",
        "Stdev",
        "Capt",
        format!("P>={}", thresholds.haul),
        format!("P<={}", thresholds.blank),
    );
    for (rank, r) in reports.iter().enumerate() {
        println!(
            "{:<4} {:<24} {:<4} {:>6.2} {:>6.2} {:>8.2} {:>6.1}% {:>6.1}%",
            rank + 1,
            r.name,
            r.position.display_str(),
            r.predicted_score,
            r.simulation.stdev,
            r.simulation.expected_captain_points,
            r.simulation.haul_probability * 100.0,
            r.simulation.blank_probability * 100.0,
        );
    }
    if let Some(best) = reports.first() {
        println!();
        println!(
            "Recommended captain: {} ({:.2} expected captain points)",
            best.name, best.simulation.expected_captain_points
        );
    }
}

/// Initialize tracing to stderr; stdout is reserved for the report.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gaffer=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
