mod config;

use anyhow::Context;
use chessdna_analysis::settings::{default_engine_path, DEFAULT_MAX_PLIES, DEFAULT_TIME_PER_MOVE};
use chessdna_analysis::{analyze_pgn_text, pgn_info, preview_games, AnalysisSettings, ClampWarnings};
use clap::{Args, Parser, Subcommand};
use config::{timeout_from_secs, ChessDnaConfig};
use std::io::Read;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Games listed by `pgninfo` in text mode.
const PREVIEW_LIMIT: usize = 200;

#[derive(Parser)]
#[command(name = "chessdna")]
#[command(version)]
#[command(about = "Centipawn loss and accuracy reports for PGN games")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze games and write a JSON report
    Analyze(AnalyzeArgs),
    /// Count games and plies in a PGN file
    Pgninfo(PgnInfoArgs),
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// PGN file, or `-` for stdin
    #[arg(long)]
    pgn: String,
    /// UCI engine binary; an empty value disables evaluation
    #[arg(long)]
    engine: Option<String>,
    /// Seconds per search (0.01 to 1.0)
    #[arg(long = "t", alias = "time-per-move")]
    time_per_move: Option<f64>,
    /// Maximum plies analyzed per game (10 to 800)
    #[arg(long)]
    max_plies: Option<i64>,
    /// Report on this player (exact White/Black tag match)
    #[arg(long)]
    player: Option<String>,
    /// Kill the engine after this many seconds without output
    #[arg(long)]
    hard_timeout: Option<f64>,
    /// Output file, or `-` for stdout
    #[arg(long, default_value = "-")]
    out: String,
}

#[derive(Args, Debug)]
struct PgnInfoArgs {
    /// PGN file, or `-` for stdin
    #[arg(long)]
    pgn: String,
    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze(args) => run_analyze(args),
        Commands::Pgninfo(args) => run_pgninfo(args),
    }
}

fn run_analyze(args: AnalyzeArgs) -> anyhow::Result<()> {
    let config = ChessDnaConfig::load().context("Failed to load chessdna.toml")?;
    let (settings, warnings) = build_settings(&args, config);
    if !warnings.is_empty() {
        warn!("{}", warnings);
    }

    let pgn = read_input(&args.pgn)?;
    info!(
        engine = settings.engine_path(),
        time_per_move = settings.time_per_move(),
        max_plies = settings.max_plies(),
        "starting analysis"
    );
    let report = analyze_pgn_text(&pgn, &settings)?;

    let json = serde_json::to_string_pretty(&report)?;
    write_output(&args.out, &json)?;
    info!(games = report.games.len(), "analysis complete");
    Ok(())
}

/// Merge flags over the config file over built-in defaults, then clamp.
fn build_settings(args: &AnalyzeArgs, config: ChessDnaConfig) -> (AnalysisSettings, ClampWarnings) {
    let requested_time = args
        .time_per_move
        .or(config.time_per_move)
        .unwrap_or(DEFAULT_TIME_PER_MOVE);
    let requested_plies = args
        .max_plies
        .or(config.max_plies)
        .unwrap_or(i64::from(DEFAULT_MAX_PLIES));
    let engine = args
        .engine
        .clone()
        .or(config.engine_path)
        .unwrap_or_else(default_engine_path);
    let player = args.player.clone().or(config.player);
    let hard_timeout = args
        .hard_timeout
        .or(config.hard_timeout_secs)
        .and_then(timeout_from_secs);

    let settings = AnalysisSettings::new(engine)
        .with_time_per_move(requested_time)
        .with_max_plies(requested_plies)
        .with_player(player.as_deref().map(str::trim))
        .with_hard_timeout(hard_timeout);
    let warnings = ClampWarnings::compare(requested_time, requested_plies, &settings);
    (settings, warnings)
}

fn run_pgninfo(args: PgnInfoArgs) -> anyhow::Result<()> {
    let pgn = read_input(&args.pgn)?;
    let summary = pgn_info(&pgn);

    if args.json {
        println!("{}", serde_json::to_string(&summary)?);
        return Ok(());
    }

    println!("games: {}", summary.games);
    if let (Some(min), Some(max), Some(avg)) =
        (summary.plies_min, summary.plies_max, summary.plies_avg)
    {
        println!("plies: min {} / max {} / avg {:.1}", min, max, avg);
    }
    for game in preview_games(&pgn, PREVIEW_LIMIT) {
        println!(
            "{:>4}  {} - {}  {}  {}  {}",
            game.index + 1,
            game.white,
            game.black,
            game.result,
            game.date,
            game.event
        );
    }
    Ok(())
}

fn read_input(source: &str) -> anyhow::Result<String> {
    if source == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read PGN from stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("Failed to read PGN file {}", source))
    }
}

fn write_output(target: &str, content: &str) -> anyhow::Result<()> {
    if target == "-" {
        println!("{}", content);
        Ok(())
    } else {
        std::fs::write(target, content)
            .with_context(|| format!("Failed to write report to {}", target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::time::Duration;

    fn analyze_args(argv: &[&str]) -> AnalyzeArgs {
        let mut full = vec!["chessdna", "analyze"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Analyze(args) => args,
            Commands::Pgninfo(_) => panic!("Expected analyze"),
        }
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_version_flag() {
        let err = Cli::try_parse_from(["chessdna", "--version"]).err().unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
        assert!(err.render().to_string().contains("chessdna 0.1.0"));
    }

    #[test]
    fn test_parse_analyze_flags() {
        let args = analyze_args(&[
            "--pgn",
            "games.pgn",
            "--engine",
            "/opt/sf",
            "--t",
            "0.3",
            "--max-plies",
            "120",
            "--player",
            "Magnus",
            "--out",
            "report.json",
        ]);

        assert_eq!(args.pgn, "games.pgn");
        assert_eq!(args.engine.as_deref(), Some("/opt/sf"));
        assert_eq!(args.time_per_move, Some(0.3));
        assert_eq!(args.max_plies, Some(120));
        assert_eq!(args.player.as_deref(), Some("Magnus"));
        assert_eq!(args.out, "report.json");
    }

    #[test]
    fn test_analyze_defaults_to_stdout() {
        let args = analyze_args(&["--pgn", "-"]);
        assert_eq!(args.out, "-");
        assert_eq!(args.engine, None);
    }

    #[test]
    fn test_analyze_requires_pgn() {
        assert!(Cli::try_parse_from(["chessdna", "analyze"]).is_err());
    }

    #[test]
    fn test_parse_pgninfo() {
        let cli = Cli::try_parse_from(["chessdna", "pgninfo", "--pgn", "t.pgn", "--json"]).unwrap();
        match cli.command {
            Commands::Pgninfo(args) => {
                assert_eq!(args.pgn, "t.pgn");
                assert!(args.json);
            }
            Commands::Analyze(_) => panic!("Expected pgninfo"),
        }
    }

    #[test]
    fn test_flags_override_config() {
        let args = analyze_args(&["--pgn", "g.pgn", "--t", "0.5", "--player", " Bob "]);
        let config = ChessDnaConfig {
            engine_path: Some("/from/config".to_string()),
            time_per_move: Some(0.1),
            max_plies: Some(50),
            player: Some("Alice".to_string()),
            hard_timeout_secs: Some(10.0),
        };

        let (settings, warnings) = build_settings(&args, config);
        assert_eq!(settings.engine_path(), "/from/config");
        assert_eq!(settings.time_per_move(), 0.5);
        assert_eq!(settings.max_plies(), 50);
        assert_eq!(settings.player_name(), Some("Bob"));
        assert_eq!(settings.hard_timeout(), Some(Duration::from_secs(10)));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_out_of_range_flags_are_clamped_with_warnings() {
        let args = analyze_args(&["--pgn", "g.pgn", "--t", "999", "--max-plies", "999999"]);
        let (settings, warnings) = build_settings(&args, ChessDnaConfig::default());

        assert_eq!(settings.time_per_move(), 1.0);
        assert_eq!(settings.max_plies(), 800);
        assert_eq!(warnings.time_per_move, Some((999.0, 1.0)));
        assert_eq!(warnings.max_plies, Some((999_999, 800)));
    }

    #[test]
    fn test_empty_engine_flag_is_kept() {
        let args = analyze_args(&["--pgn", "g.pgn", "--engine", ""]);
        let (settings, _) = build_settings(&args, ChessDnaConfig::default());
        assert_eq!(settings.engine_path(), "");
    }

    #[test]
    fn test_blank_player_means_none() {
        let args = analyze_args(&["--pgn", "g.pgn", "--player", "   "]);
        let (settings, _) = build_settings(&args, ChessDnaConfig::default());
        assert_eq!(settings.player_name(), None);
    }

    #[test]
    fn test_write_and_read_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let path = path.to_str().unwrap();

        write_output(path, "{}").unwrap();
        assert_eq!(read_input(path).unwrap(), "{}");
        assert!(read_input("/no/such/file.pgn").is_err());
    }
}
