use std::{io::Write, path::PathBuf, str::FromStr};

use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand};
use pathgrid::Cell;

mod commands;
mod overlay;

/// Find shortest paths through mazes drawn in images
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the passability grid of an image
    Rasterize(InputArgs),
    /// Find the shortest path between two cells of an image
    Solve(SolveArgs),
}

#[derive(Args, Debug)]
pub(crate) struct InputArgs {
    /// Image file, or raw RGB/RGBA bytes with --raw
    pub image: PathBuf,

    /// Read the input as raw pixels of the given size
    #[arg(long, value_name = "WxH")]
    pub raw: Option<RawSize>,

    /// Gray level at or below which a pixel is a wall [default: 128]
    #[arg(short, long)]
    pub threshold: Option<u8>,

    /// JSON settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct SolveArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Start cell
    #[arg(long, value_name = "X,Y")]
    pub start: CellArg,

    /// End cell
    #[arg(long, value_name = "X,Y")]
    pub end: CellArg,

    /// Write a PNG of the input with the path drawn on it
    #[arg(long, value_name = "FILE")]
    pub overlay: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct RawSize {
    pub width: u32,
    pub height: u32,
}

impl FromStr for RawSize {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (width, height) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| anyhow!("expected WIDTHxHEIGHT, got {s:?}"))?;
        Ok(RawSize {
            width: width.trim().parse().context("invalid width")?,
            height: height.trim().parse().context("invalid height")?,
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct CellArg(pub Cell);

impl FromStr for CellArg {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| anyhow!("expected X,Y, got {s:?}"))?;
        Ok(CellArg(Cell::new(
            x.trim().parse().context("invalid x")?,
            y.trim().parse().context("invalid y")?,
        )))
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Command::Rasterize(args) => commands::rasterize(args, &mut out)?,
        Command::Solve(args) => commands::solve(args, &mut out)?,
    }

    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod test {

    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_solve() {
        let cli = Cli::try_parse_from([
            "pathgrid", "solve", "maze.png", "--start", "1,2", "--end", "30, 4", "-t", "100",
            "--json",
        ])
        .unwrap();

        let Command::Solve(args) = cli.command else {
            panic!("expected solve");
        };
        assert_eq!(args.start, CellArg(Cell::new(1, 2)));
        assert_eq!(args.end, CellArg(Cell::new(30, 4)));
        assert_eq!(args.input.threshold, Some(100));
        assert!(args.input.json);
        assert_eq!(args.overlay, None);
    }

    #[test]
    fn test_solve_needs_endpoints() {
        assert!(Cli::try_parse_from(["pathgrid", "solve", "maze.png", "--start", "1,2"]).is_err());
    }

    #[test]
    fn test_parse_raw_size() {
        assert_eq!(
            "20x10".parse::<RawSize>().unwrap(),
            RawSize {
                width: 20,
                height: 10
            }
        );
        assert!("20".parse::<RawSize>().is_err());
        assert!("ax10".parse::<RawSize>().is_err());
    }

    #[test]
    fn test_parse_cell() {
        assert!("-1,2".parse::<CellArg>().is_err());
        assert!("1;2".parse::<CellArg>().is_err());
    }
}
