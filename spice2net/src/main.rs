use std::path::PathBuf;

use anyhow::Context;
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use spice2net::config::{BoardProfile, UnknownPinPolicy};
use spice2net::netlist::DesignMeta;

#[derive(Parser)]
#[command(name = "spice2net")]
#[command(about = "Convert SPICE-like netlists to KiCad netlist files", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a SPICE-like netlist text
    Spice(SpiceArgs),

    /// Convert a JSON board description
    Board(BoardArgs),
}

#[derive(Args)]
struct SpiceArgs {
    /// Input netlist file
    input: PathBuf,

    /// Output file (defaults to the input with a `.net` extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    header: HeaderArgs,

    /// Append pin assignments with unknown names to the component
    /// layout instead of dropping them
    #[arg(long)]
    extend_pins: bool,
}

#[derive(Args)]
struct BoardArgs {
    /// Board description JSON file
    input: PathBuf,

    /// Companion netlist text carrying the connectivity
    #[arg(short, long)]
    netlist: Option<PathBuf>,

    /// Output file (defaults to the input with a `.net` extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    header: HeaderArgs,
}

#[derive(Args)]
struct HeaderArgs {
    /// Title block name
    #[arg(long)]
    title: Option<String>,

    /// Source schematic name shown in the netlist header
    #[arg(long)]
    sheet: Option<String>,
}

impl HeaderArgs {
    fn into_meta(self) -> DesignMeta {
        let now = Local::now();
        let mut meta = DesignMeta {
            date: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            day: now.format("%Y-%m-%d").to_string(),
            ..DesignMeta::default()
        };
        if let Some(title) = self.title {
            meta.title = title;
        }
        if let Some(sheet) = self.sheet {
            meta.source = sheet;
        }
        meta
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    match cli.command {
        Commands::Spice(args) => convert_spice(args),
        Commands::Board(args) => convert_board(args),
    }
}

fn convert_spice(args: SpiceArgs) -> anyhow::Result<()> {
    let input = std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;

    let mut profile = BoardProfile::default();
    if args.extend_pins {
        profile.unknown_pins = UnknownPinPolicy::Extend;
    }

    let netlist = spice2net::convert_spice(&input, &profile, &args.header.into_meta());

    write_output(&args.input, args.output, &netlist)
}

fn convert_board(args: BoardArgs) -> anyhow::Result<()> {
    let board_json = std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let companion = match &args.netlist {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?,
        ),
        None => None,
    };

    let profile = BoardProfile::default();
    let netlist = spice2net::convert_board(
        &board_json,
        companion.as_deref(),
        &profile,
        &args.header.into_meta(),
    )?;

    write_output(&args.input, args.output, &netlist)
}

fn write_output(
    input: &std::path::Path,
    output: Option<PathBuf>,
    netlist: &spice2net::netlist::NetlistFile,
) -> anyhow::Result<()> {
    let output = output.unwrap_or_else(|| input.with_extension("net"));
    let text = spice2net::serialize_netlist(netlist);

    std::fs::write(&output, text)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("Wrote KiCad netlist to {}", output.display());

    Ok(())
}
