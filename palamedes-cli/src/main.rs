mod config;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use config::Config;
use palamedes_core::{
    align_records, build_variant_blocks, generate_seq_record, summarize, MoleculeType,
    PairwiseAligner, VariantBlock,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "palamedes")]
#[command(about = "Palamedes - extract variant blocks from a pairwise global alignment")]
#[command(version)]
struct Cli {
    /// Reference sequence
    #[arg(short, long, required_unless_present_any = ["print_config", "save_config"])]
    reference: Option<String>,

    /// Alternate sequence
    #[arg(short, long, required_unless_present_any = ["print_config", "save_config"])]
    alternate: Option<String>,

    /// Molecule type of both sequences (protein, dna, rna)
    #[arg(short, long)]
    molecule_type: Option<MoleculeType>,

    /// Configuration file (defaults to ./palamedes.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Print the alignment above the table
    #[arg(long)]
    show_alignment: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Write the effective configuration to PATH and exit
    #[arg(long, value_name = "PATH")]
    save_config: Option<PathBuf>,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only report errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn setup_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn print_table(blocks: &[VariantBlock]) {
    if blocks.is_empty() {
        println!("No variant blocks: sequences are identical");
        return;
    }

    for block in blocks {
        println!("{}", block);
    }

    let summary = summarize(blocks);
    println!(
        "{} blocks: {} mismatches, {} deletions, {} insertions",
        summary.blocks, summary.mismatches, summary.deletions, summary.insertions
    );
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(molecule_type) = cli.molecule_type {
        config.records.molecule_type = molecule_type;
    }

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }
    if let Some(path) = &cli.save_config {
        config.save_to_file(path)?;
        log::info!("Wrote configuration to {}", path.display());
        return Ok(());
    }

    let (Some(reference), Some(alternate)) = (cli.reference.as_deref(), cli.alternate.as_deref())
    else {
        anyhow::bail!("Both --reference and --alternate are required");
    };

    let aligner = PairwiseAligner::new(config.aligner.clone())
        .context("Invalid aligner configuration")?;

    let reference = generate_seq_record(
        reference,
        &config.records.reference_id,
        config.records.molecule_type,
    );
    let alternate = generate_seq_record(
        alternate,
        &config.records.alternate_id,
        config.records.molecule_type,
    );

    let alignment = align_records(&reference, &alternate, &aligner)
        .context("Failed to align reference and alternate sequences")?;
    let blocks = build_variant_blocks(&alignment);

    match cli.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&blocks)
                .context("Failed to serialize variant blocks")?;
            println!("{}", json);
        }
        OutputFormat::Table => {
            if cli.show_alignment {
                println!("{}\n", alignment.pretty());
            }
            print_table(&blocks);
        }
    }

    Ok(())
}
