//! c2m-cli - Command-line interface for the c2m crate
//!
//! Inspects, recodes and verifies C2M level files, and exposes the raw
//! map compressor.

use c2m::{
    compress_with_stats, decode_level_with, decompress, encode_level_with, Cell, DecodeOptions,
    EncodeOptions, SectionReader,
};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "c2m-cli")]
#[command(about = "A CLI tool for inspecting and rewriting C2M level files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the sections and settings of a level
    Info {
        /// Level file to analyze
        input: PathBuf,
    },

    /// Compress a file with the map packer
    Pack {
        /// Input file
        input: PathBuf,

        /// Output packed file
        output: PathBuf,

        /// Force overwrite of output file
        #[arg(short, long)]
        force: bool,
    },

    /// Decompress a packed file
    Unpack {
        /// Input packed file
        input: PathBuf,

        /// Output file
        output: PathBuf,

        /// Force overwrite of output file
        #[arg(short, long)]
        force: bool,
    },

    /// Decode a level and write it back out
    Recode {
        /// Input level
        input: PathBuf,

        /// Output level
        output: PathBuf,

        /// Write MAP/REPL instead of PACK/PRPL
        #[arg(long)]
        raw: bool,

        /// Keep sections the decoder does not model
        #[arg(long)]
        preserve_unknown: bool,

        /// Force overwrite of output file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the replay's input state for every tick
    Replay {
        /// Level file with a replay
        input: PathBuf,
    },

    /// Check that levels survive a decode/encode/decode round trip
    Verify {
        /// Level files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
}

fn init_logging(verbose: bool, quiet: bool) {
    let default = match (verbose, quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "warn",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Info { input } => show_level_info(&input, cli.verbose),
        Commands::Pack {
            input,
            output,
            force,
        } => pack_file(&input, &output, force, cli.quiet),
        Commands::Unpack {
            input,
            output,
            force,
        } => unpack_file(&input, &output, force, cli.quiet),
        Commands::Recode {
            input,
            output,
            raw,
            preserve_unknown,
            force,
        } => recode_level(&input, &output, raw, preserve_unknown, force, cli.quiet),
        Commands::Replay { input } => print_replay(&input),
        Commands::Verify { inputs } => verify_levels(&inputs, cli.quiet),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn check_paths(input: &Path, output: Option<&Path>, force: bool) -> CliResult {
    if !input.exists() {
        return Err(format!("Input file '{}' does not exist", input.display()).into());
    }
    if let Some(output) = output {
        if output.exists() && !force {
            return Err(format!(
                "Output file '{}' already exists. Use --force to overwrite",
                output.display()
            )
            .into());
        }
    }
    Ok(())
}

fn show_level_info(input: &Path, verbose: bool) -> CliResult {
    check_paths(input, None, false)?;
    let data = fs::read(input)?;

    println!("C2M File Information:");
    println!("  File: {}", input.display());
    println!("  Size: {} bytes", data.len());
    println!("  Sections:");
    for section in SectionReader::new(&data) {
        let section = section?;
        println!(
            "    {:>6}  {}  {} bytes",
            section.offset,
            section.tag,
            section.payload.len()
        );
    }

    let level = decode_level_with(&data, &DecodeOptions::lossless())?;
    println!("  Title: {}", level.title);
    if let Some(author) = &level.author {
        println!("  Author: {}", author);
    }
    if let Some(version) = &level.format_version {
        println!("  Format version: {}", version);
    }
    println!("  Size: {}x{}", level.size_x, level.size_y);
    println!("  Chips required: {}", level.chips_required);
    match level.time_limit {
        0 => println!("  Time limit: none"),
        t => println!("  Time limit: {}s", t),
    }
    println!("  Viewport: {}x{}", level.viewport_size, level.viewport_size);
    if !level.camera_regions.is_empty() {
        println!("  Camera regions: {}", level.camera_regions.len());
    }
    if !level.extra_sections.is_empty() {
        println!("  Unmodelled sections: {}", level.extra_sections.len());
    }

    match &level.replay {
        Some(replay) => {
            println!(
                "  Replay: {} ticks, force floors start {}, blob seed {}",
                replay.tick_count(),
                replay.initial_force_floor_direction.name(),
                replay.blob_seed
            );
        }
        None => println!("  Replay: none"),
    }

    if verbose {
        println!("  Hint: {:?}", level.hint);
        println!("  Comment: {:?}", level.comment);
        let tiles: usize = level.linear_cells.iter().map(Cell::len).sum();
        println!("  Tiles: {}", tiles);
    }

    Ok(())
}

fn pack_file(input: &Path, output: &Path, force: bool, quiet: bool) -> CliResult {
    check_paths(input, Some(output), force)?;

    let start_time = Instant::now();
    let data = fs::read(input)?;
    let (packed, stats) = compress_with_stats(&data)
        .ok_or("Input does not compress (too large, or packing would not save space)")?;
    fs::write(output, &packed)?;

    if !quiet {
        println!("✓ Packing successful!");
        println!("  Input:   {} bytes", stats.input_bytes);
        println!("  Output:  {} bytes", stats.output_bytes);
        println!("  Ratio:   {:.1}%", stats.ratio());
        println!(
            "  Records: {} literal, {} back-reference (longest {})",
            stats.literal_count, stats.match_count, stats.longest_match
        );
        println!("  Time:    {:.2?}", start_time.elapsed());
    }
    Ok(())
}

fn unpack_file(input: &Path, output: &Path, force: bool, quiet: bool) -> CliResult {
    check_paths(input, Some(output), force)?;

    let start_time = Instant::now();
    let data = fs::read(input)?;
    let unpacked = decompress(&data).map_err(|e| format!("Unpacking failed: {}", e))?;
    fs::write(output, &unpacked)?;

    if !quiet {
        println!("✓ Unpacking successful!");
        println!("  Input:  {} bytes", data.len());
        println!("  Output: {} bytes", unpacked.len());
        println!("  Time:   {:.2?}", start_time.elapsed());
    }
    Ok(())
}

fn recode_level(
    input: &Path,
    output: &Path,
    raw: bool,
    preserve_unknown: bool,
    force: bool,
    quiet: bool,
) -> CliResult {
    check_paths(input, Some(output), force)?;

    let decode_options = if preserve_unknown {
        DecodeOptions::lossless()
    } else {
        DecodeOptions::default()
    };
    let encode_options = if raw {
        EncodeOptions::uncompressed()
    } else {
        EncodeOptions::default()
    };

    let data = fs::read(input)?;
    let level = decode_level_with(&data, &decode_options)?;
    let encoded = encode_level_with(&level, &encode_options)?;
    fs::write(output, &encoded)?;

    if !quiet {
        println!("✓ Recoded '{}'", level.title);
        println!("  Input:  {} bytes", data.len());
        println!("  Output: {} bytes", encoded.len());
    }
    Ok(())
}

fn print_replay(input: &Path) -> CliResult {
    check_paths(input, None, false)?;
    let data = fs::read(input)?;
    let level = decode_level_with(&data, &DecodeOptions::default())?;
    let replay = level
        .replay
        .ok_or_else(|| format!("'{}' has no replay", input.display()))?;

    for (tick, input) in replay.inputs().enumerate() {
        let actions: Vec<&str> = input.actions().map(|a| a.name()).collect();
        println!("{:>6} {}", tick, actions.join(" "));
    }
    Ok(())
}

/// Decode, re-encode and decode again; the two decodes must agree
fn verify_level(path: &Path) -> CliResult {
    let data = fs::read(path)?;
    let mut level = decode_level_with(&data, &DecodeOptions::lossless())?;
    let options = EncodeOptions::default();
    let encoded = encode_level_with(&level, &options)?;
    let again = decode_level_with(&encoded, &DecodeOptions::lossless())?;

    // Files without CC2M gain the default version on the way through
    level.format_version.get_or_insert(options.format_version);
    if again != level {
        return Err("level changed after a round trip".into());
    }
    Ok(())
}

fn verify_levels(inputs: &[PathBuf], quiet: bool) -> CliResult {
    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(inputs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
                )?
                .progress_chars("#>-"),
        );
        pb
    };

    let mut failures = Vec::new();
    for path in inputs {
        progress.set_message(path.display().to_string());
        if let Err(e) = verify_level(path) {
            failures.push(format!("{}: {}", path.display(), e));
        }
        progress.inc(1);
    }
    progress.finish_with_message("done");

    if !quiet {
        println!(
            "{} of {} levels verified",
            inputs.len() - failures.len(),
            inputs.len()
        );
    }
    for failure in &failures {
        eprintln!("  ✗ {}", failure);
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(format!("{} levels failed verification", failures.len()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use c2m::{encode_level, Level, Replay, Tile};
    use tempfile::tempdir;

    #[test]
    fn test_pack_round_trip() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let input_path = dir.path().join("input.bin");
        let packed_path = dir.path().join("input.pack");
        let output_path = dir.path().join("output.bin");

        let test_data = b"abcabcabcabcabcabcabcabcabcabcabcabc".repeat(20);
        fs::write(&input_path, &test_data)?;

        pack_file(&input_path, &packed_path, false, true)?;
        unpack_file(&packed_path, &output_path, false, true)?;

        let result_data = fs::read(&output_path)?;
        assert_eq!(test_data, result_data);

        // Refuses to overwrite without --force
        assert!(pack_file(&input_path, &packed_path, false, true).is_err());
        pack_file(&input_path, &packed_path, true, true)?;
        Ok(())
    }

    #[test]
    fn test_recode_and_verify() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let input_path = dir.path().join("level.c2m");
        let output_path = dir.path().join("recoded.c2m");

        let mut level = Level::new(5, 5);
        level.title = "CLI".to_string();
        level.linear_cells[7].push(Tile::new("chip"));
        level.replay = Some(Replay::new(vec![0, 0, 0, 3, 0x10, 0xFF]));
        fs::write(&input_path, encode_level(&level)?)?;

        recode_level(&input_path, &output_path, true, true, false, true)?;
        verify_levels(&[input_path.clone(), output_path.clone()], true)?;
        print_replay(&output_path)?;
        show_level_info(&output_path, true)?;

        let garbage = dir.path().join("garbage.c2m");
        fs::write(&garbage, b"MAP \xFF\xFF\x00\x00")?;
        assert!(verify_levels(&[garbage], true).is_err());
        Ok(())
    }
}
