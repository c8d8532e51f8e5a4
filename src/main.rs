use anyhow::{Context, Result, bail};
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::fs;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use metahash::cli::{Cli, Command, CreateArgs, SumsArgs};
use metahash::config::Config;
use metahash::{
    ContentScanner, HashAlgorithm, HashRegistry, TorrentBuilder, TorrentFile, TorrentSpec,
    Trackers, write_torrent,
};

mod inspect;
mod verify;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Scan(args) => verify::verify_files(args, &config),
        Command::Inspect(args) => inspect::inspect_torrent(args),
        Command::Create(args) => create_torrent(args, &config),
        Command::Sums(args) => print_sums(args),
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("metahash=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("metahash=warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// A percent-based progress bar for one file scan
pub(crate) fn progress_bar(message: String) -> Result<ProgressBar> {
    let pb = ProgressBar::new(100);
    pb.set_draw_target(ProgressDrawTarget::stderr_with_hz(10));
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] {bar:40.202/94} {pos:>3}% {msg}",
        )?
        .progress_chars("█▓▒░"),
    );
    pb.set_message(message);
    Ok(pb)
}

fn create_torrent(args: CreateArgs, config: &Config) -> Result<()> {
    let policy = args.pieces.policy(config.scan);
    let name = args
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .with_context(|| format!("Not a file name: {}", args.file.display()))?;
    let size = fs::metadata(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?
        .len();
    if size == 0 {
        bail!("Cannot create a torrent for an empty file");
    }

    let pb = progress_bar(format!("Hashing {}", name))?;
    let mut hashes = HashRegistry::for_file(&name);
    hashes
        .scan_file(&args.file, ContentScanner::new(policy), |percent| {
            pb.set_position(percent as u64);
            ControlFlow::Continue(())
        })
        .with_context(|| format!("Failed to hash {}", args.file.display()))?;
    pb.finish_and_clear();

    // Below two verification pieces the whole file is a single piece
    let (piece_length, pieces) = if hashes.pieces().is_empty() {
        let sha1 = hashes.get(&HashAlgorithm::Sha1).map(str::to_string);
        (
            size.next_power_of_two().max(hashes.piece_length()),
            sha1.into_iter().collect(),
        )
    } else {
        (hashes.piece_length(), hashes.pieces().to_vec())
    };

    let announce = if args.announce.is_empty() {
        &config.torrent.trackers
    } else {
        &args.announce
    };
    let spec = TorrentSpec {
        files: vec![TorrentFile::new(name.clone(), size)],
        piece_length: i64::try_from(piece_length).context("Piece length out of range")?,
        pieces,
        trackers: Trackers::from_tier_strings(announce),
        comment: args.comment.or_else(|| config.torrent.comment.clone()),
        created_by: config
            .torrent
            .created_by
            .clone()
            .or_else(|| Some(format!("metahash {}", env!("CARGO_PKG_VERSION")))),
    };

    let created = TorrentBuilder::new(spec).build()?;

    let output_path = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("{}.torrent", name)));
    let written = write_torrent(&output_path, &created.bytes, args.force || config.overwrite)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    println!("Created: {}", written.display());
    println!(
        "{:<15} {}",
        style("Info Hash:").bold(),
        style(&created.info_hash).cyan()
    );
    Ok(())
}

fn print_sums(args: SumsArgs) -> Result<()> {
    let text = read_sum_file(&args.file)?;
    let mut hashes = HashRegistry::new();
    let count = hashes.parse_sum_file(&text, args.algorithm.as_ref(), args.name.as_deref());

    for warning in hashes.take_warnings() {
        eprintln!("{} {}", style("Warning:").yellow().bold(), warning);
    }

    let files: Vec<String> = hashes.files().map(str::to_string).collect();
    for file in &files {
        println!("{}", style(file).bold());
        for (alg, hex) in hashes.file_hashes(file) {
            println!("  {:<8} {}", alg, hex);
        }
    }
    println!("Imported {} hash(es) for {} file(s)", count, files.len());
    Ok(())
}

/// Read a checksum list, tolerating non-UTF-8 file names
pub(crate) fn read_sum_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read checksum file: {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
