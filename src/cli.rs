use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::hashing::HashAlgorithm;
use crate::piece::PiecePolicy;

#[derive(Parser, Debug)]
#[command(
    name = "metahash",
    version,
    about = "Scan files, import checksum lists and read or create .torrent metadata",
    author = "metahash contributors"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (defaults to the user config directory)
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Hash files and check them against adjacent checksum lists
    #[command(visible_alias = "verify")]
    Scan(ScanArgs),
    /// Show the contents of a .torrent file
    Inspect(InspectArgs),
    /// Create a single-file torrent
    Create(CreateArgs),
    /// Import a checksum list and print what it contains
    Sums(SumsArgs),
}

/// Verification piece sizing overrides
#[derive(Args, Debug, Clone, Default)]
pub struct PieceArgs {
    /// Upper bound on the number of verification pieces
    #[arg(long = "max-pieces", value_name = "N")]
    pub max_pieces: Option<u64>,

    /// Minimum verification piece size in KiB
    #[arg(long = "chunk-size", value_name = "KIB")]
    pub chunk_size_kib: Option<u64>,
}

impl PieceArgs {
    /// Apply the overrides on top of a configured policy
    pub fn policy(&self, base: PiecePolicy) -> PiecePolicy {
        PiecePolicy {
            max_pieces: self.max_pieces.unwrap_or(base.max_pieces),
            chunk_size_kib: self.chunk_size_kib.unwrap_or(base.chunk_size_kib),
        }
    }
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Files to scan
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Extra checksum files to import - can be specified multiple times
    #[arg(long = "hashes", value_name = "SUMFILE")]
    pub hashes: Vec<PathBuf>,

    /// Don't compute verification pieces
    #[arg(long = "no-pieces")]
    pub no_pieces: bool,

    #[command(flatten)]
    pub pieces: PieceArgs,

    /// Print results as JSON
    #[arg(long = "json")]
    pub json: bool,

    /// Number of files hashed in parallel (defaults to number of CPU cores)
    #[arg(short = 't', long = "threads", value_name = "N")]
    pub threads: Option<usize>,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// The .torrent file
    #[arg(value_name = "TORRENT")]
    pub torrent: PathBuf,

    /// Print the parsed metadata as JSON
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// The file to create a torrent for
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Announce URL(s) - each value is a tier, commas separate trackers within it
    #[arg(short = 'a', long = "announce", value_name = "URL")]
    pub announce: Vec<String>,

    /// Add a comment to the metainfo
    #[arg(short = 'c', long = "comment", value_name = "COMMENT")]
    pub comment: Option<String>,

    /// Set the output file path (defaults to <name>.torrent)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Overwrite output file if it exists
    #[arg(short = 'f', long = "force")]
    pub force: bool,

    #[command(flatten)]
    pub pieces: PieceArgs,
}

#[derive(Args, Debug)]
pub struct SumsArgs {
    /// The checksum file
    #[arg(value_name = "SUMFILE")]
    pub file: PathBuf,

    /// Treat every digest as this algorithm (md5, sha1, ed2k, ...)
    #[arg(long = "type", value_name = "ALG")]
    pub algorithm: Option<HashAlgorithm>,

    /// Only import lines for this file name
    #[arg(long = "name", value_name = "NAME")]
    pub name: Option<String>,
}
