use anyhow::{Context, Result, anyhow};
use console::{Emoji, style};
use indicatif::{HumanBytes, MultiProgress, ProgressBar};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use metahash::cli::ScanArgs;
use metahash::config::Config;
use metahash::piece::PiecePolicy;
use metahash::sumfile::{discover_sum_files, is_sum_file};
use metahash::{ContentScanner, HashAlgorithm, HashRegistry, ed2k_link, magnet_links};

use crate::{progress_bar, read_sum_file};

static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "OK ");
static ERROR: Emoji<'_, '_> = Emoji("❌ ", "ERR ");
static WARN: Emoji<'_, '_> = Emoji("⚠️ ", "WARN ");

/// A digest from a checksum file compared against the scanned one
#[derive(Debug, Serialize)]
struct Check {
    algorithm: HashAlgorithm,
    source: PathBuf,
    expected: String,
    ok: bool,
}

#[derive(Debug, Serialize)]
struct FileReport {
    file: PathBuf,
    size: u64,
    hashes: BTreeMap<HashAlgorithm, String>,
    piece_length: u64,
    pieces: Vec<String>,
    checks: Vec<Check>,
    links: Vec<String>,
    warnings: Vec<String>,
}

impl FileReport {
    fn ok(&self) -> bool {
        self.checks.iter().all(|c| c.ok)
    }
}

/// Scan every file, compare against adjacent and explicitly given checksum
/// lists, and print the results.
pub fn verify_files(args: ScanArgs, config: &Config) -> Result<()> {
    let policy = args.pieces.policy(config.scan);
    let threads = args.threads.unwrap_or_else(num_cpus::get);

    let mut extra = Vec::new();
    for path in &args.hashes {
        extra.push((path.clone(), read_sum_file(path)?));
    }

    let (skipped, files): (Vec<&PathBuf>, Vec<&PathBuf>) =
        args.files.iter().partition(|path| is_sum_file(path));
    for path in skipped {
        eprintln!(
            "{} {}",
            WARN,
            style(format!(
                "Skipping checksum list {} (pass it with --hashes to compare against it)",
                path.display()
            ))
            .yellow()
        );
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .context("Failed to create thread pool")?;

    let multi = MultiProgress::new();
    let show_progress = !args.json;
    let use_pieces = !args.no_pieces;

    let results: Vec<(PathBuf, Result<FileReport>)> = pool.install(|| {
        files
            .par_iter()
            .map(|path| {
                let report = verify_file(path, &extra, policy, use_pieces, show_progress, &multi);
                (path.to_path_buf(), report)
            })
            .collect()
    });

    let mut reports = Vec::new();
    let mut failed = 0;
    for (path, result) in results {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => {
                failed += 1;
                eprintln!("{} {}: {:#}", ERROR, path.display(), e);
            }
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_report(report);
        }
    }

    let mismatched = reports.iter().filter(|r| !r.ok()).count();
    if failed > 0 || mismatched > 0 {
        if !args.json {
            println!(
                "\n{} {}",
                ERROR,
                style("Verification Failed!").red().bold()
            );
        }
        return Err(anyhow!(
            "{} file(s) could not be read, {} file(s) did not match",
            failed,
            mismatched
        ));
    }
    Ok(())
}

fn verify_file(
    path: &Path,
    extra: &[(PathBuf, String)],
    policy: PiecePolicy,
    use_pieces: bool,
    show_progress: bool,
    multi: &MultiProgress,
) -> Result<FileReport> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .with_context(|| format!("Not a file name: {}", path.display()))?;

    let mut sources = Vec::new();
    for sum_path in discover_sum_files(path) {
        let text = read_sum_file(&sum_path)?;
        sources.push((sum_path, text));
    }
    sources.extend(extra.iter().cloned());

    let pb = if show_progress {
        multi.add(progress_bar(name.clone())?)
    } else {
        ProgressBar::hidden()
    };
    let mut scanned = HashRegistry::for_file(&name);
    scanned
        .scan_file(
            path,
            ContentScanner::new(policy).with_pieces(use_pieces),
            |percent| {
                pb.set_position(percent as u64);
                ControlFlow::Continue(())
            },
        )
        .with_context(|| format!("Failed to hash {}", path.display()))?;
    pb.finish_and_clear();

    let mut checks = Vec::new();
    let mut warnings = Vec::new();
    for (source, text) in &sources {
        let mut expected = HashRegistry::for_file(&name);
        expected.parse_sum_file(text, None, Some(name.as_str()));
        warnings.extend(
            expected
                .take_warnings()
                .into_iter()
                .map(|w| format!("{}: {}", source.display(), w)),
        );

        for (algorithm, hex) in expected.get_all() {
            if let Some(actual) = scanned.get(&algorithm) {
                checks.push(Check {
                    ok: actual.eq_ignore_ascii_case(&hex),
                    algorithm,
                    source: source.clone(),
                    expected: hex,
                });
            }
        }
        // Values the scan cannot produce (aich, btih, ...) are kept as-is
        scanned.merge(&expected, false);
    }

    let size = std::fs::metadata(path)?.len();
    let mut links: Vec<String> = ed2k_link(&name, size, &scanned).into_iter().collect();
    links.extend(magnet_links(&name, size, &scanned));

    Ok(FileReport {
        file: path.to_path_buf(),
        size,
        hashes: scanned.get_all(),
        piece_length: scanned.piece_length(),
        pieces: scanned.pieces().to_vec(),
        checks,
        links,
        warnings,
    })
}

fn print_report(report: &FileReport) {
    println!(
        "\n{} {}",
        style(report.file.display()).bold().cyan(),
        style(HumanBytes(report.size)).dim()
    );
    for (alg, hex) in &report.hashes {
        println!("  {:<8} {}", style(alg).bold(), hex);
    }
    if report.pieces.is_empty() {
        println!("  {:<8} {}", style("pieces").bold(), style("none").dim());
    } else {
        println!(
            "  {:<8} {} x {}",
            style("pieces").bold(),
            report.pieces.len(),
            HumanBytes(report.piece_length)
        );
    }

    for check in &report.checks {
        let (mark, verdict) = if check.ok {
            (SUCCESS, style("OK").green())
        } else {
            (ERROR, style("MISMATCH").red().bold())
        };
        println!(
            "  {}{} {} ({})",
            mark,
            check.algorithm,
            verdict,
            check.source.display()
        );
    }
    for warning in &report.warnings {
        println!("  {}{}", WARN, style(warning).yellow());
    }
    for link in &report.links {
        println!("  {}", style(link).underlined());
    }
}
