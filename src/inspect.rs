use anyhow::{Context, Result};
use console::{Emoji, style};
use indicatif::HumanBytes;

use metahash::TorrentDescriptor;
use metahash::cli::InspectArgs;
use metahash::piece::calculate_num_pieces;

static INFO: Emoji<'_, '_> = Emoji("ℹ️ ", "i ");
static FILES: Emoji<'_, '_> = Emoji("📁 ", "f ");
static TRACKERS: Emoji<'_, '_> = Emoji("📡 ", "t ");
static WARN: Emoji<'_, '_> = Emoji("⚠️ ", "WARN ");

pub fn inspect_torrent(args: InspectArgs) -> Result<()> {
    let path = args.torrent;
    let torrent = TorrentDescriptor::from_file(&path)
        .with_context(|| format!("Failed to parse torrent file: {}", path.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&torrent)?);
        return Ok(());
    }

    println!("{} {}", INFO, style("Torrent Metadata:").bold());
    if let Some(file) = torrent.files.first() {
        let name = file.path.split('/').next().unwrap_or(&file.path);
        println!("{:<15} {}", style("Name:").bold(), style(name).cyan());
    }

    if let Some(comment) = &torrent.comment {
        println!("{:<15} {}", style("Comment:").bold(), comment);
    }

    if let Some(created_by) = &torrent.created_by {
        println!("{:<15} {}", style("Created By:").bold(), created_by);
    }

    if let Some(date) = torrent.creation_date {
        let datetime = chrono::DateTime::from_timestamp(date, 0)
            .map(|dt| dt.to_string())
            .unwrap_or_else(|| date.to_string());
        println!("{:<15} {}", style("Date:").bold(), datetime);
    }

    println!(
        "{:<15} {}",
        style("Total Size:").bold(),
        style(HumanBytes(torrent.total_size())).green()
    );
    println!(
        "{:<15} {}",
        style("Piece Size:").bold(),
        style(HumanBytes(torrent.piece_length)).yellow()
    );
    if torrent.piece_length > 0 {
        println!(
            "{:<15} {}",
            style("Piece Count:").bold(),
            calculate_num_pieces(torrent.total_size(), torrent.piece_length)
        );
    }
    println!("{:<15} {}", style("Info Hash:").bold(), torrent.info_hash);

    println!("\n{} {}", TRACKERS, style("Trackers:").bold());
    for tracker in torrent.trackers() {
        println!("  - {}", style(tracker).underlined());
    }

    println!("\n{} {}", FILES, style("Files:").bold());
    for (i, file) in torrent.files.iter().enumerate() {
        if i >= 20 {
            println!(
                "  ... and {} more files",
                style(torrent.files.len() - 20).dim()
            );
            break;
        }
        println!(
            "  - {:<40} {}",
            file.path,
            style(HumanBytes(file.length)).dim()
        );
    }

    for warning in &torrent.warnings {
        println!("\n{} {}", WARN, style(warning).yellow());
    }

    Ok(())
}
