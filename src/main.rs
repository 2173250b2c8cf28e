mod tui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use volt::analytics::{ctc_summary, StatusBreakdown};
use volt::config::Config;
use volt::models::{format_ctc, parse_ctc};
use volt::{
    LocalPersistence, NewApplication, PersistError, SortOrder, SqliteStorage, Status,
    StatusFilter, Tracker, ViewQuery,
};

type LocalTracker = Tracker<LocalPersistence<SqliteStorage>>;

#[derive(Parser)]
#[command(name = "volt")]
#[command(about = "Personal job application tracker - never miss an opportunity again")]
struct Cli {
    /// Directory holding the tracker database and logs
    #[arg(long, global = true, env = "VOLT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log file level (trace, debug, info, warn, error, off)
    #[arg(long, global = true, env = "VOLT_LOG")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a job application
    Add {
        /// Job title
        title: String,

        /// Company name
        company: String,

        /// Annual CTC in lakhs
        #[arg(short, long)]
        ctc: Option<String>,

        /// Initial status (Applied, Rejected, Selected)
        #[arg(short, long, default_value = "Applied")]
        status: Status,

        /// Free-text note
        #[cfg(feature = "notes")]
        #[arg(short, long)]
        note: Option<String>,
    },

    /// List applications
    List {
        /// Match against title or company, case-insensitive
        #[arg(short = 'q', long, default_value = "")]
        search: String,

        /// Filter by status (All, Applied, Rejected, Selected)
        #[arg(short, long, default_value = "All")]
        status: StatusFilter,

        /// Order by CTC (asc, desc)
        #[arg(short = 'o', long, default_value = "asc")]
        sort: SortOrder,
    },

    /// Show one application
    Show {
        /// Application ID
        id: i64,
    },

    /// Change an application's status
    Status {
        /// Application ID
        id: i64,

        /// New status (Applied, Rejected, Selected)
        status: Status,
    },

    /// Set or clear an application's note
    #[cfg(feature = "notes")]
    Note {
        /// Application ID
        id: i64,

        /// Note text; omit to clear the note
        text: Option<String>,
    },

    /// Delete an application
    Delete {
        /// Application ID
        id: i64,
    },

    /// Show status distribution and compensation statistics
    Stats,

    /// Manage the attached resume
    #[cfg(feature = "resume")]
    Resume {
        #[command(subcommand)]
        command: ResumeCommands,
    },

    /// Write all applications to a JSON file
    Export {
        /// Output file (default: volt-export-<timestamp>.json)
        path: Option<PathBuf>,
    },

    /// Browse and edit applications interactively
    Browse,
}

#[cfg(feature = "resume")]
#[derive(Subcommand)]
enum ResumeCommands {
    /// Attach a resume, replacing any previous one
    Upload {
        /// Path to the document (PDF expected)
        file: PathBuf,
    },

    /// Show the attached resume
    Show,

    /// Write the attached resume to a file
    Export {
        /// Output file
        path: PathBuf,
    },

    /// Remove the attached resume
    Delete,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::resolve(cli.data_dir, cli.log_level);

    if let Err(e) = volt::logging::init_logging(&config.log_level, &config.log_dir()) {
        eprintln!("Warning: file logging disabled: {}", e);
    }

    let db_path = config.db_path();
    let storage = SqliteStorage::open(&db_path)
        .with_context(|| format!("Failed to open tracker database: {}", db_path.display()))?;
    let mut tracker =
        Tracker::open(LocalPersistence::new(storage)).context("Failed to load applications")?;

    match cli.command {
        Commands::Add {
            title,
            company,
            ctc,
            status,
            #[cfg(feature = "notes")]
            note,
        } => {
            let ctc = parse_ctc(ctc.as_deref().unwrap_or_default())?;
            let new = NewApplication::new(title, company)
                .with_ctc(ctc)
                .with_status(status);
            #[cfg(feature = "notes")]
            let new = new.with_note(note);

            let synced = tracker.add(new).context("Failed to add application")?;
            warn_if_unsaved(synced.warning);
            println!("Added job #{}", synced.value.id);
        }

        Commands::List {
            search,
            status,
            sort,
        } => {
            let query = ViewQuery::new(search, status, sort);
            let jobs = tracker.view(&query);
            if jobs.is_empty() {
                println!("No applications found.");
            } else {
                println!(
                    "{:<4} {:<6} {:<10} {:<30} {:<20} {:>12}",
                    "#", "ID", "STATUS", "TITLE", "COMPANY", "CTC"
                );
                println!("{}", "-".repeat(87));
                for (i, job) in jobs.iter().enumerate() {
                    println!(
                        "{:<4} {:<6} {:<10} {:<30} {:<20} {:>12}",
                        i + 1,
                        job.id,
                        job.status,
                        truncate(&job.title, 28),
                        truncate(&job.company, 18),
                        format_ctc(job.ctc)
                    );
                }
            }
        }

        Commands::Show { id } => match tracker.get(id) {
            Some(job) => {
                println!("Job #{}", job.id);
                println!("Title: {}", job.title);
                println!("Company: {}", job.company);
                println!("Status: {}", job.status);
                match job.ctc {
                    Some(_) => println!("Annual CTC: {}", format_ctc(job.ctc)),
                    None => println!("Annual CTC: not entered"),
                }
                #[cfg(feature = "notes")]
                {
                    if let Some(note) = job.note.as_deref().filter(|_| job.has_note()) {
                        println!("\n--- Note ---\n{}", note);
                    }
                }
            }
            None => {
                println!("Job #{} not found.", id);
            }
        },

        Commands::Status { id, status } => {
            let synced = tracker.update_status(id, status);
            warn_if_unsaved(synced.warning);
            if synced.value {
                println!("Marked job #{} as {}.", id, status);
            } else {
                println!("Job #{} not found.", id);
            }
        }

        #[cfg(feature = "notes")]
        Commands::Note { id, text } => {
            let cleared = text.is_none();
            let synced = tracker.update_note(id, text);
            warn_if_unsaved(synced.warning);
            match (synced.value, cleared) {
                (false, _) => println!("Job #{} not found.", id),
                (true, true) => println!("Cleared note on job #{}.", id),
                (true, false) => println!("Saved note on job #{}.", id),
            }
        }

        Commands::Delete { id } => {
            let synced = tracker.remove(id);
            warn_if_unsaved(synced.warning);
            match synced.value {
                Some(job) => println!("Deleted job #{} ({} at {}).", job.id, job.title, job.company),
                None => println!("Job #{} not found.", id),
            }
        }

        Commands::Stats => print_stats(&tracker),

        #[cfg(feature = "resume")]
        Commands::Resume { command } => run_resume(&mut tracker, command)?,

        Commands::Export { path } => {
            let path = path.unwrap_or_else(|| {
                PathBuf::from(format!(
                    "volt-export-{}.json",
                    chrono::Local::now().format("%Y%m%d-%H%M%S")
                ))
            });
            let json = serde_json::to_string_pretty(tracker.records())?;
            std::fs::write(&path, json)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
            println!(
                "Exported {} application(s) to {}",
                tracker.records().len(),
                path.display()
            );
        }

        Commands::Browse => tui::run_browse(&mut tracker)?,
    }

    Ok(())
}

fn print_stats(tracker: &LocalTracker) {
    let breakdown = StatusBreakdown::from_records(tracker.records());
    println!("Total Applications: {}", breakdown.total);
    for status in Status::ALL {
        println!(
            "{:<10} {:>4} ({:.1}%)",
            format!("{}:", status),
            breakdown.count(status),
            breakdown.percent(status)
        );
    }
    match ctc_summary(tracker.records()) {
        Some(summary) => {
            println!();
            println!(
                "Average CTC: {} ({} of {} reported)",
                format_ctc(Some(summary.mean)),
                summary.reported,
                breakdown.total
            );
            println!("Highest CTC: {}", format_ctc(Some(summary.max)));
        }
        None if breakdown.total > 0 => println!("\nNo compensation entered yet."),
        None => {}
    }
}

#[cfg(feature = "resume")]
fn run_resume(tracker: &mut LocalTracker, command: ResumeCommands) -> Result<()> {
    match command {
        ResumeCommands::Upload { file } => {
            let doc = volt::resume::read_document_blocking(&file)
                .with_context(|| format!("Failed to read resume file: {}", file.display()))?;
            let replaced = tracker.resume().is_some();
            let size = doc.len();
            let synced = tracker.attach_resume(doc);
            warn_if_unsaved(synced.warning);
            if replaced {
                println!("Replaced resume with {} ({} bytes).", file.display(), size);
            } else {
                println!("Attached resume {} ({} bytes).", file.display(), size);
            }
        }

        ResumeCommands::Show => match tracker.resume() {
            Some(doc) => {
                println!("Type: {}", doc.mime);
                println!("Size: {} bytes", doc.len());
                println!("Data URL: {}", truncate(&doc.to_data_url(), 72));
            }
            None => println!("No resume attached."),
        },

        ResumeCommands::Export { path } => {
            let doc = tracker
                .resume()
                .ok_or_else(|| anyhow::anyhow!("No resume attached"))?;
            std::fs::write(&path, &doc.bytes)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
            println!("Resume saved to: {}", path.display());
        }

        ResumeCommands::Delete => {
            let synced = tracker.clear_resume();
            warn_if_unsaved(synced.warning);
            if synced.value {
                println!("Resume removed.");
            } else {
                println!("No resume attached.");
            }
        }
    }
    Ok(())
}

fn warn_if_unsaved(warning: Option<PersistError>) {
    if let Some(e) = warning {
        eprintln!("Warning: change was not saved: {}", e);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Backend Engineer", 10), "Backend...");
        assert_eq!(truncate("₹₹₹₹₹₹", 5), "₹₹...");
    }

    #[test]
    fn test_cli_parses_list_flags() {
        let cli = Cli::try_parse_from(["volt", "list", "-q", "acme", "-s", "selected", "-o", "desc"])
            .unwrap();
        match cli.command {
            Commands::List {
                search,
                status,
                sort,
            } => {
                assert_eq!(search, "acme");
                assert_eq!(status, StatusFilter::Only(Status::Selected));
                assert_eq!(sort, SortOrder::Desc);
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_status() {
        assert!(Cli::try_parse_from(["volt", "status", "1", "Ghosted"]).is_err());
    }
}
