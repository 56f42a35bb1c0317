//! CLI entry point for `replysplit`.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use replysplit::config::{self, Config};
use replysplit::export::{self, ExportFormat};
use replysplit::model::message::ReplyRow;
use replysplit::store::{load_export, LoadedExport};
use replysplit::submit::{self, QueueSubmitter};
use replysplit::thread::{flatten, SegmentNote, Selection, SelectionRequest, Thread, ThreadSet};

#[derive(Parser)]
#[command(
    name = "replysplit",
    version,
    about = "Split exported email threads into attributed replies"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Thread selection flags shared by `export` and `submit`.
#[derive(Args, Debug, Default)]
struct SelectArgs {
    /// Thread numbers and ranges, e.g. 1,3,5-7 (ignored with --all)
    #[arg(long, value_name = "LIST")]
    select: Option<String>,

    /// Select every thread
    #[arg(long)]
    all: bool,

    /// Keep only threads whose name or subject contains this text
    #[arg(long, value_name = "QUERY")]
    search: Option<String>,
}

impl From<SelectArgs> for SelectionRequest {
    fn from(args: SelectArgs) -> Self {
        Self {
            list: args.select,
            all: args.all,
            search: args.search,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a CSV export and show statistics
    Parse {
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// List threads
    Threads {
        path: PathBuf,
        /// Only list threads whose name or subject contains this text
        #[arg(long, value_name = "QUERY")]
        search: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Print the replies of one or more threads
    Show {
        path: PathBuf,
        #[arg(required = true, value_name = "N")]
        numbers: Vec<usize>,
    },
    /// Segment a single email body (stdin when no file is given)
    Segment {
        file: Option<PathBuf>,
        /// Sender of the first reply
        #[arg(short, long, default_value = "")]
        sender: String,
        #[arg(long)]
        json: bool,
    },
    /// Export selected threads
    Export {
        path: PathBuf,
        /// csv, txt, json or xlsx
        #[arg(short, long)]
        format: Option<String>,
        /// Output file, or directory for filtered_output.<ext>
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        selection: SelectArgs,
        /// Write one text file per thread into the output directory
        #[arg(long)]
        split: bool,
    },
    /// Queue selected replies as cases
    Submit {
        path: PathBuf,
        /// Queue file (JSON lines)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        selection: SelectArgs,
    },
    /// Show the active configuration
    Config {
        /// Write the current configuration to the config file
        #[arg(long)]
        init: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = config::load_config();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Parse { path, json } => cmd_parse(&path, json, &config),
        Commands::Threads { path, search, json } => {
            cmd_threads(&path, search.as_deref(), json, &config)
        }
        Commands::Show { path, numbers } => cmd_show(&path, &numbers, &config),
        Commands::Segment { file, sender, json } => cmd_segment(file.as_deref(), &sender, json),
        Commands::Export {
            path,
            format,
            output,
            selection,
            split,
        } => cmd_export(
            &path,
            format.as_deref(),
            output,
            selection.into(),
            split,
            &config,
        ),
        Commands::Submit {
            path,
            output,
            selection,
        } => cmd_submit(&path, output, selection.into(), &config),
        Commands::Config { init } => cmd_config(init, &config),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_path = config::log_file_path(config);
    let log_dir = config::cache_dir(config);
    let file_name = log_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "replysplit.log".into());

    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, file_name);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "replysplit", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

fn progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} {label} [{{bar:40.cyan/blue}}] {{pos}}/{{len}}"
            ))
            .expect("valid template")
            .progress_chars("#>-"),
    );
    pb
}

/// Load an export with a progress bar.
fn load(path: &Path, config: &Config) -> anyhow::Result<LoadedExport> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }

    let pb = progress_bar(0, "Reading");
    let loaded = load_export(
        path,
        config,
        Some(&|current, total| {
            pb.set_length(total);
            pb.set_position(current);
        }),
    )?;
    pb.finish_and_clear();

    Ok(loaded)
}

/// Segment every message and group the rows into threads.
fn build_threads(loaded: &LoadedExport) -> (ThreadSet, Vec<SegmentNote>) {
    let flat = flatten(&loaded.messages);
    (ThreadSet::from_rows(flat.rows), flat.notes)
}

/// Parse an export and print statistics.
fn cmd_parse(path: &Path, json: bool, config: &Config) -> anyhow::Result<()> {
    let start = Instant::now();
    let loaded = load(path, config)?;
    let (set, notes) = build_threads(&loaded);
    let elapsed = start.elapsed();

    if json {
        print_parse_json(&loaded, &set, &notes, elapsed)
    } else {
        print_parse_table(&loaded, &set, &notes, elapsed);
        Ok(())
    }
}

/// Print parse statistics in a human-readable table.
fn print_parse_table(
    loaded: &LoadedExport,
    set: &ThreadSet,
    notes: &[SegmentNote],
    elapsed: std::time::Duration,
) {
    use humansize::{format_size, BINARY};

    println!();
    println!("  {:<20} {}", "File", loaded.path.display());
    println!("  {:<20} {}", "File size", format_size(loaded.size, BINARY));
    println!("  {:<20} {}", "Emails", loaded.messages.len());
    println!("  {:<20} {}", "Replies", set.reply_count());
    println!("  {:<20} {}", "Threads", set.len());
    println!("  {:<20} {:.2?}", "Parse time", elapsed);

    if !loaded.issues.is_empty() {
        println!();
        println!("  Row issues:");
        for issue in &loaded.issues {
            println!("    {issue}");
        }
    }

    if !notes.is_empty() {
        println!();
        println!("  Segmentation notes:");
        for note in notes {
            println!("    row {}: {}", note.row, note.diagnostic);
        }
    }

    let top = set.top_senders(10);
    if !top.is_empty() {
        println!();
        println!("  Top senders:");
        for (sender, count) in &top {
            println!("    {count:>6}  {}", truncate_width(sender, 60));
        }
    }

    println!();
    println!(
        "Parsed {} replies from {} threads.",
        set.reply_count(),
        set.len()
    );
}

/// Print parse statistics as JSON.
fn print_parse_json(
    loaded: &LoadedExport,
    set: &ThreadSet,
    notes: &[SegmentNote],
    elapsed: std::time::Duration,
) -> anyhow::Result<()> {
    let top_json: Vec<serde_json::Value> = set
        .top_senders(10)
        .iter()
        .map(|(sender, count)| {
            serde_json::json!({
                "sender": sender,
                "count": count,
            })
        })
        .collect();

    let stats = serde_json::json!({
        "file": loaded.path.to_string_lossy(),
        "file_size": loaded.size,
        "email_count": loaded.messages.len(),
        "reply_count": set.reply_count(),
        "thread_count": set.len(),
        "parse_time_ms": elapsed.as_millis(),
        "issues": loaded.issues,
        "notes": notes,
        "top_senders": top_json,
    });

    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

/// List threads, optionally filtered by a search.
fn cmd_threads(
    path: &Path,
    search: Option<&str>,
    json: bool,
    config: &Config,
) -> anyhow::Result<()> {
    let loaded = load(path, config)?;
    let (set, _) = build_threads(&loaded);

    let listed: Vec<&Thread> = match search {
        Some(query) => set.search(query),
        None => set.threads().iter().collect(),
    };

    if json {
        let items: Vec<serde_json::Value> = listed
            .iter()
            .map(|t| {
                serde_json::json!({
                    "number": t.number,
                    "first_name": t.first_name(),
                    "subject": t.subject,
                    "replies": t.reply_count(),
                })
            })
            .collect();
        let output = serde_json::json!({
            "thread_count": listed.len(),
            "threads": items,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!();
    println!("  {} thread(s)", listed.len());
    println!();
    for thread in &listed {
        println!("  {}", thread_line(thread));
    }
    println!();
    Ok(())
}

/// `N. first_name | subject (k replies)`
fn thread_line(thread: &Thread) -> String {
    format!(
        "{}. {} | {} ({} replies)",
        thread.number,
        truncate_width(thread.first_name(), 30),
        truncate_width(&thread.subject, 60),
        thread.reply_count()
    )
}

/// Truncate to a display width, marking the cut with an ellipsis.
fn truncate_width(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    let mut width = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if width + w + 1 > max {
            break;
        }
        out.push(c);
        width += w;
    }
    out.push('…');
    out
}

/// Print the replies of the given threads.
fn cmd_show(path: &Path, numbers: &[usize], config: &Config) -> anyhow::Result<()> {
    let loaded = load(path, config)?;
    let (set, _) = build_threads(&loaded);

    for &number in numbers {
        let Some(thread) = set.get(number) else {
            anyhow::bail!("Thread {number} does not exist (1-{})", set.len());
        };
        println!();
        println!("  {}", thread_line(thread));
        println!();
        let rows: Vec<&ReplyRow> = thread.rows.iter().collect();
        print!("{}", export::text::render_text(&rows));
    }
    Ok(())
}

/// Segment one body read from a file or stdin.
fn cmd_segment(file: Option<&Path>, sender: &str, json: bool) -> anyhow::Result<()> {
    let body = match file {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("File not found: {}", path.display());
            }
            std::fs::read_to_string(path)?
        }
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let seg = replysplit::parser::segment(&body, sender);

    if json {
        println!("{}", serde_json::to_string_pretty(&seg)?);
        return Ok(());
    }

    for attributed in &seg.chunks {
        let chunk = &attributed.chunk;
        println!(
            "--- [{}] {} ({:?})",
            chunk.order, chunk.sender, attributed.attribution
        );
        println!("{}", chunk.text);
    }
    for diagnostic in &seg.diagnostics {
        eprintln!("  note: {diagnostic}");
    }
    println!();
    println!("{} chunk(s)", seg.chunks.len());
    Ok(())
}

/// Export the selected threads.
fn cmd_export(
    path: &Path,
    format: Option<&str>,
    output: Option<PathBuf>,
    request: SelectionRequest,
    split: bool,
    config: &Config,
) -> anyhow::Result<()> {
    let format = ExportFormat::parse(format.unwrap_or(config.export.default_format.as_str()))?;
    let output = output
        .or_else(|| config.export.default_output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    let loaded = load(path, config)?;
    let (set, _) = build_threads(&loaded);
    let selection = Selection::from_request(&set, &request)?;
    if selection.is_empty() {
        anyhow::bail!("No threads match the selection");
    }

    if split {
        let threads: Vec<&Thread> = selection.numbers().filter_map(|n| set.get(n)).collect();
        println!(
            "  Exporting {} thread(s) as text to {}",
            threads.len(),
            output.display()
        );
        let pb = progress_bar(threads.len() as u64, "Exporting");
        let paths = export::text::export_thread_files(&threads, &output, &|current, _total| {
            pb.set_position(current as u64);
        })?;
        pb.finish_and_clear();
        println!("  Exported {} .txt file(s)", paths.len());
        return Ok(());
    }

    let rows = selection.rows(&set);
    let written = export::export_rows(&rows, format, &output)?;
    println!(
        "  Exported {} reply(ies) from {} thread(s) to {}",
        rows.len(),
        selection.count(),
        written.display()
    );
    Ok(())
}

/// Queue the selected replies as case entries.
fn cmd_submit(
    path: &Path,
    output: Option<PathBuf>,
    request: SelectionRequest,
    config: &Config,
) -> anyhow::Result<()> {
    let queue_path = output.unwrap_or_else(|| {
        config
            .export
            .default_output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(&config.submit.queue_file)
    });

    let loaded = load(path, config)?;
    let (set, _) = build_threads(&loaded);
    let selection = Selection::from_request(&set, &request)?;
    let rows = selection.rows(&set);
    if rows.is_empty() {
        anyhow::bail!("No replies selected for submission");
    }

    let entries = submit::build_entries(
        &rows,
        &config.submit.intake_method,
        chrono::Local::now().naive_local(),
    );

    let mut queue = QueueSubmitter::create(&queue_path)?;
    let pb = progress_bar(entries.len() as u64, "Submitting");
    let report = submit::submit_all(&mut queue, &entries, &|current, _total| {
        pb.set_position(current as u64);
    })?;
    pb.finish_and_clear();

    println!(
        "  Submitted {}/{} case(s) to {}",
        report.submitted,
        report.attempted(),
        queue.path().display()
    );
    if !report.failures.is_empty() {
        println!("  Skipped:");
        for failure in &report.failures {
            println!("    #{} {}: {}", failure.index, failure.name, failure.reason);
        }
    }
    Ok(())
}

/// Print the active configuration, or write it out with `--init`.
fn cmd_config(init: bool, config: &Config) -> anyhow::Result<()> {
    if init {
        config::save_config(config)?;
        if let Some(path) = config::config_file_path() {
            println!("  Wrote {}", path.display());
        }
        return Ok(());
    }

    if let Some(path) = config::config_file_path() {
        println!("# {}", path.display());
    }
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_all_overrides_select() {
        let cli = Cli::try_parse_from([
            "replysplit", "export", "in.csv", "--select", "2", "--all",
        ])
        .unwrap();
        let Commands::Export { selection, .. } = cli.command else {
            panic!("expected export command");
        };
        let request = SelectionRequest::from(selection);
        assert!(request.all);
        assert_eq!(request.list.as_deref(), Some("2"));
    }
}
