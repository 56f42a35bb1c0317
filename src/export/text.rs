//! Export reply rows as plain text.

use std::path::{Path, PathBuf};

use crate::model::message::ReplyRow;
use crate::thread::Thread;

use super::sanitize_filename_part;

/// Render rows as labelled blocks separated by a dashed line.
pub fn render_text(rows: &[&ReplyRow]) -> String {
    let mut content = String::new();
    for row in rows {
        content.push_str(&format!("Name: {}\n", row.name));
        content.push_str(&format!("Email: {}\n", row.email));
        content.push_str(&format!("Subject: {}\n", row.subject));
        content.push_str(&format!("Sender: {}\n", row.sender));
        content.push_str(&format!("Reply:\n{}\n", row.reply.trim()));
        content.push_str(&"-".repeat(40));
        content.push('\n');
    }
    content
}

/// Export all rows into a single text file.
pub fn export_text(rows: &[&ReplyRow], output_path: &Path) -> anyhow::Result<()> {
    std::fs::write(output_path, render_text(rows))?;
    Ok(())
}

/// Export each thread into its own text file under `output_dir`.
///
/// The progress callback receives `(current, total)`.
pub fn export_thread_files(
    threads: &[&Thread],
    output_dir: &Path,
    progress: &dyn Fn(usize, usize),
) -> anyhow::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;
    let total = threads.len();
    let mut paths = Vec::with_capacity(total);

    for (i, thread) in threads.iter().enumerate() {
        progress(i, total);
        let path = output_dir.join(thread_filename(thread));
        let rows: Vec<&ReplyRow> = thread.rows.iter().collect();
        std::fs::write(&path, render_text(&rows))?;
        paths.push(path);
    }
    progress(total, total);

    Ok(paths)
}

/// Generate a filename for a thread export: `{number}_{subject}.txt`.
fn thread_filename(thread: &Thread) -> String {
    let subject = sanitize_filename_part(&thread.subject, 80);
    format!("{:03}_{subject}.txt", thread.number)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(reply: &str) -> ReplyRow {
        ReplyRow {
            name: "Pat".to_string(),
            email: "pat@example.com".to_string(),
            subject: "Pothole".to_string(),
            sender: "pat@example.com".to_string(),
            reply: reply.to_string(),
            position: 0,
        }
    }

    #[test]
    fn test_render_text() {
        let a = row("  Big hole\nnear school \n");
        let text = render_text(&[&a]);
        assert_eq!(
            text,
            format!(
                "Name: Pat\nEmail: pat@example.com\nSubject: Pothole\nSender: pat@example.com\nReply:\nBig hole\nnear school\n{}\n",
                "-".repeat(40)
            )
        );
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_text(&[]), "");
    }

    #[test]
    fn test_thread_filename() {
        let thread = Thread {
            number: 7,
            subject: "Re: Tree / sidewalk".to_string(),
            rows: vec![row("a\nb")],
        };
        assert_eq!(thread_filename(&thread), "007_Re__Tree___sidewalk.txt");
    }
}
