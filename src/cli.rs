// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! - Running the booth headless (log to stdout, no terminal UI)
//! - Uploading a single image to the share host
//! - Printing or writing the effective configuration

use chrono::Local;
use gesture_booth::config::BoothConfig;
use gesture_booth::engine::{BoothEngine, BoothView, Collaborators};
use gesture_booth::session_log::LogEntry;
use gesture_booth::share::{TmpfilesUploader, qr_image_url};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Run the booth without a terminal UI until Ctrl+C or `duration` elapses
pub async fn run_headless(
    config: BoothConfig,
    duration: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let collaborators = Collaborators::from_config(&config)?;
    println!("Camera: {}", collaborators.camera.name());
    println!(
        "Trigger: hold {} ms, cooldown {} s",
        config.required_hold_ms, config.cooldown_seconds
    );

    let (engine, handle) = BoothEngine::new(config, collaborators);
    let task = engine.spawn();

    let ctrlc_handle = handle.clone();
    ctrlc::set_handler(move || {
        ctrlc_handle.shutdown();
    })?;

    println!("Booth running (press Ctrl+C to stop)");
    println!();

    let deadline = duration.map(|secs| tokio::time::Instant::now() + Duration::from_secs(secs));
    let mut views = handle.subscribe_view();
    let mut reporter = ViewReporter::default();
    reporter.report(&views.borrow_and_update());

    loop {
        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = views.borrow_and_update().clone();
                reporter.report(&view);
            }
            _ = tokio::time::sleep_until(deadline.unwrap_or_else(tokio::time::Instant::now)), if deadline.is_some() => {
                println!();
                println!("Duration elapsed, stopping...");
                handle.shutdown();
                break;
            }
        }
    }

    task.await?;
    println!("Booth stopped");
    Ok(())
}

/// Prints log lines and status changes as they appear
#[derive(Default)]
struct ViewReporter {
    last_status: String,
    seen: Vec<LogEntry>,
}

impl ViewReporter {
    fn report(&mut self, view: &BoothView) {
        for entry in new_entries(&self.seen, &view.log).iter().rev() {
            println!("{}", entry);
        }
        self.seen = view.log.clone();

        if view.status != self.last_status {
            println!("[status] {}", view.status);
            self.last_status = view.status.clone();
        }
    }
}

/// Entries of `current` (newest first) that are not in `previous`
fn new_entries<'a>(previous: &[LogEntry], current: &'a [LogEntry]) -> &'a [LogEntry] {
    let Some(newest_seen) = previous.first() else {
        return current;
    };
    match current.iter().position(|e| e == newest_seen) {
        Some(index) => &current[..index],
        None => current,
    }
}

/// Upload one image and print its share links
pub async fn upload_file(
    config: &BoothConfig,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("booth_{}.png", Local::now().format("%Y%m%d_%H%M%S")));

    let uploader = TmpfilesUploader::new(
        config.upload_url.clone(),
        Duration::from_secs(config.upload_timeout_secs),
    )?;
    println!("Uploading {} ({} bytes) to {}", file_name, data.len(), uploader.endpoint());

    let url = uploader.upload_png(file_name, data).await?;
    println!("URL: {}", url);
    println!("QR:  {}", qr_image_url(&url));
    Ok(())
}

/// Print the effective configuration, optionally writing it to disk
pub fn show_config(
    config: &BoothConfig,
    write: bool,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(config)?);
    if !write {
        return Ok(());
    }

    let path = output
        .or_else(BoothConfig::default_path)
        .ok_or("No config directory available, pass --output")?;
    config.save(&path)?;
    println!();
    println!("Config saved: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(message: &str) -> LogEntry {
        LogEntry {
            timestamp_label: "[12:00:00]".into(),
            message: message.into(),
        }
    }

    #[test]
    fn test_new_entries_since_last_report() {
        let previous = vec![entry("B"), entry("A")];
        let current = vec![entry("D"), entry("C"), entry("B"), entry("A")];
        let fresh: Vec<_> = new_entries(&previous, &current)
            .iter()
            .map(|e| e.message.as_str())
            .collect();
        assert_eq!(fresh, vec!["D", "C"]);
    }

    #[test]
    fn test_new_entries_first_report_is_everything() {
        let current = vec![entry("B"), entry("A")];
        assert_eq!(new_entries(&[], &current).len(), 2);
    }
}
