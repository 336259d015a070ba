//! Progress display for replays

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner drawn on stderr; hidden automatically when stderr is not a terminal
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Spinner message after a batch settles
pub fn scan_message(scanned: usize, sent: usize, failed: usize) -> String {
    match failed {
        0 => format!("Scanned {} objects, {} sent", scanned, sent),
        _ => format!("Scanned {} objects, {} sent, {} failed", scanned, sent, failed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_message() {
        assert_eq!(scan_message(30, 12, 0), "Scanned 30 objects, 12 sent");
        assert_eq!(scan_message(60, 40, 2), "Scanned 60 objects, 40 sent, 2 failed");
    }
}
