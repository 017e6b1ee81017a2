//! Terminal status line.

use std::io::Write;

use chrono::Local;

use tome_core::traits::{Progress, ProgressObserver};

/// Renders pipeline progress as a carriage-return status line on stderr.
///
/// Each event overwrites the previous line in place; the final event of
/// a phase (current == total) is followed by a newline so the line
/// survives in scrollback.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusLine;

impl StatusLine {
    fn render(progress: &Progress) -> String {
        let percent = if progress.total == 0 {
            100.0
        } else {
            progress.current as f64 / progress.total as f64 * 100.0
        };

        let mut line = format!(
            "\r{:5.1}% - {}/{} {}",
            percent, progress.current, progress.total, progress.phase
        );

        if let Some(eta) = progress.eta_seconds {
            let finish = Local::now() + chrono::Duration::seconds(eta.round() as i64);
            line.push_str(&format!(
                " - eta {}s ({})",
                eta.round() as i64,
                finish.format("%H:%M:%S")
            ));
        }

        line
    }
}

impl ProgressObserver for StatusLine {
    fn on_progress(&self, progress: &Progress) {
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(Self::render(progress).as_bytes());
        if progress.current >= progress.total {
            let _ = stderr.write_all(b"\n");
        }
        let _ = stderr.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tome_core::traits::Phase;

    #[test]
    fn percent_has_one_decimal() {
        let line = StatusLine::render(&Progress {
            phase: Phase::BlockPagination,
            current: 1,
            total: 3,
            eta_seconds: None,
        });
        assert!(line.starts_with("\r 33.3% - 1/3 blocks"), "{line:?}");
    }

    #[test]
    fn eta_is_rendered_when_present() {
        let line = StatusLine::render(&Progress {
            phase: Phase::BlockPagination,
            current: 2,
            total: 4,
            eta_seconds: Some(12.4),
        });
        assert!(line.contains("eta 12s"), "{line:?}");
    }

    #[test]
    fn empty_total_reads_as_complete() {
        let line = StatusLine::render(&Progress {
            phase: Phase::EntryPagination,
            current: 0,
            total: 0,
            eta_seconds: None,
        });
        assert!(line.starts_with("\r100.0%"), "{line:?}");
    }
}
