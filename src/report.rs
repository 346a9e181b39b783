//! Run summaries, printable and saved as pretty JSON.

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Serialize;

use crate::worker::WorkerOutcome;

/// Outcome of one observed run: which workers completed inside the window
/// and which were still blocked or retrying when it closed.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub window_ms: u64,
    pub completed: Vec<WorkerOutcome>,
    pub stalled: Vec<String>,
}

impl RunReport {
    pub fn new(window: Duration, mut completed: Vec<WorkerOutcome>, stalled: Vec<String>) -> Self {
        completed.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            window_ms: window.as_millis() as u64,
            completed,
            stalled,
        }
    }

    /// True iff every worker reported success within the window.
    pub fn all_completed(&self) -> bool {
        self.stalled.is_empty()
    }

    /// Total attempts across the workers that completed; a rough contention
    /// measure for the timeout-retry mode.
    pub fn total_attempts(&self) -> u64 {
        self.completed.iter().map(|o| o.attempts).sum()
    }

    /// Saves the report as pretty-printed JSON.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "run report ({} ms window):", self.window_ms)?;
        for o in &self.completed {
            writeln!(
                f,
                "  {}: success after {} attempt(s) in {} ms",
                o.name, o.attempts, o.elapsed_ms
            )?;
        }
        for name in &self.stalled {
            writeln!(f, "  {name}: no progress within the window")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RunReport {
        RunReport::new(
            Duration::from_secs(5),
            vec![
                WorkerOutcome {
                    name: "t1".to_string(),
                    attempts: 3,
                    elapsed_ms: 120,
                },
                WorkerOutcome {
                    name: "main".to_string(),
                    attempts: 1,
                    elapsed_ms: 40,
                },
            ],
            vec!["t2".to_string()],
        )
    }

    #[test]
    fn display_lists_completed_and_stalled() {
        let text = sample().to_string();
        assert!(text.contains("main: success after 1 attempt(s)"));
        assert!(text.contains("t2: no progress within the window"));
    }

    #[test]
    fn completed_workers_are_sorted_and_counted() {
        let report = sample();
        assert_eq!(report.completed[0].name, "main");
        assert_eq!(report.total_attempts(), 4);
        assert!(!report.all_completed());
    }

    #[test]
    fn saves_pretty_json() {
        let path = std::env::temp_dir().join("contend-report-test.json");
        sample().save_to_file(&path).unwrap();
        let json = fs::read_to_string(&path).unwrap();
        assert!(json.contains("\"window_ms\": 5000"));
        let _ = fs::remove_file(&path);
    }
}
