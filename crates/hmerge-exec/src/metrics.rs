//! Progress reporting through `tracing` events.

use std::time::{Duration, Instant};

/// Rows processed against an optional expected total.
pub struct Progress {
    total: Option<u64>,
    rows: u64,
    every_chunks: u64,
    chunks: u64,
    started: Instant,
}

impl Progress {
    pub fn new(total: Option<u64>, every_chunks: usize) -> Self {
        Self {
            total,
            rows: 0,
            every_chunks: every_chunks as u64,
            chunks: 0,
            started: Instant::now(),
        }
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn rows_per_sec(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.rows as f64 / secs
        } else {
            0.0
        }
    }

    /// Percent of the expected total, capped at 100.
    pub fn percent(&self) -> Option<f64> {
        self.total
            .filter(|t| *t > 0)
            .map(|t| (self.rows as f64 * 100.0 / t as f64).min(100.0))
    }

    /// Count one merged chunk; emits an event every `every_chunks` chunks.
    pub fn record(&mut self, rows: usize) {
        self.rows += rows as u64;
        self.chunks += 1;
        if self.every_chunks > 0 && self.chunks % self.every_chunks == 0 {
            self.emit();
        }
    }

    fn emit(&self) {
        tracing::info!(
            rows = self.rows,
            total = self.total,
            percent = self.percent().map(|p| (p * 10.0).round() / 10.0),
            elapsed_s = self.elapsed().as_secs(),
            rows_per_sec = self.rows_per_sec().round() as u64,
            "progress"
        );
    }

    pub fn finish(&self) {
        if self.every_chunks == 0 || self.chunks % self.every_chunks != 0 {
            self.emit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_is_capped() {
        let mut p = Progress::new(Some(10), 0);
        p.record(5);
        assert_eq!(p.percent(), Some(50.0));
        p.record(20);
        assert_eq!(p.percent(), Some(100.0));
        assert_eq!(p.rows(), 25);
        assert_eq!(Progress::new(None, 1).percent(), None);
    }
}
