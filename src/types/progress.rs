use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Completion counter shared by every window task of one dispatcher run.
#[derive(Debug)]
pub struct FetchProgress {
    completed: AtomicUsize,
    total: usize,
}

/// A consistent reading of [`FetchProgress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub completed: usize,
    pub total: usize,
}

impl ProgressSnapshot {
    /// Completion percentage; an empty run counts as complete.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.completed as f64 / self.total as f64 * 100.0
    }
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({:.1}%)", self.completed, self.total, self.percent())
    }
}

impl FetchProgress {
    pub fn new(total: usize) -> Self {
        Self {
            completed: AtomicUsize::new(0),
            total,
        }
    }

    /// Marks one task finished and returns the counts including it.
    pub fn complete_one(&self) -> ProgressSnapshot {
        let completed = self.completed.fetch_add(1, Ordering::AcqRel) + 1;
        ProgressSnapshot {
            completed,
            total: self.total,
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            completed: self.completed.load(Ordering::Acquire),
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_percent_and_display() {
        let progress = FetchProgress::new(4);
        assert_eq!(progress.snapshot().percent(), 0.0);
        progress.complete_one();
        let snap = progress.complete_one();
        assert_eq!(snap.completed, 2);
        assert_eq!(snap.to_string(), "2/4 (50.0%)");
        assert_eq!(ProgressSnapshot { completed: 0, total: 0 }.percent(), 100.0);
    }

    #[test]
    fn test_concurrent_completions_are_all_counted() {
        let progress = Arc::new(FetchProgress::new(800));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let progress = Arc::clone(&progress);
                std::thread::spawn(move || {
                    (0..100).map(|_| progress.complete_one().completed).max()
                })
            })
            .collect();
        let highest = handles
            .into_iter()
            .filter_map(|h| h.join().unwrap())
            .max();
        assert_eq!(highest, Some(800));
        assert_eq!(progress.snapshot().completed, 800);
    }
}
