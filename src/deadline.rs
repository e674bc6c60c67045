use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Overall time budget for one cycle, checked between units of work.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn new(budget: Duration) -> Self {
        Deadline {
            start: Instant::now(),
            budget,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(Duration::MAX)
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn check(&self) -> Result<()> {
        if self.start.elapsed() > self.budget {
            return Err(Error::Timeout(self.budget));
        }
        Ok(())
    }
}
