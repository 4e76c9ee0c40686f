use std::sync::Mutex;

use tokio::time::{sleep_until, Duration, Instant};

/// A pool-wide pause.
///
/// When any worker is rate limited, it closes the gate until the deadline the accrual service gave us. Every worker
/// waits at the gate before each request, so nobody talks to the accrual service while it is closed. Overlapping
/// pauses extend the deadline; they never shorten it.
#[derive(Debug, Default)]
pub struct PauseGate {
    resume_at: Mutex<Option<Instant>>,
}

impl PauseGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Closes the gate for at least `duration` from now.
    pub fn pause_for(&self, duration: Duration) -> Instant {
        let deadline = Instant::now() + duration;
        let mut guard = self.resume_at.lock().unwrap_or_else(|e| e.into_inner());
        let resume_at = match *guard {
            Some(current) if current > deadline => current,
            _ => deadline,
        };
        *guard = Some(resume_at);
        resume_at
    }

    pub fn resume_at(&self) -> Option<Instant> {
        let guard = self.resume_at.lock().unwrap_or_else(|e| e.into_inner());
        (*guard).filter(|t| *t > Instant::now())
    }

    pub fn is_paused(&self) -> bool {
        self.resume_at().is_some()
    }

    /// Returns once the gate is open. Re-checks after waking, since the pause may have been extended meanwhile.
    pub async fn wait_open(&self) {
        while let Some(deadline) = self.resume_at() {
            sleep_until(deadline).await;
        }
    }
}
