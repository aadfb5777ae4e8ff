use chrono::{DateTime, Utc};

/// How long a correct answer stays on screen before the session reports it
/// is time to move on.
pub const AUTO_ADVANCE_DELAY_MS: i64 = 1000;

/// A cancellable deadline. The host polls `is_due` from its own timer; the
/// session never schedules anything itself, so cancelling is just clearing
/// the deadline and there is no callback to race against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AdvanceTimer {
    deadline: Option<DateTime<Utc>>,
}

impl AdvanceTimer {
    pub fn arm(&mut self) {
        self.arm_at(Utc::now());
    }

    pub fn arm_at(&mut self, now: DateTime<Utc>) {
        self.deadline = Some(now + chrono::Duration::milliseconds(AUTO_ADVANCE_DELAY_MS));
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn is_due(&self) -> bool {
        self.is_due_at(Utc::now())
    }

    pub fn is_due_at(&self, now: DateTime<Utc>) -> bool {
        match self.deadline {
            Some(deadline) => now >= deadline,
            None => false,
        }
    }
}
