use jiff::{SignedDuration, Timestamp};

/// Wall-clock limit shared by every worker of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(Option<Timestamp>);

impl Deadline {
    pub const NONE: Deadline = Deadline(None);

    /// A timeout too large to be represented never expires.
    pub fn after(timeout: SignedDuration) -> Self {
        Deadline(Timestamp::now().checked_add(timeout).ok())
    }

    pub fn from_timeout(timeout: Option<SignedDuration>) -> Self {
        timeout.map_or(Deadline::NONE, Deadline::after)
    }

    pub fn is_reached(&self) -> bool {
        self.0.is_some_and(|deadline| Timestamp::now() >= deadline)
    }
}
