//! Timestamp injection, so the pipeline core never reads the wall clock
//! directly — required for byte-identical `StageLog`s across repeated runs
//! of the same input.

/// Supplies timestamps for `StageLog` entries.
pub trait Clock {
    fn now(&self) -> String;
}

/// Production clock: RFC 3339 wall-clock time, installed by the CLI binary.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> String {
        let since_epoch = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default();
        format!("{}.{:09}", since_epoch.as_secs(), since_epoch.subsec_nanos())
    }
}

/// A clock that always returns the same value, for tests that assert
/// byte-identical `StageLog`s.
#[derive(Clone, Debug)]
pub struct FixedClock(pub String);

impl Clock for FixedClock {
    fn now(&self) -> String {
        self.0.clone()
    }
}
