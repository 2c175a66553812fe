use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current time in milliseconds since the Unix epoch,
/// abstracted so tests can pin a deterministic clock.
pub trait TimeSource: Send + Sync {
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock is before the Unix epoch")
            .as_millis() as u64
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedTimeSource(pub u64);

impl TimeSource for FixedTimeSource {
    fn now_ms(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_time_source_never_advances() {
        let ts = FixedTimeSource(1_000);
        assert_eq!(ts.now_ms(), 1_000);
        assert_eq!(ts.now_ms(), 1_000);
    }

    #[test]
    fn system_time_source_is_plausible() {
        let ts = SystemTimeSource;
        assert!(ts.now_ms() > 1_700_000_000_000);
    }
}
