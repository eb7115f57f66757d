use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Window {
    started_at: Instant,
    suppressed: u64,
}

/// Rate limits repeated log events per key.
///
/// The first event of a window is emitted; the rest are counted and the count
/// is reported with the first event of the next window.
#[derive(Debug)]
pub struct LogThrottle {
    interval: Duration,
    windows: Mutex<HashMap<&'static str, Window>>,
}

impl LogThrottle {
    pub fn new(interval: Duration) -> Self {
        LogThrottle {
            interval,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// `Some(suppressed_since_last_emit)` when the event for `key` should be
    /// logged, `None` when it falls inside the current window.
    pub fn should_emit(&self, key: &'static str) -> Option<u64> {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();

        match windows.get_mut(key) {
            Some(window) if now.duration_since(window.started_at) >= self.interval => {
                let suppressed = window.suppressed;
                window.started_at = now;
                window.suppressed = 0;
                Some(suppressed)
            }
            Some(window) => {
                window.suppressed += 1;
                None
            }
            None => {
                windows.insert(
                    key,
                    Window {
                        started_at: now,
                        suppressed: 0,
                    },
                );
                Some(0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn emits_then_suppresses_then_reports_count() {
        let throttle = LogThrottle::new(Duration::from_millis(20));

        assert_eq!(throttle.should_emit("api.unauthorized"), Some(0));
        assert_eq!(throttle.should_emit("api.unauthorized"), None);
        assert_eq!(throttle.should_emit("api.unauthorized"), None);

        sleep(Duration::from_millis(30));
        assert_eq!(throttle.should_emit("api.unauthorized"), Some(2));
    }

    #[test]
    fn keys_are_throttled_independently() {
        let throttle = LogThrottle::new(Duration::from_secs(60));
        assert_eq!(throttle.should_emit("a"), Some(0));
        assert_eq!(throttle.should_emit("b"), Some(0));
        assert_eq!(throttle.should_emit("a"), None);
    }
}
