/// Token-bucket limiter for outbound lookup calls.
///
/// The lookup endpoint is rate limited per session; the cache absorbs
/// most of the pressure, this bucket bounds what still goes out.
/// Callers `await` on `acquire()` before sending; the call returns
/// immediately when a token is available, or sleeps until the next
/// refill tick.
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

struct RateLimiter {
    /// Maximum tokens in the bucket (= burst capacity).
    capacity: u32,
    /// Current available tokens.
    tokens: f64,
    /// Tokens added per second.
    refill_rate: f64,
    /// Last time tokens were refilled.
    last_refill: Instant,
}

impl RateLimiter {
    fn new(capacity: u32, per_second: f64) -> Self {
        Self {
            capacity,
            tokens: capacity as f64,
            refill_rate: per_second,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity as f64);
        self.last_refill = now;
    }

    /// Try to consume one token. Returns the wait duration if no token
    /// is available.
    fn try_consume(&mut self) -> Option<Duration> {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            None
        } else {
            let needed = 1.0 - self.tokens;
            let wait_secs = needed / self.refill_rate;
            Some(Duration::from_secs_f64(wait_secs))
        }
    }
}

/// Thread-safe wrapper around `RateLimiter`.
pub struct LookupLimiter(Mutex<RateLimiter>);

impl LookupLimiter {
    pub fn new(capacity: u32, per_second: f64) -> Self {
        Self(Mutex::new(RateLimiter::new(capacity, per_second)))
    }

    /// Acquire one send token, sleeping if necessary.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut inner = self.0.lock().await;
                inner.try_consume()
            };
            match wait {
                None => return,
                Some(d) => tokio::time::sleep(d).await,
            }
        }
    }
}
