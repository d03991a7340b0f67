//! Token bucket and sliding-window request admission control.
//!
//! Two complementary limiter shapes, selected per provider/operation:
//! a [`TokenBucket`] for burst-tolerant throughput limiting, and a
//! [`SlidingWindowLimiter`] for a hard cap on requests within a rolling
//! window. Both are safe to share across tasks via `Arc`.

use tokio::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};
use tracing::debug;

/// Burst-tolerant limiter: `capacity` tokens refill continuously at
/// `refill_rate` tokens/second, each admitted request consumes one or more
/// tokens.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    refill_rate: f64,
    inner: Mutex<TokenBucketState>,
}

#[derive(Debug)]
struct TokenBucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    #[must_use]
    pub fn new(capacity: f64, refill_rate: f64) -> Self {
        Self {
            capacity,
            refill_rate,
            inner: Mutex::new(TokenBucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    fn refill(state: &mut TokenBucketState, capacity: f64, refill_rate: f64) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        if elapsed > 0.0 {
            state.tokens = (state.tokens + elapsed * refill_rate).min(capacity);
            state.last_refill = now;
        }
    }

    /// Block until `tokens` are available, then consume them.
    pub async fn acquire(&self, tokens: f64) {
        loop {
            let wait = {
                let mut state = self.inner.lock().await;
                Self::refill(&mut state, self.capacity, self.refill_rate);

                if state.tokens >= tokens {
                    state.tokens -= tokens;
                    return;
                }

                let deficit = tokens - state.tokens;
                Duration::from_secs_f64((deficit / self.refill_rate).max(0.0))
            };

            debug!("token bucket exhausted, waiting {:?}", wait);
            sleep(wait).await;
        }
    }

    /// Non-blocking variant: consumes `tokens` and returns `true` if enough
    /// were available, otherwise leaves the bucket untouched and returns
    /// `false`.
    pub async fn try_acquire(&self, tokens: f64) -> bool {
        let mut state = self.inner.lock().await;
        Self::refill(&mut state, self.capacity, self.refill_rate);

        if state.tokens >= tokens {
            state.tokens -= tokens;
            true
        } else {
            false
        }
    }

    pub async fn available(&self) -> f64 {
        let mut state = self.inner.lock().await;
        Self::refill(&mut state, self.capacity, self.refill_rate);
        state.tokens
    }
}

/// Hard cap of `max_requests` within a rolling `window`.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    max_requests: usize,
    window: Duration,
    timestamps: Mutex<std::collections::VecDeque<Instant>>,
}

impl SlidingWindowLimiter {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            timestamps: Mutex::new(std::collections::VecDeque::new()),
        }
    }

    fn evict_stale(timestamps: &mut std::collections::VecDeque<Instant>, window: Duration) {
        let now = Instant::now();
        while let Some(front) = timestamps.front() {
            if now.duration_since(*front) >= window {
                timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// Block until admission is possible, then record this request.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut timestamps = self.timestamps.lock().await;
                Self::evict_stale(&mut timestamps, self.window);

                if timestamps.len() < self.max_requests {
                    timestamps.push_back(Instant::now());
                    return;
                }

                let oldest = *timestamps.front().expect("non-empty when at capacity");
                self.window.saturating_sub(Instant::now().duration_since(oldest))
            };

            debug!("sliding window full, waiting {:?}", wait);
            sleep(wait).await;
        }
    }

    /// Non-blocking variant: records the request and returns `true` if
    /// under the limit, otherwise returns `false` without recording it.
    pub async fn try_acquire(&self) -> bool {
        let mut timestamps = self.timestamps.lock().await;
        Self::evict_stale(&mut timestamps, self.window);

        if timestamps.len() < self.max_requests {
            timestamps.push_back(Instant::now());
            true
        } else {
            false
        }
    }
}
