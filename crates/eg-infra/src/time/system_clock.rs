use eg_core::ports::ClockPort;

/// Wall clock for production wiring; tests inject their own.
pub struct SystemClock;

impl ClockPort for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}
