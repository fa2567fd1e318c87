/// Wall-clock access, injectable so throttle windows are testable.
pub trait ClockPort: Send + Sync {
    fn now_ms(&self) -> i64;
}
