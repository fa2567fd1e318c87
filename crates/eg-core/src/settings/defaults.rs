use super::model::*;

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            auto_advance_enabled: false,
            auto_advance_interval_minutes: DEFAULT_INTERVAL_MINUTES,
        }
    }
}
