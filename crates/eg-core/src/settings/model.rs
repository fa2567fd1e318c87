use serde::{Deserialize, Serialize};

/// Lowest accepted auto-advance interval.
pub const MIN_INTERVAL_MINUTES: u32 = 1;

/// Highest accepted auto-advance interval (4 hours).
pub const MAX_INTERVAL_MINUTES: u32 = 240;

/// Interval used when the stored value is out of bounds.
pub const DEFAULT_INTERVAL_MINUTES: u32 = 5;

/// Per-user display preferences as persisted by the backend.
///
/// Field names on the wire keep the backend's `auto_reload_*` vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySettings {
    /// Whether the unattended advance cycle runs at all.
    #[serde(rename = "auto_reload_enabled")]
    pub auto_advance_enabled: bool,

    /// Minutes between unattended advances.
    #[serde(rename = "auto_reload_interval_minutes")]
    pub auto_advance_interval_minutes: u32,
}

impl DisplaySettings {
    /// Whether the stored interval is inside the accepted bounds.
    pub fn interval_is_valid(&self) -> bool {
        (MIN_INTERVAL_MINUTES..=MAX_INTERVAL_MINUTES)
            .contains(&self.auto_advance_interval_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_bounds() {
        let mut settings = DisplaySettings::default();

        settings.auto_advance_interval_minutes = 0;
        assert!(!settings.interval_is_valid());

        settings.auto_advance_interval_minutes = 1;
        assert!(settings.interval_is_valid());

        settings.auto_advance_interval_minutes = 240;
        assert!(settings.interval_is_valid());

        settings.auto_advance_interval_minutes = 241;
        assert!(!settings.interval_is_valid());
    }

    #[test]
    fn wire_names_match_backend() {
        let settings = DisplaySettings {
            auto_advance_enabled: true,
            auto_advance_interval_minutes: 15,
        };

        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["auto_reload_enabled"], true);
        assert_eq!(json["auto_reload_interval_minutes"], 15);
    }
}
