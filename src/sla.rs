use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum SlaBand {
    Breached,
    Critical,
    Warning,
    Normal,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlaCountdown {
    pub band: SlaBand,
    pub label: String,
}

/// Countdown to an SLA deadline, banded by severity. Takes `now` explicitly
/// so list rendering and tests agree on the reference instant.
pub fn countdown(deadline: DateTime<Utc>, now: DateTime<Utc>) -> SlaCountdown {
    let remaining = deadline - now;
    let minutes = remaining.num_minutes();

    if minutes < 0 {
        return SlaCountdown {
            band: SlaBand::Breached,
            label: "SLA breached".to_string(),
        };
    }

    if minutes < 2 * 60 {
        return SlaCountdown {
            band: SlaBand::Critical,
            label: format!("{minutes} min left"),
        };
    }

    if minutes < 24 * 60 {
        return SlaCountdown {
            band: SlaBand::Warning,
            label: format!("{} h left", remaining.num_hours()),
        };
    }

    SlaCountdown {
        band: SlaBand::Normal,
        label: format!("{} d left", remaining.num_days()),
    }
}
