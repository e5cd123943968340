//! Entitlement and allowance types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A usage limit for a (service, tier) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// No cap on usage
    Unlimited,
    /// At most this many units per window
    Finite(u32),
}

impl Limit {
    /// Whether this limit never denies
    pub const fn is_unlimited(&self) -> bool {
        matches!(self, Self::Unlimited)
    }

    /// The finite cap, if any
    pub const fn cap(&self) -> Option<u32> {
        match self {
            Self::Unlimited => None,
            Self::Finite(n) => Some(*n),
        }
    }
}

impl std::fmt::Display for Limit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unlimited => write!(f, "unlimited"),
            Self::Finite(n) => write!(f, "{n}"),
        }
    }
}

/// The two quota windows applied to every metered service.
///
/// These are intentionally separate: the hourly window is an abuse
/// throttle, the monthly window is the user-visible allowance. Their
/// limit tables carry different numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaWindow {
    /// Rolling 1 hour, gates individual actions
    Hourly,
    /// Rolling 30 days, the displayed allowance
    Monthly,
}

impl QuotaWindow {
    /// Length of the sliding window
    pub fn duration(&self) -> Duration {
        match self {
            Self::Hourly => Duration::hours(1),
            Self::Monthly => Duration::days(30),
        }
    }

    /// Window start for a check performed at `now`
    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.duration()
    }
}

impl std::fmt::Display for QuotaWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hourly => write!(f, "hourly"),
            Self::Monthly => write!(f, "monthly"),
        }
    }
}

/// Result of an allowance check for a (user, service) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allowance {
    /// Whether the action may proceed
    pub allowed: bool,
    /// Remaining units in the window; `None` means unlimited
    pub remaining: Option<u32>,
    /// Approximate sliding-window reset time
    pub resets_at: DateTime<Utc>,
}

impl Allowance {
    /// An always-allowed result for unlimited entitlements
    pub fn unlimited(now: DateTime<Utc>, window: QuotaWindow) -> Self {
        Self {
            allowed: true,
            remaining: None,
            resets_at: now + window.duration(),
        }
    }

    /// A result for a finite limit with `used` units already consumed
    pub fn finite(limit: u32, used: i64, now: DateTime<Utc>, window: QuotaWindow) -> Self {
        let remaining = (i64::from(limit) - used).max(0) as u32;
        Self {
            allowed: remaining > 0,
            remaining: Some(remaining),
            resets_at: now + window.duration(),
        }
    }

    /// A denied result, used when gating must fail closed
    pub fn denied(now: DateTime<Utc>, window: QuotaWindow) -> Self {
        Self {
            allowed: false,
            remaining: Some(0),
            resets_at: now + window.duration(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_allowance_floors_at_zero() {
        let now = Utc::now();
        let a = Allowance::finite(3, 5, now, QuotaWindow::Monthly);
        assert!(!a.allowed);
        assert_eq!(a.remaining, Some(0));
    }

    #[test]
    fn finite_allowance_counts_down() {
        let now = Utc::now();
        let a = Allowance::finite(3, 1, now, QuotaWindow::Hourly);
        assert!(a.allowed);
        assert_eq!(a.remaining, Some(2));
        assert_eq!(a.resets_at, now + Duration::hours(1));
    }

    #[test]
    fn unlimited_allowance_always_allows() {
        let a = Allowance::unlimited(Utc::now(), QuotaWindow::Monthly);
        assert!(a.allowed);
        assert_eq!(a.remaining, None);
    }
}
