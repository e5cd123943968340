//! Property-based tests for allowance arithmetic
//!
//! Verify the invariants the evaluator relies on:
//! - remaining is always `max(0, limit - used)`
//! - allowed is equivalent to `remaining > 0`
//! - every (service, tier, window) resolves against the builtin catalog

use chrono::Utc;
use proptest::prelude::*;

use careerpro_entitlements::PlanCatalog;
use careerpro_types::{Allowance, Limit, QuotaWindow, Service, Tier};

fn arb_service() -> impl Strategy<Value = Service> {
    prop_oneof![
        Just(Service::Cv),
        Just(Service::CoverLetter),
        Just(Service::Email),
        Just(Service::Interview),
    ]
}

fn arb_tier() -> impl Strategy<Value = Tier> {
    prop_oneof![Just(Tier::Free), Just(Tier::Pro), Just(Tier::Enterprise)]
}

fn arb_window() -> impl Strategy<Value = QuotaWindow> {
    prop_oneof![Just(QuotaWindow::Hourly), Just(QuotaWindow::Monthly)]
}

proptest! {
    /// Property: remaining is floored at zero and never exceeds the limit
    #[test]
    fn prop_remaining_is_bounded(limit in 0u32..10_000, used in 0i64..1_000_000) {
        let allowance = Allowance::finite(limit, used, Utc::now(), QuotaWindow::Monthly);
        let remaining = allowance.remaining.unwrap();
        prop_assert!(remaining <= limit);
        prop_assert_eq!(i64::from(remaining), (i64::from(limit) - used).max(0));
    }

    /// Property: allowed exactly when something remains
    #[test]
    fn prop_allowed_iff_remaining(limit in 0u32..10_000, used in 0i64..20_000) {
        let allowance = Allowance::finite(limit, used, Utc::now(), QuotaWindow::Hourly);
        prop_assert_eq!(allowance.allowed, allowance.remaining.unwrap() > 0);
    }

    /// Property: the reset time is now plus the window length
    #[test]
    fn prop_reset_is_window_end(limit in 1u32..100, used in 0i64..100, window in arb_window()) {
        let now = Utc::now();
        let allowance = Allowance::finite(limit, used, now, window);
        prop_assert_eq!(allowance.resets_at, now + window.duration());
    }

    /// Property: the builtin catalog resolves every combination
    #[test]
    fn prop_builtin_catalog_total(
        service in arb_service(),
        tier in arb_tier(),
        window in arb_window(),
    ) {
        let catalog = PlanCatalog::builtin();
        // Resolution must be a real entry: enterprise is unlimited, and
        // finite entries are nonzero (a zero limit would brick a tool).
        match catalog.resolve(service, tier, window) {
            Limit::Unlimited => {}
            Limit::Finite(n) => prop_assert!(n > 0),
        }
    }
}
