//! Entitlement catalog
//!
//! Static table of per-window limits for every (service, tier) pair.
//! The hourly and monthly tables carry different numbers on purpose:
//! the hourly table throttles bursts, the monthly table is the
//! allowance users see. Both are operator-edited configuration.

use std::collections::HashMap;

use thiserror::Error;

use careerpro_types::{Limit, QuotaWindow, Service, Tier};

type PlanKey = (Service, Tier);

/// Catalog configuration errors, fatal at startup
#[derive(Error, Debug)]
pub enum CatalogError {
    /// A (service, tier) pair has no limit in one of the windows
    #[error("no {window} limit configured for ({service}, {tier})")]
    MissingEntry {
        service: Service,
        tier: Tier,
        window: QuotaWindow,
    },
}

/// Static limit tables for both quota windows
#[derive(Debug, Clone)]
pub struct PlanCatalog {
    monthly: HashMap<PlanKey, Limit>,
    hourly: HashMap<PlanKey, Limit>,
}

impl PlanCatalog {
    /// The shipped limit tables.
    ///
    /// Monthly: the user-facing allowance per tool. Hourly: the abuse
    /// throttle, sized so normal use never hits it.
    pub fn builtin() -> Self {
        use Limit::{Finite, Unlimited};
        use Service::{CoverLetter, Cv, Email, Interview};

        let mut monthly = HashMap::new();
        let mut hourly = HashMap::new();

        for (service, free, pro) in [
            (Cv, Finite(1), Unlimited),
            (CoverLetter, Finite(1), Finite(25)),
            (Email, Finite(3), Unlimited),
            (Interview, Finite(2), Unlimited),
        ] {
            monthly.insert((service, Tier::Free), free);
            monthly.insert((service, Tier::Pro), pro);
            monthly.insert((service, Tier::Enterprise), Unlimited);
        }

        for (service, free, pro) in [
            (Cv, Finite(2), Finite(10)),
            (CoverLetter, Finite(2), Finite(10)),
            (Email, Finite(5), Finite(20)),
            (Interview, Finite(3), Finite(10)),
        ] {
            hourly.insert((service, Tier::Free), free);
            hourly.insert((service, Tier::Pro), pro);
            hourly.insert((service, Tier::Enterprise), Unlimited);
        }

        Self { monthly, hourly }
    }

    /// Build a catalog from explicit tables, rejecting incomplete ones.
    pub fn from_tables(
        monthly: HashMap<PlanKey, Limit>,
        hourly: HashMap<PlanKey, Limit>,
    ) -> Result<Self, CatalogError> {
        let catalog = Self { monthly, hourly };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Verify that every (service, tier) pair has a limit in both windows.
    ///
    /// Run once at startup; a gap here must abort the process rather than
    /// surface as a per-request failure.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for window in [QuotaWindow::Hourly, QuotaWindow::Monthly] {
            let table = self.table(window);
            for service in Service::ALL {
                for tier in Tier::ALL {
                    if !table.contains_key(&(service, tier)) {
                        return Err(CatalogError::MissingEntry {
                            service,
                            tier,
                            window,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Look up the limit for a (service, tier) pair in one window.
    ///
    /// Tables are validated complete at startup; a missing entry fails
    /// closed.
    pub fn resolve(&self, service: Service, tier: Tier, window: QuotaWindow) -> Limit {
        self.table(window)
            .get(&(service, tier))
            .copied()
            .unwrap_or(Limit::Finite(0))
    }

    fn table(&self, window: QuotaWindow) -> &HashMap<PlanKey, Limit> {
        match window {
            QuotaWindow::Hourly => &self.hourly,
            QuotaWindow::Monthly => &self.monthly,
        }
    }
}
