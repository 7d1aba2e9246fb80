use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

static DURATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d+|(?:\d+h)?(?:\d+m)?(?:\d+s)?)$").expect("duration pattern is valid")
});

/// Traffic shape and mix of a single benchmark run.
///
/// Ratios are percentages. They are handed to the Locust scripts unchanged,
/// except for the browsing-user weight which is derived from
/// `conversion_ratio` and `cart_abandonment_ratio`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Scenario {
    pub host: String,
    pub duration: String,
    pub concurrent_threads: u32,
    pub user_spawn_rate: f64,
    pub browsing_guest_ratio: f64,
    pub browsing_accounts_new_ratio: f64,
    pub checkout_guest_ratio: f64,
    pub checkout_accounts_new_ratio: f64,
    pub filterer_min_filters: u32,
    pub filterer_max_filters: u32,
    pub filterer_visit_product_ratio: f64,
    pub max_pagination_surfing: u32,
    pub conversion_ratio: f64,
    pub cart_abandonment_ratio: f64,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            host: String::new(),
            duration: "10m".to_string(),
            concurrent_threads: 10,
            user_spawn_rate: 1.0,
            browsing_guest_ratio: 60.0,
            browsing_accounts_new_ratio: 20.0,
            checkout_guest_ratio: 50.0,
            checkout_accounts_new_ratio: 50.0,
            filterer_min_filters: 1,
            filterer_max_filters: 3,
            filterer_visit_product_ratio: 20.0,
            max_pagination_surfing: 3,
            conversion_ratio: 2.0,
            cart_abandonment_ratio: 3.0,
        }
    }
}

impl Scenario {
    /// Share of users that only browse: whatever is left after purchasers
    /// and cart abandoners.
    pub fn browsing_user_weight(&self) -> f64 {
        100.0 - self.conversion_ratio - self.cart_abandonment_ratio
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::Invalid("scenario.host must be set".into()));
        }
        if !self.host.starts_with("http://") && !self.host.starts_with("https://") {
            return Err(Error::Invalid(format!(
                "scenario.host must start with http:// or https://, got '{}'",
                self.host
            )));
        }
        validate_duration(&self.duration)?;

        if self.concurrent_threads == 0 {
            return Err(Error::Invalid(
                "scenario.concurrentThreads must be at least 1".into(),
            ));
        }
        if self.user_spawn_rate <= 0.0 || !self.user_spawn_rate.is_finite() {
            return Err(Error::Invalid(
                "scenario.userSpawnRate must be greater than 0".into(),
            ));
        }

        let ratios = [
            ("browsingGuestRatio", self.browsing_guest_ratio),
            ("browsingAccountsNewRatio", self.browsing_accounts_new_ratio),
            ("checkoutGuestRatio", self.checkout_guest_ratio),
            ("checkoutAccountsNewRatio", self.checkout_accounts_new_ratio),
            ("filtererVisitProductRatio", self.filterer_visit_product_ratio),
            ("conversionRatio", self.conversion_ratio),
            ("cartAbandonmentRatio", self.cart_abandonment_ratio),
        ];
        for (key, value) in ratios {
            check_percentage(&format!("scenario.{key}"), value)?;
        }

        if self.browsing_user_weight() < 0.0 {
            return Err(Error::Invalid(format!(
                "scenario.conversionRatio ({}) + scenario.cartAbandonmentRatio ({}) exceeds 100",
                self.conversion_ratio, self.cart_abandonment_ratio
            )));
        }
        if self.filterer_min_filters > self.filterer_max_filters {
            return Err(Error::Invalid(format!(
                "scenario.filtererMinFilters ({}) is greater than scenario.filtererMaxFilters ({})",
                self.filterer_min_filters, self.filterer_max_filters
            )));
        }
        Ok(())
    }
}

/// Tideways reporting settings forwarded to the Locust scripts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tideways {
    pub api_key: String,
    pub trace_sample_rate: f64,
}

impl Tideways {
    pub fn validate(&self) -> Result<()> {
        check_percentage("tideways.traceSampleRate", self.trace_sample_rate)
    }
}

/// Checks a run time in the format Locust's `-t` accepts, e.g. `300`, `300s`,
/// `20m` or `1h30m`.
pub fn validate_duration(duration: &str) -> Result<()> {
    let duration = duration.trim();
    if duration.is_empty() || !DURATION_PATTERN.is_match(duration) {
        return Err(Error::Invalid(format!(
            "invalid duration '{duration}', expected e.g. 300s, 20m or 1h30m"
        )));
    }
    Ok(())
}

fn check_percentage(key: &str, value: f64) -> Result<()> {
    if !(0.0..=100.0).contains(&value) {
        return Err(Error::Invalid(format!(
            "{key} must be between 0 and 100, got {value}"
        )));
    }
    Ok(())
}
