use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use hdrhistogram::Histogram;

use crate::{Error, Result};

/// Page key under which the aggregate over all pages is stored.
pub const OVERALL: &str = "overall";

/// Request latencies of one Locust run, keyed by page.
///
/// `page_by_time` maps a page to its histograms per time bucket,
/// `page_summary` maps a page to the histogram over the whole run.
#[derive(Debug, Clone, Default)]
pub struct LocustStats {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub page_by_time: HashMap<String, BTreeMap<String, Histogram<u64>>>,
    pub page_summary: HashMap<String, Histogram<u64>>,
}

impl LocustStats {
    pub fn new(
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
        page_by_time: HashMap<String, BTreeMap<String, Histogram<u64>>>,
        page_summary: HashMap<String, Histogram<u64>>,
    ) -> Self {
        Self {
            start_date,
            end_date,
            page_by_time,
            page_summary,
        }
    }

    /// Number of requests recorded in the `overall` summary.
    pub fn total_requests(&self) -> Result<u64> {
        self.page_summary
            .get(OVERALL)
            .map(|h| h.len())
            .ok_or_else(|| Error::MissingSummary(OVERALL.to_string()))
    }
}
