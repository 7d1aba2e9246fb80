use std::fmt;
use std::path::Path;

use swbench_config::{Configuration, ExecutionMode};

use crate::consts;
use crate::exec::ProcessSpec;

/// Command line and environment of one headless Locust run.
pub struct LocustCommand<'a> {
    config: &'a Configuration,
    mode: ExecutionMode,
    working_dir: &'a Path,
    duration: &'a str,
}

impl<'a> LocustCommand<'a> {
    pub fn new(config: &'a Configuration, mode: ExecutionMode, working_dir: &'a Path) -> Self {
        Self {
            config,
            mode,
            working_dir,
            duration: &config.scenario().duration,
        }
    }

    /// Replaces the scenario's duration. `None` and blank values keep it.
    pub fn with_duration(mut self, duration: Option<&'a str>) -> Self {
        if let Some(d) = duration.map(str::trim).filter(|d| !d.is_empty()) {
            self.duration = d;
        }
        self
    }

    pub fn duration(&self) -> &str {
        self.duration
    }

    fn entry_point(&self) -> (String, Vec<String>) {
        match self.mode {
            ExecutionMode::Docker => (
                consts::DOCKER_COMPOSE_BIN.to_string(),
                vec![
                    "run".to_string(),
                    consts::DOCKER_COMPOSE_SERVICE.to_string(),
                    "-f".to_string(),
                    consts::DOCKER_LOCUSTFILE.to_string(),
                ],
            ),
            ExecutionMode::Local => (
                consts::LOCAL_LOCUST_BIN.to_string(),
                vec![
                    "-f".to_string(),
                    self.working_dir
                        .join(consts::LOCUSTFILE)
                        .to_string_lossy()
                        .into_owned(),
                ],
            ),
        }
    }

    fn flags(&self) -> Vec<String> {
        let scenario = self.config.scenario();
        vec![
            "--headless".to_string(),
            format!("--host={}", scenario.host),
            "-u".to_string(),
            scenario.concurrent_threads.to_string(),
            "-r".to_string(),
            scenario.user_spawn_rate.to_string(),
            "-t".to_string(),
            self.duration.to_string(),
            "--autostart".to_string(),
            "--autoquit".to_string(),
            consts::LOCUST_AUTOQUIT_SECS.to_string(),
            format!("--csv={}", self.config.name()),
            "--csv-full-history".to_string(),
            "--print-stats".to_string(),
        ]
    }

    fn env(&self) -> Vec<(String, String)> {
        let scenario = self.config.scenario();
        let tideways = self.config.tideways();
        let vars: [(&str, String); 16] = [
            ("SWBENCH_NAME", self.config.name().to_string()),
            (
                "SWBENCH_DATA_DIR",
                self.config.data_directory().to_string_lossy().into_owned(),
            ),
            ("LOCUST_TIDEWAYS_APIKEY", tideways.api_key.clone()),
            (
                "LOCUST_TIDEWAYS_TRACE_RATE",
                tideways.trace_sample_rate.to_string(),
            ),
            ("LOCUST_GUEST_RATIO", scenario.browsing_guest_ratio.to_string()),
            (
                "LOCUST_ACCOUNTS_NEW_RATIO",
                scenario.browsing_accounts_new_ratio.to_string(),
            ),
            (
                "LOCUST_CHECKOUT_GUEST_RATIO",
                scenario.checkout_guest_ratio.to_string(),
            ),
            (
                "LOCUST_CHECKOUT_ACCOUNTS_NEW_RATIO",
                scenario.checkout_accounts_new_ratio.to_string(),
            ),
            (
                "LOCUST_FILTERER_MIN_FILTERS",
                scenario.filterer_min_filters.to_string(),
            ),
            (
                "LOCUST_FILTERER_MAX_FILTERS",
                scenario.filterer_max_filters.to_string(),
            ),
            (
                "LOCUST_FILTERER_VISIT_PRODUCT_RATIO",
                scenario.filterer_visit_product_ratio.to_string(),
            ),
            (
                "LOCUST_MAX_PAGINATION_SURFING",
                scenario.max_pagination_surfing.to_string(),
            ),
            ("SWBENCH_PURCHASER_WEIGHT", scenario.conversion_ratio.to_string()),
            (
                "SWBENCH_CART_ABANDONMENT_WEIGHT",
                scenario.cart_abandonment_ratio.to_string(),
            ),
            (
                "SWBENCH_BROWSING_USER_WEIGHT",
                scenario.browsing_user_weight().to_string(),
            ),
            // Reporting parses Locust timestamps as UTC.
            ("TZ", "UTC".to_string()),
        ];
        vars.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    pub fn to_spec(&self) -> ProcessSpec {
        let (program, mut args) = self.entry_point();
        args.extend(self.flags());
        ProcessSpec {
            program,
            args,
            env: self.env(),
            current_dir: self.working_dir.to_path_buf(),
        }
    }
}

impl fmt::Display for LocustCommand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_spec())
    }
}
