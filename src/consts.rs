pub const DEFAULT_CONFIG_FILE: &str = "default.json";

pub const LOCUSTFILE: &str = "locustfile.py";
pub const LOCAL_LOCUST_BIN: &str = "locust";
pub const DOCKER_COMPOSE_BIN: &str = "docker-compose";
pub const DOCKER_COMPOSE_SERVICE: &str = "master";
pub const DOCKER_LOCUSTFILE: &str = "/mnt/locust/locustfile.py";
pub const LOCUST_AUTOQUIT_SECS: u64 = 5;

pub const RESULT_FILE_SUFFIXES: [&str; 5] = [
    "_exceptions.csv",
    "_failures.csv",
    "_stats.csv",
    "_stats_history.csv",
    "_requests.csv",
];

pub const SITEMAP_PATH: &str = "sitemap.xml";
pub const FIXTURES_DIR: &str = "fixtures";
pub const LISTING_URLS_FILE: &str = "listing_urls.csv";
pub const PRODUCT_URLS_FILE: &str = "product_urls.csv";
