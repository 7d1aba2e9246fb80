use std::collections::{BTreeSet, HashSet, VecDeque};
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use indicatif::ProgressBar;
use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::{Client, Url};
use swbench_config::Configuration;

use crate::consts;
use crate::prelude::*;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, PartialEq)]
enum SitemapDocument {
    Index(Vec<String>),
    UrlSet(Vec<String>),
}

/// Listing and product URLs harvested from a sitemap.
#[derive(Debug, Default, PartialEq)]
pub struct Fixtures {
    pub listings: BTreeSet<String>,
    pub products: BTreeSet<String>,
}

impl Fixtures {
    /// Shopware category SEO URLs end in `/`, product URLs do not. The
    /// storefront root is neither.
    fn add(&mut self, url: &str) {
        let Ok(parsed) = Url::parse(url) else {
            debug!("Ignoring malformed sitemap url {}", url);
            return;
        };
        let path = parsed.path();
        if path.is_empty() || path == "/" {
            return;
        }
        if path.ends_with('/') {
            self.listings.insert(url.to_string());
        } else {
            self.products.insert(url.to_string());
        }
    }
}

/// Downloads `sitemap.xml` of the shop under test into the fixture cache
/// read by the Locust scripts.
#[derive(Default)]
pub struct SitemapFixtures {
    client: Client,
}

impl SitemapFixtures {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub fn fixtures_dir(config: &Configuration) -> PathBuf {
        config.data_directory().join(consts::FIXTURES_DIR)
    }

    /// Fetches the sitemap (following sitemap indexes and gzip-compressed
    /// child sitemaps) and rewrites the cached fixture files.
    pub async fn download(&self, config: &Configuration, pb: &ProgressBar) -> Result<Fixtures> {
        let root = format!(
            "{}/{}",
            config.scenario().host.trim_end_matches('/'),
            consts::SITEMAP_PATH
        );

        let mut fixtures = Fixtures::default();
        let mut queue = VecDeque::from([root]);
        let mut seen = HashSet::new();

        while let Some(url) = queue.pop_front() {
            if !seen.insert(url.clone()) {
                continue;
            }
            pb.set_message(format!("Fetching {}", url));
            let body = self.fetch(&url).await?;
            match parse_sitemap(&url, &body)? {
                SitemapDocument::Index(children) => {
                    debug!("{} lists {} sitemaps", url, children.len());
                    queue.extend(children);
                }
                SitemapDocument::UrlSet(urls) => {
                    debug!("{} lists {} urls", url, urls.len());
                    for u in urls {
                        fixtures.add(&u);
                    }
                }
            }
        }

        let dir = Self::fixtures_dir(config);
        tokio::fs::create_dir_all(&dir).await?;
        write_url_file(&dir.join(consts::LISTING_URLS_FILE), &fixtures.listings).await?;
        write_url_file(&dir.join(consts::PRODUCT_URLS_FILE), &fixtures.products).await?;

        info!(
            "Cached {} listing and {} product urls in {}",
            fixtures.listings.len(),
            fixtures.products.len(),
            dir.display()
        );
        Ok(fixtures)
    }

    /// True when either cached fixture file is missing or lists no url.
    pub async fn is_cached_empty(config: &Configuration) -> Result<bool> {
        let dir = Self::fixtures_dir(config);
        for file in [consts::LISTING_URLS_FILE, consts::PRODUCT_URLS_FILE] {
            let path = dir.join(file);
            let content = match tokio::fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!("Fixture file {} does not exist", path.display());
                    return Ok(true);
                }
                Err(e) => return Err(e.into()),
            };
            if content.lines().all(|l| l.trim().is_empty()) {
                debug!("Fixture file {} is empty", path.display());
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::SitemapStatus {
                url: url.to_string(),
                status,
            });
        }
        let bytes = response.bytes().await?;
        decode_body(url, &bytes)
    }
}

async fn write_url_file(path: &Path, urls: &BTreeSet<String>) -> Result<()> {
    let mut content = String::new();
    for url in urls {
        content.push_str(url);
        content.push('\n');
    }
    tokio::fs::write(path, content).await?;
    Ok(())
}

fn is_gzip_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().ends_with(".gz"),
        Err(_) => url.ends_with(".gz"),
    }
}

/// Inflates bodies served from a `.gz` location or starting with the gzip
/// magic bytes. Everything else is returned as is.
fn decode_body(url: &str, bytes: &[u8]) -> Result<Vec<u8>> {
    if !bytes.starts_with(&GZIP_MAGIC) && !is_gzip_url(url) {
        return Ok(bytes.to_vec());
    }
    let mut out = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut out)
        .map_err(|e| Error::SitemapParse {
            url: url.to_string(),
            message: format!("gzip: {e}"),
        })?;
    Ok(out)
}

fn parse_sitemap(url: &str, xml: &[u8]) -> Result<SitemapDocument> {
    let parse_err = |message: String| Error::SitemapParse {
        url: url.to_string(),
        message,
    };

    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut is_index = false;
    let mut current: Option<String> = None;
    let mut locs = Vec::new();

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| parse_err(e.to_string()))?
        {
            Event::Start(e) => match e.local_name().as_ref() {
                b"sitemapindex" => is_index = true,
                b"loc" => current = Some(String::new()),
                _ => {}
            },
            Event::Text(t) => {
                if let Some(loc) = current.as_mut() {
                    let text = t.unescape().map_err(|e| parse_err(e.to_string()))?;
                    loc.push_str(&text);
                }
            }
            Event::CData(c) => {
                if let Some(loc) = current.as_mut() {
                    loc.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(e) => {
                if e.local_name().as_ref() == b"loc" {
                    if let Some(loc) = current.take() {
                        let loc = loc.trim();
                        if !loc.is_empty() {
                            locs.push(loc.to_string());
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(if is_index {
        SitemapDocument::Index(locs)
    } else {
        SitemapDocument::UrlSet(locs)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use swbench_config::{Scenario, Tideways};
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(host: &str, dir: &TempDir) -> Configuration {
        let scenario = Scenario {
            host: host.to_string(),
            ..Default::default()
        };
        Configuration::new("sitemap", dir.path(), scenario, Tideways::default()).unwrap()
    }

    fn urlset(urls: &[String]) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#,
        );
        for u in urls {
            xml.push_str(&format!("<url><loc>{u}</loc><changefreq>hourly</changefreq></url>"));
        }
        xml.push_str("</urlset>");
        xml
    }

    fn gzip(data: &str) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn parses_urlset_and_index() {
        let doc = parse_sitemap(
            "test",
            br#"<urlset><url><loc> https://shop.example/Clothing/ </loc></url><url><loc><![CDATA[https://shop.example/Shirt/SW100]]></loc></url></urlset>"#,
        )
        .unwrap();
        assert_eq!(
            doc,
            SitemapDocument::UrlSet(vec![
                "https://shop.example/Clothing/".to_string(),
                "https://shop.example/Shirt/SW100".to_string(),
            ])
        );

        let doc = parse_sitemap(
            "test",
            br#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"><sitemap><loc>https://shop.example/sitemap/salesChannel-1-1.xml.gz</loc></sitemap></sitemapindex>"#,
        )
        .unwrap();
        assert_eq!(
            doc,
            SitemapDocument::Index(vec![
                "https://shop.example/sitemap/salesChannel-1-1.xml.gz".to_string()
            ])
        );
    }

    #[test]
    fn unescapes_entities_in_loc() {
        let doc = parse_sitemap(
            "test",
            b"<urlset><url><loc>https://shop.example/Search/?a=1&amp;b=2</loc></url></urlset>",
        )
        .unwrap();
        assert_eq!(
            doc,
            SitemapDocument::UrlSet(vec!["https://shop.example/Search/?a=1&b=2".to_string()])
        );
    }

    #[test]
    fn malformed_xml_is_an_error() {
        let err = parse_sitemap("https://shop.example/sitemap.xml", b"<urlset><url></urlset>")
            .unwrap_err();
        assert!(matches!(err, Error::SitemapParse { .. }));
    }

    #[test]
    fn classifies_listings_and_products() {
        let mut fixtures = Fixtures::default();
        for url in [
            "https://shop.example/",
            "https://shop.example",
            "https://shop.example/Clothing/",
            "https://shop.example/Clothing/Shirts/",
            "https://shop.example/Shirt/SW100",
            "not a url",
        ] {
            fixtures.add(url);
        }
        assert_eq!(
            fixtures.listings.into_iter().collect::<Vec<_>>(),
            vec![
                "https://shop.example/Clothing/",
                "https://shop.example/Clothing/Shirts/"
            ]
        );
        assert_eq!(
            fixtures.products.into_iter().collect::<Vec<_>>(),
            vec!["https://shop.example/Shirt/SW100"]
        );
    }

    #[test]
    fn plain_bodies_pass_through_and_gzip_is_inflated() {
        assert_eq!(decode_body("u", b"<urlset/>").unwrap(), b"<urlset/>");
        assert_eq!(decode_body("u", &gzip("<urlset/>")).unwrap(), b"<urlset/>");
    }

    #[test]
    fn gz_suffix_forces_gzip_decoding() {
        let url = "https://shop.example/sitemap/salesChannel-1.xml.gz?v=2";
        assert_eq!(decode_body(url, &gzip("<urlset/>")).unwrap(), b"<urlset/>");

        let err = decode_body(url, b"<urlset/>").unwrap_err();
        assert!(matches!(err, Error::SitemapParse { message, .. } if message.starts_with("gzip")));

        assert!(is_gzip_url("https://shop.example/a.xml.gz"));
        assert!(!is_gzip_url("https://shop.example/a.xml?f=b.gz"));
        assert!(is_gzip_url("relative/a.xml.gz"));
    }

    #[test]
    fn default_builds_a_usable_downloader() {
        let config = Configuration::new(
            "demo",
            "/tmp/swbench-demo",
            swbench_config::Scenario::default(),
            swbench_config::Tideways::default(),
        )
        .unwrap();
        let _fixtures = SitemapFixtures::default();
        assert_eq!(
            SitemapFixtures::fixtures_dir(&config),
            Path::new("/tmp/swbench-demo/fixtures")
        );
    }

    #[tokio::test]
    async fn downloads_index_and_gzipped_children() {
        let server = MockServer::start().await;
        let base = server.uri();

        let index = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"><sitemap><loc>{base}/sitemap/salesChannel-1.xml.gz</loc></sitemap><sitemap><loc>{base}/sitemap/salesChannel-2.xml</loc></sitemap></sitemapindex>"#
        );
        let first = urlset(&[
            format!("{base}/"),
            format!("{base}/Clothing/"),
            format!("{base}/Shirt/SW100"),
        ]);
        let second = urlset(&[format!("{base}/Shoes/"), format!("{base}/Shirt/SW100")]);

        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(index))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sitemap/salesChannel-1.xml.gz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(gzip(&first)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sitemap/salesChannel-2.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(second))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let config = config(&base, &dir);
        assert!(SitemapFixtures::is_cached_empty(&config).await.unwrap());

        let fixtures = SitemapFixtures::new()
            .download(&config, &ProgressBar::hidden())
            .await
            .unwrap();
        assert_eq!(fixtures.listings.len(), 2);
        assert_eq!(fixtures.products.len(), 1);

        let fixtures_dir = SitemapFixtures::fixtures_dir(&config);
        let listings = std::fs::read_to_string(fixtures_dir.join("listing_urls.csv")).unwrap();
        assert_eq!(listings, format!("{base}/Clothing/\n{base}/Shoes/\n"));
        let products = std::fs::read_to_string(fixtures_dir.join("product_urls.csv")).unwrap();
        assert_eq!(products, format!("{base}/Shirt/SW100\n"));

        assert!(!SitemapFixtures::is_cached_empty(&config).await.unwrap());
    }

    #[tokio::test]
    async fn empty_sitemap_leaves_cache_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(urlset(&[])))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let config = config(&server.uri(), &dir);
        SitemapFixtures::new()
            .download(&config, &ProgressBar::hidden())
            .await
            .unwrap();
        assert!(SitemapFixtures::is_cached_empty(&config).await.unwrap());
    }

    #[tokio::test]
    async fn http_error_is_reported_with_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let config = config(&server.uri(), &dir);
        let err = SitemapFixtures::new()
            .download(&config, &ProgressBar::hidden())
            .await
            .unwrap_err();
        match err {
            Error::SitemapStatus { url, status } => {
                assert!(url.ends_with("/sitemap.xml"));
                assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
