// tests/pipeline.rs
use std::path::PathBuf;

use jobscrape::store::StoreState;
use jobscrape::{
    export_snapshot, scrape_page, FileBackend, JobStore, ListingRecord, MemoryBackend, Registry,
    ScrapeError, ScrapeOptions, Snapshot,
};

const UPWORK_URL: &str = "https://www.upwork.com/nx/search/jobs/?q=rust&page=2";
const FREELANCER_URL: &str = "https://www.freelancer.com/jobs/php/";

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {}", path.display(), e))
}

fn scrape(name: &str, url: &str) -> jobscrape::ScrapeBatch {
    let registry = Registry::builtin().unwrap();
    scrape_page(&fixture(name), url, &registry, &ScrapeOptions::default()).unwrap()
}

fn find<'a>(records: &'a [ListingRecord], id: &str) -> &'a ListingRecord {
    records
        .iter()
        .find(|r| r.id == id)
        .unwrap_or_else(|| panic!("no record {}", id))
}

#[test]
fn upwork_page_extracts_and_counts() {
    let batch = scrape("upwork_search.html", UPWORK_URL);

    assert_eq!(batch.source, "upwork.com");
    assert_eq!(batch.records.len(), 3);
    assert_eq!(batch.skipped, 1, "promo tile has no title");
    assert_eq!(batch.failed, 1, "tile with a linkless title");

    let first = find(&batch.records, "021700000000000001");
    assert_eq!(first.title, "Rust backend for trading bot");
    assert_eq!(
        first.url,
        "https://www.upwork.com/jobs/Rust-backend-for-trading-bot_~021700000000000001?referrer_url_path=%2Fnx%2Fsearch%2Fjobs%2F"
    );
    assert_eq!(first.budget, "$1,200");
    assert_eq!(first.posted, "12 minutes ago");
    assert_eq!(first.skills, vec!["Rust", "Tokio"]);
    assert_eq!(first.metadata["location"].as_deref(), Some("United States"));
    assert_eq!(first.metadata["experience"].as_deref(), Some("Expert"));
    assert_eq!(first.metadata["proposals"].as_deref(), Some("Less than 5"));
    assert_eq!(first.metadata["averageBid"], None);

    let sparse = find(&batch.records, "021700000000000002");
    assert_eq!(sparse.description, "");
    assert_eq!(sparse.budget, "");
    assert!(sparse.skills.is_empty());
    assert_eq!(sparse.metadata["experience"].as_deref(), Some("Intermediate"));

    let trimmed = find(&batch.records, "021700000000000004");
    assert_eq!(trimmed.description, "Small clap-based utility.");
}

#[test]
fn freelancer_page_extracts_with_expansion_and_fallback_id() {
    let batch = scrape("freelancer_jobs.html", FREELANCER_URL);

    assert_eq!(batch.source, "freelancer.com");
    assert_eq!(batch.records.len(), 3);
    assert_eq!(batch.skipped + batch.failed, 0);

    let checkout = find(&batch.records, "39900001");
    assert_eq!(checkout.url, "https://www.freelancer.com/projects/php/ecommerce-39900001");
    assert_eq!(
        checkout.description,
        "The checkout page throws an error when a coupon is applied. Need a fix today."
    );
    assert_eq!(checkout.skills, vec!["PHP", "WooCommerce"]);
    assert_eq!(checkout.metadata["proposals"].as_deref(), Some("14 bids"));
    assert_eq!(checkout.metadata["averageBid"].as_deref(), Some("$120 USD"));
    assert_eq!(checkout.metadata["clientRating"].as_deref(), Some("4.8"));
    assert_eq!(checkout.metadata["location"], None);

    let bare = find(&batch.records, "39900002");
    assert_eq!(bare.description, "");
    assert_eq!(bare.metadata["clientRating"].as_deref(), Some(""));

    // hyphenated slug: identity widens to the whole URL
    let url = "https://www.freelancer.com/projects/php/build-a-website-39900003";
    let site = find(&batch.records, url);
    assert_eq!(site.description, "Simple brochure site.");
}

#[test]
fn every_record_has_the_same_shape() {
    let mut records = scrape("upwork_search.html", UPWORK_URL).records;
    records.extend(scrape("freelancer_jobs.html", FREELANCER_URL).records);

    for record in &records {
        let keys: Vec<&str> = record.metadata.keys().map(|k| k.as_str()).collect();
        assert_eq!(
            keys,
            vec!["averageBid", "clientRating", "experience", "location", "proposals"]
        );
        assert!(record.url.starts_with("https://"));
        assert!(chrono::DateTime::parse_from_rfc3339(&record.timestamp).is_ok());
    }
}

#[test]
fn rescraping_the_same_page_adds_nothing() {
    let store = JobStore::new(MemoryBackend::new());
    store.init().unwrap();

    let first = scrape("upwork_search.html", UPWORK_URL);
    let batch_size = first.records.len();
    let stats = store.merge_batch(first.records).unwrap();
    assert_eq!(stats.new, batch_size);

    let again = scrape("upwork_search.html", UPWORK_URL);
    let stats = store.merge_batch(again.records).unwrap();
    assert_eq!(stats.new, 0);
    assert_eq!(stats.duplicates, batch_size);
    assert_eq!(store.len().unwrap(), batch_size);
}

#[test]
fn two_sites_coexist_in_one_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = JobStore::new(FileBackend::new(dir.path().join("store.json")));
    store.init().unwrap();
    assert_eq!(store.state().unwrap(), StoreState::Empty);

    store
        .merge_batch(scrape("upwork_search.html", UPWORK_URL).records)
        .unwrap();
    let stats = store
        .merge_batch(scrape("freelancer_jobs.html", FREELANCER_URL).records)
        .unwrap();

    assert_eq!(stats.new + 3, stats.total);
    assert_eq!(stats.new + stats.duplicates, stats.batch);
    let counts = store.counts_by_source().unwrap();
    assert_eq!(counts["upwork.com"], 3);
    assert_eq!(counts["freelancer.com"], 3);

    let out = dir.path().join("jobs_export.json");
    assert_eq!(export_snapshot(&store, &out).unwrap(), 6);
    let snapshot: Snapshot =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(snapshot.schema_version, 1);
    assert_eq!(snapshot.jobs, store.records().unwrap());

    store.clear().unwrap();
    assert_eq!(store.state().unwrap(), StoreState::Empty);
}

#[test]
fn unsupported_site_scrapes_nothing() {
    let registry = Registry::builtin().unwrap();
    let err = scrape_page(
        &fixture("upwork_search.html"),
        "https://www.linkedin.com/jobs/",
        &registry,
        &ScrapeOptions::default(),
    )
    .unwrap_err();

    assert!(matches!(err, ScrapeError::UnsupportedSite(_)));
}

#[test]
fn clear_recovers_a_damaged_store_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, "{\"jobs\": [ {\"id\": ").unwrap();

    let store = JobStore::new(FileBackend::new(&path));
    assert!(store.records().is_err());
    assert!(store
        .merge_batch(scrape("upwork_search.html", UPWORK_URL).records)
        .is_err());

    store.clear().unwrap();
    assert_eq!(store.state().unwrap(), StoreState::Empty);

    let stats = store
        .merge_batch(scrape("freelancer_jobs.html", FREELANCER_URL).records)
        .unwrap();
    assert_eq!(stats.total, 3);
}

#[test]
fn parallel_scrapes_through_separate_handles_keep_every_listing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let workers: Vec<_> = [
        ("upwork_search.html", UPWORK_URL),
        ("freelancer_jobs.html", FREELANCER_URL),
    ]
    .into_iter()
    .map(|(page, url)| {
        let path = path.clone();
        std::thread::spawn(move || {
            let store = JobStore::new(FileBackend::new(path));
            for _ in 0..5 {
                store.merge_batch(scrape(page, url).records).unwrap();
            }
        })
    })
    .collect();
    for w in workers {
        w.join().unwrap();
    }

    let counts = JobStore::new(FileBackend::new(&path)).counts_by_source().unwrap();
    assert_eq!(counts["upwork.com"], 3);
    assert_eq!(counts["freelancer.com"], 3);
}
