//! Mining orchestrator.
//!
//! Drives one date end to end: discover job identifiers from the listing
//! page, deduplicate them, retrieve each job's document (cache or fetch),
//! assemble records, and aggregate results plus diagnostics. A single
//! item's failure never aborts the batch; only a failing discovery request
//! escalates, and then only to the date's caller.

use std::collections::HashSet;

use chrono::NaiveDate;
use regex::Regex;
use scraper::Html;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{Diagnostic, PortalConfig, RawJobRecord};
use crate::services::{JobSource, RecordAssembler};
use crate::storage::{CachePolicy, JobCache};

/// One successfully assembled job.
#[derive(Debug, Serialize)]
pub struct MinedJob {
    pub uuid: String,
    pub record: RawJobRecord,
    pub diagnostics: Vec<Diagnostic>,
    pub from_cache: bool,
}

/// One job that could not be retrieved or assembled.
#[derive(Debug, Serialize)]
pub struct FailedJob {
    pub uuid: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Aggregated result of mining one date.
#[derive(Debug, Serialize)]
pub struct MineOutcome {
    pub date: NaiveDate,
    pub jobs: Vec<MinedJob>,
    pub failures: Vec<FailedJob>,
    pub fetched: usize,
    pub cached: usize,
}

impl MineOutcome {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            jobs: Vec::new(),
            failures: Vec::new(),
            fetched: 0,
            cached: 0,
        }
    }

    /// Union of all diagnostics for the date, successes included.
    pub fn diagnostics(&self) -> Vec<&Diagnostic> {
        self.jobs
            .iter()
            .flat_map(|job| job.diagnostics.iter())
            .chain(self.failures.iter().flat_map(|job| job.diagnostics.iter()))
            .collect()
    }
}

/// Mines one date at a time from a job source. Stateless across dates.
pub struct Miner<'a> {
    source: &'a dyn JobSource,
    cache: &'a JobCache,
    assembler: &'a RecordAssembler,
    identifier: Regex,
}

impl<'a> Miner<'a> {
    pub fn new(
        source: &'a dyn JobSource,
        cache: &'a JobCache,
        assembler: &'a RecordAssembler,
        portal: &PortalConfig,
    ) -> Result<Self> {
        Ok(Self {
            source,
            cache,
            assembler,
            identifier: portal.identifier_regex()?,
        })
    }

    /// Mine all jobs of one date.
    ///
    /// Returns an error only when identifier discovery itself fails; the
    /// caller decides whether to skip the date or give up. Per-item
    /// failures are aggregated into the outcome instead.
    pub fn mine(&self, date: NaiveDate, policy: CachePolicy) -> Result<MineOutcome> {
        let mut outcome = MineOutcome::new(date);

        let uuids = self.discover(date, policy)?;
        if uuids.is_empty() {
            log::info!("{date}: no jobs found (not a working day?)");
            return Ok(outcome);
        }
        log::info!("{date}: {} job(s) to mine", uuids.len());

        for uuid in uuids {
            let (raw, from_cache) = match self.retrieve(date, &uuid, policy) {
                Ok(retrieved) => retrieved,
                Err(error) => {
                    log::warn!("{date}: failed to retrieve job {uuid}: {error}");
                    outcome.failures.push(FailedJob {
                        diagnostics: vec![Diagnostic::transport(&uuid, error.to_string())],
                        uuid,
                    });
                    continue;
                }
            };
            if from_cache {
                outcome.cached += 1;
            } else {
                outcome.fetched += 1;
            }

            let document = Html::parse_document(&raw);
            let assembly = self.assembler.assemble(&document);
            match assembly.record {
                Some(record) => outcome.jobs.push(MinedJob {
                    uuid,
                    record,
                    diagnostics: assembly.diagnostics,
                    from_cache,
                }),
                None => {
                    log::warn!("{date}: job {uuid} failed to assemble");
                    outcome.failures.push(FailedJob {
                        uuid,
                        diagnostics: assembly.diagnostics,
                    });
                }
            }
        }

        log::info!(
            "{date}: mined {} job(s), {} failure(s), {} fetched, {} cached",
            outcome.jobs.len(),
            outcome.failures.len(),
            outcome.fetched,
            outcome.cached
        );
        Ok(outcome)
    }

    /// Discover the deduplicated identifier set for a date.
    ///
    /// The listing page references each identifier more than once, so
    /// duplicates are dropped before any per-item work, keeping first-seen
    /// order. Under `NeverFetch` the cache directory is enumerated instead
    /// of issuing the listing request.
    fn discover(&self, date: NaiveDate, policy: CachePolicy) -> Result<Vec<String>> {
        if policy == CachePolicy::NeverFetch {
            return self.cache.entries(date);
        }

        let listing = self
            .source
            .list_jobs(date)
            .map_err(|e| AppError::discovery(format!("listing request for {date} failed: {e}")))?;

        let mut seen = HashSet::new();
        let mut uuids = Vec::new();
        for captures in self.identifier.captures_iter(&listing) {
            let uuid = captures[1].to_string();
            if seen.insert(uuid.clone()) {
                uuids.push(uuid);
            }
        }
        Ok(uuids)
    }

    /// Retrieve one job's raw document per the cache policy.
    ///
    /// Returns the document text and whether it came from the cache.
    fn retrieve(&self, date: NaiveDate, uuid: &str, policy: CachePolicy) -> Result<(String, bool)> {
        match policy {
            CachePolicy::FetchIfAbsent => {
                if let Some(text) = self.cache.load(date, uuid)? {
                    return Ok((text, true));
                }
                let text = self.source.fetch_job(uuid)?;
                self.cache.store(date, uuid, &text)?;
                Ok((text, false))
            }
            CachePolicy::AlwaysFetch => {
                let text = self.source.fetch_job(uuid)?;
                self.cache.store(date, uuid, &text)?;
                Ok((text, false))
            }
            CachePolicy::NeverFetch => {
                let text = self.cache.load(date, uuid)?.ok_or_else(|| {
                    AppError::cache(format!("job {uuid} not cached and fetching is disabled"))
                })?;
                Ok((text, true))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use tempfile::TempDir;

    use super::*;
    use crate::models::{Config, ExtractionProfile};

    /// In-memory job source that records every fetch.
    struct StubSource {
        listing: String,
        documents: HashMap<String, String>,
        fetches: RefCell<Vec<String>>,
    }

    impl StubSource {
        fn new(listing: &str, documents: &[(&str, &str)]) -> Self {
            Self {
                listing: listing.to_string(),
                documents: documents
                    .iter()
                    .map(|(uuid, html)| (uuid.to_string(), html.to_string()))
                    .collect(),
                fetches: RefCell::new(Vec::new()),
            }
        }

        fn fetch_count(&self) -> usize {
            self.fetches.borrow().len()
        }
    }

    impl JobSource for StubSource {
        fn list_jobs(&self, _date: NaiveDate) -> Result<String> {
            Ok(self.listing.clone())
        }

        fn fetch_job(&self, uuid: &str) -> Result<String> {
            self.fetches.borrow_mut().push(uuid.to_string());
            self.documents
                .get(uuid)
                .cloned()
                .ok_or_else(|| AppError::session(format!("connection reset fetching {uuid}")))
        }
    }

    fn good_document() -> String {
        r#"<html><body>
        <h2>Auftrag Nr. 1234567890</h2>
        <h4>Kunde: Max Mustermann | 12345</h4>
        <p>Strecke 1,234 distance</p>
        <table><tbody><tr><td>Stadtkurier</td><td>12,50</td></tr></tbody></table>
        </body></html>"#
            .to_string()
    }

    fn headless_document() -> String {
        // Missing the mandatory h2 header anchor.
        r#"<html><body>
        <h4>Kunde: Max Mustermann | 12345</h4>
        <p>Strecke 1,234 distance</p>
        <table><tbody><tr><td>Stadtkurier</td><td>12,50</td></tr></tbody></table>
        </body></html>"#
            .to_string()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2014, 12, 19).unwrap()
    }

    struct Fixture {
        cache: JobCache,
        assembler: RecordAssembler,
        portal: crate::models::PortalConfig,
        _tmp: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            let config = Config::default();
            Self {
                cache: JobCache::new(tmp.path()),
                assembler: RecordAssembler::new(
                    ExtractionProfile::compile(&config.profile).unwrap(),
                ),
                portal: config.portal,
                _tmp: tmp,
            }
        }

        fn miner<'a>(&'a self, source: &'a StubSource) -> Miner<'a> {
            Miner::new(source, &self.cache, &self.assembler, &self.portal).unwrap()
        }
    }

    #[test]
    fn duplicate_identifiers_are_fetched_once() {
        let doc = good_document();
        let source = StubSource::new(
            "uuid=1111111 uuid=1111111 uuid=2222222 uuid=1111111 uuid=2222222",
            &[("1111111", &doc), ("2222222", &doc)],
        );
        let fixture = Fixture::new();

        let outcome = fixture
            .miner(&source)
            .mine(date(), CachePolicy::FetchIfAbsent)
            .unwrap();

        assert_eq!(source.fetch_count(), 2);
        assert_eq!(outcome.jobs.len(), 2);
        // First-seen order is preserved.
        assert_eq!(outcome.jobs[0].uuid, "1111111");
        assert_eq!(outcome.jobs[1].uuid, "2222222");
    }

    #[test]
    fn second_pass_hits_the_cache() {
        let doc = good_document();
        let source = StubSource::new("uuid=1111111", &[("1111111", &doc)]);
        let fixture = Fixture::new();
        let miner = fixture.miner(&source);

        let first = miner.mine(date(), CachePolicy::FetchIfAbsent).unwrap();
        let second = miner.mine(date(), CachePolicy::FetchIfAbsent).unwrap();

        assert_eq!(source.fetch_count(), 1);
        assert_eq!(first.fetched, 1);
        assert_eq!(second.cached, 1);
        assert!(second.jobs[0].from_cache);
    }

    #[test]
    fn always_fetch_overwrites_the_cache_entry() {
        let doc = good_document();
        let source = StubSource::new("uuid=1111111", &[("1111111", &doc)]);
        let fixture = Fixture::new();
        let miner = fixture.miner(&source);

        miner.mine(date(), CachePolicy::FetchIfAbsent).unwrap();
        let refreshed = miner.mine(date(), CachePolicy::AlwaysFetch).unwrap();

        assert_eq!(source.fetch_count(), 2);
        assert_eq!(refreshed.fetched, 1);
    }

    #[test]
    fn structural_failure_does_not_abort_the_batch() {
        let good = good_document();
        let bad = headless_document();
        let source = StubSource::new(
            "uuid=1111111 uuid=2222222 uuid=3333333",
            &[("1111111", &good), ("2222222", &bad), ("3333333", &good)],
        );
        let fixture = Fixture::new();

        let outcome = fixture
            .miner(&source)
            .mine(date(), CachePolicy::FetchIfAbsent)
            .unwrap();

        assert_eq!(outcome.jobs.len(), 2);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].uuid, "2222222");
        assert_eq!(outcome.failures[0].diagnostics[0].section, "header");
    }

    #[test]
    fn transport_failure_is_recorded_and_the_batch_continues() {
        let good = good_document();
        // 2222222 is referenced by the listing but its fetch errors out.
        let source = StubSource::new("uuid=1111111 uuid=2222222", &[("1111111", &good)]);
        let fixture = Fixture::new();

        let outcome = fixture
            .miner(&source)
            .mine(date(), CachePolicy::FetchIfAbsent)
            .unwrap();

        assert_eq!(outcome.jobs.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.failures[0].diagnostics[0].message.contains("2222222"));
    }

    #[test]
    fn never_fetch_mines_only_cached_documents() {
        let doc = good_document();
        let source = StubSource::new("uuid=1111111 uuid=2222222", &[("1111111", &doc)]);
        let fixture = Fixture::new();
        fixture.cache.store(date(), "1111111", &doc).unwrap();

        let outcome = fixture
            .miner(&source)
            .mine(date(), CachePolicy::NeverFetch)
            .unwrap();

        assert_eq!(source.fetch_count(), 0);
        assert_eq!(outcome.jobs.len(), 1);
        assert_eq!(outcome.cached, 1);
    }

    #[test]
    fn failing_listing_request_is_a_discovery_error() {
        /// Source whose listing endpoint is unreachable.
        struct UnreachableSource {
            fetches: RefCell<usize>,
        }

        impl JobSource for UnreachableSource {
            fn list_jobs(&self, _date: NaiveDate) -> Result<String> {
                Err(AppError::session("connection refused"))
            }

            fn fetch_job(&self, uuid: &str) -> Result<String> {
                *self.fetches.borrow_mut() += 1;
                Err(AppError::session(format!("connection refused fetching {uuid}")))
            }
        }

        let source = UnreachableSource {
            fetches: RefCell::new(0),
        };
        let fixture = Fixture::new();
        let miner =
            Miner::new(&source, &fixture.cache, &fixture.assembler, &fixture.portal).unwrap();

        let err = miner.mine(date(), CachePolicy::FetchIfAbsent).unwrap_err();

        // Discovery failure escalates to the date's caller; no per-item
        // work happens first.
        assert!(matches!(err, AppError::Discovery(_)));
        assert_eq!(*source.fetches.borrow(), 0);
    }

    #[test]
    fn empty_listing_is_a_valid_non_working_day() {
        let source = StubSource::new("no identifiers anywhere", &[]);
        let fixture = Fixture::new();

        let outcome = fixture
            .miner(&source)
            .mine(date(), CachePolicy::FetchIfAbsent)
            .unwrap();

        assert!(outcome.jobs.is_empty());
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn outcome_diagnostics_union_covers_successes_and_failures() {
        let bad = headless_document();
        let source = StubSource::new("uuid=1111111", &[("1111111", &bad)]);
        let fixture = Fixture::new();

        let outcome = fixture
            .miner(&source)
            .mine(date(), CachePolicy::FetchIfAbsent)
            .unwrap();

        assert_eq!(outcome.diagnostics().len(), 1);
    }
}
