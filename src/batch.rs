//! Batch orchestrator: assemble → cache/resolve → offset → flag, one row at a time.
//!
//! Rows are processed strictly in input order with at most one resolver
//! call in flight. A fixed pause separates consecutive resolver calls;
//! rows answered from supplied coordinates or the cache never pause.

use crate::assembler::build_query;
use crate::flags::{classify, FlagResult, FlagStatus};
use crate::geocoder::{GeocodeCache, GeocodeError, GeocodeResult, Geocoder};
use crate::geodesy::ShiftedCoordinate;
use crate::offset::{parse_offset, OffsetSpec};
use crate::record::LocationRecord;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const DEFAULT_DELAY: Duration = Duration::from_millis(100);

/// New cache entries held in memory before the cache file is rewritten.
const CACHE_FLUSH_INTERVAL: usize = 100;

/// Options for a batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Pause inserted between consecutive resolver calls.
    pub delay: Duration,
    /// Skip rows that carry only county/state text instead of geocoding a centroid.
    pub skip_vague: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            delay: DEFAULT_DELAY,
            skip_vague: false,
        }
    }
}

/// Why a row was not sent to the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Every location field was empty.
    NoLocationText,
    /// Only county/state text and `skip_vague` is set.
    TooVague,
}

/// What happened when a row's coordinates were sought.
#[derive(Debug)]
pub enum GeocodeOutcome {
    /// The input already carried latitude and longitude.
    Supplied,
    Resolved { result: GeocodeResult, cached: bool },
    Failed(GeocodeError),
    Skipped(SkipReason),
}

/// One fully processed row. Immutable once the orchestrator returns it.
#[derive(Debug)]
pub struct OutputRow {
    pub record: LocationRecord,
    /// The text sent (or that would have been sent) to the resolver.
    pub query: String,
    pub offset: Option<OffsetSpec>,
    pub outcome: GeocodeOutcome,
    pub shifted: Option<ShiftedCoordinate>,
    pub flag: FlagResult,
}

impl OutputRow {
    pub fn geocode(&self) -> Option<&GeocodeResult> {
        match &self.outcome {
            GeocodeOutcome::Resolved { result, .. } => Some(result),
            _ => None,
        }
    }

    /// Base coordinates: supplied or resolved.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match &self.outcome {
            GeocodeOutcome::Supplied => self.record.coordinates(),
            GeocodeOutcome::Resolved { result, .. } => Some((result.latitude, result.longitude)),
            _ => None,
        }
    }
}

/// Counters for the end-of-run report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub already_had_coordinates: usize,
    pub geocoded: usize,
    pub cache_hits: usize,
    pub failed: usize,
    pub skipped: usize,
    pub offsets_applied: usize,
    pub resolver_calls: usize,
    pub throttle_pauses: usize,
    pub ok: usize,
    pub review: usize,
    pub warning: usize,
}

impl BatchSummary {
    fn count_flag(&mut self, status: FlagStatus) {
        match status {
            FlagStatus::Ok => self.ok += 1,
            FlagStatus::Review => self.review += 1,
            FlagStatus::Warning => self.warning += 1,
        }
    }
}

/// Sequential geocoding pipeline over a resolver and an optional cache.
pub struct Batch<G: Geocoder> {
    geocoder: G,
    cache: Option<GeocodeCache>,
    options: BatchOptions,
    /// Set after a credential failure; no further resolver calls are made.
    halted: Option<GeocodeError>,
}

impl<G: Geocoder> Batch<G> {
    pub fn new(geocoder: G, options: BatchOptions) -> Self {
        Self {
            geocoder,
            cache: None,
            options,
            halted: None,
        }
    }

    pub fn with_cache(mut self, cache: GeocodeCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn geocoder(&self) -> &G {
        &self.geocoder
    }

    /// Process every record in order, producing exactly one row per record.
    pub fn run(&mut self, records: Vec<LocationRecord>) -> (Vec<OutputRow>, BatchSummary) {
        let mut summary = BatchSummary {
            total: records.len(),
            ..Default::default()
        };
        let mut rows = Vec::with_capacity(records.len());

        for (index, record) in records.into_iter().enumerate() {
            let row = self.process(index, record, &mut summary);
            summary.count_flag(row.flag.status);
            rows.push(row);
        }

        if let Some(cache) = self.cache.as_mut() {
            cache.flush();
        }

        info!(
            total = summary.total,
            geocoded = summary.geocoded,
            cache_hits = summary.cache_hits,
            failed = summary.failed,
            skipped = summary.skipped,
            "batch complete"
        );
        (rows, summary)
    }

    fn process(
        &mut self,
        index: usize,
        record: LocationRecord,
        summary: &mut BatchSummary,
    ) -> OutputRow {
        if record.has_coordinates() {
            summary.already_had_coordinates += 1;
            debug!(row = index, "coordinates supplied, not geocoding");
            let offset = parse_offset(&record.precise_location);
            let flag = classify(&record, None, offset.as_ref());
            return OutputRow {
                record,
                query: String::new(),
                offset,
                outcome: GeocodeOutcome::Supplied,
                shifted: None,
                flag,
            };
        }

        let assembled = build_query(&record);

        let outcome = if assembled.is_empty() {
            GeocodeOutcome::Skipped(SkipReason::NoLocationText)
        } else if self.options.skip_vague && record.is_county_state_only() {
            GeocodeOutcome::Skipped(SkipReason::TooVague)
        } else {
            self.lookup(index, &assembled.query, summary)
        };

        match &outcome {
            GeocodeOutcome::Resolved { .. } => summary.geocoded += 1,
            GeocodeOutcome::Failed(_) => summary.failed += 1,
            GeocodeOutcome::Skipped(reason) => {
                summary.skipped += 1;
                info!(row = index, ?reason, "skipping row");
            }
            GeocodeOutcome::Supplied => {}
        }

        let geocode = match &outcome {
            GeocodeOutcome::Resolved { result, .. } => Some(result),
            _ => None,
        };

        let shifted = match (&assembled.offset, geocode) {
            (Some(offset), Some(base)) => {
                let shifted = ShiftedCoordinate::from_offset(base.latitude, base.longitude, offset);
                summary.offsets_applied += 1;
                debug!(
                    row = index,
                    offset = %shifted.description,
                    lat = shifted.latitude,
                    lon = shifted.longitude,
                    "applied directional offset"
                );
                Some(shifted)
            }
            _ => None,
        };

        let flag = classify(&record, geocode, assembled.offset.as_ref());

        OutputRow {
            record,
            query: assembled.query,
            offset: assembled.offset,
            outcome,
            shifted,
            flag,
        }
    }

    fn lookup(&mut self, index: usize, query: &str, summary: &mut BatchSummary) -> GeocodeOutcome {
        if let Some(result) = self.cache.as_ref().and_then(|c| c.get(query)) {
            summary.cache_hits += 1;
            debug!(row = index, query, "cache hit");
            return GeocodeOutcome::Resolved { result, cached: true };
        }

        if let Some(e) = &self.halted {
            debug!(row = index, query, "resolver halted, not calling");
            return GeocodeOutcome::Failed(e.clone());
        }

        if summary.resolver_calls > 0 && !self.options.delay.is_zero() {
            summary.throttle_pauses += 1;
            std::thread::sleep(self.options.delay);
        }
        summary.resolver_calls += 1;

        info!(row = index, query, "geocoding");
        match self.geocoder.geocode(query) {
            Ok(result) => {
                if let Some(cache) = self.cache.as_mut() {
                    cache.put(query, &result);
                    if cache.pending() >= CACHE_FLUSH_INTERVAL {
                        cache.flush();
                    }
                }
                GeocodeOutcome::Resolved { result, cached: false }
            }
            Err(e @ GeocodeError::Denied(_)) => {
                error!(
                    row = index,
                    error = %e,
                    "credentials rejected, no further geocoding requests"
                );
                self.halted = Some(e.clone());
                GeocodeOutcome::Failed(e)
            }
            Err(e) => {
                warn!(
                    row = index,
                    query,
                    category = e.category(),
                    error = %e,
                    "geocoding failed"
                );
                GeocodeOutcome::Failed(e)
            }
        }
    }
}
