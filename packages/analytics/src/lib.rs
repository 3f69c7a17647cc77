#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Report statistics for the crime portal.
//!
//! The [`AggregationEngine`] keeps per-area and per-type counts in memory,
//! updated once per stored report, so a stats request never rescans the
//! report history. Ordering is derived when a snapshot is taken; only the
//! raw counts are maintained.
//!
//! [`rescan`] computes the same [`StatsSnapshot`] from scratch. It is used
//! to seed the engine from durable storage at startup and to verify that
//! the incremental counts have not drifted. The two paths must agree
//! exactly for any report set.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;

use crime_portal_report_models::{AreaCount, CrimeReport, CrimeType, StatsSnapshot, TypeCount};
use tokio::sync::RwLock;

/// Raw counters behind the engine.
#[derive(Debug, Clone, Default)]
struct Tallies {
    total: u64,
    by_area: HashMap<String, u64>,
    by_type: HashMap<CrimeType, u64>,
}

impl Tallies {
    fn record(&mut self, report: &CrimeReport) {
        self.total += 1;
        *self.by_area.entry(report.area.clone()).or_insert(0) += 1;
        *self.by_type.entry(report.crime_type).or_insert(0) += 1;
    }

    fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_reports: self.total,
            by_area: sort_area_counts(
                self.by_area
                    .iter()
                    .map(|(area, count)| AreaCount {
                        area: area.clone(),
                        count: *count,
                    })
                    .collect(),
            ),
            by_type: sort_type_counts(
                self.by_type
                    .iter()
                    .map(|(crime_type, count)| TypeCount {
                        crime_type: *crime_type,
                        count: *count,
                    })
                    .collect(),
            ),
        }
    }
}

/// Maintains report counts consistent with the report store.
///
/// All mutation goes through a single write lock, so concurrent inserts
/// never lose an update and a snapshot never sees half of one.
#[derive(Debug, Default)]
pub struct AggregationEngine {
    tallies: RwLock<Tallies>,
}

impl AggregationEngine {
    /// Creates an engine with no reports counted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine seeded from a full scan of stored reports.
    #[must_use]
    pub fn from_reports<'a>(reports: impl IntoIterator<Item = &'a CrimeReport>) -> Self {
        let mut tallies = Tallies::default();
        for report in reports {
            tallies.record(report);
        }
        log::debug!("Aggregates seeded from {} reports", tallies.total);
        Self {
            tallies: RwLock::new(tallies),
        }
    }

    /// Counts one newly stored report.
    pub async fn update_on_insert(&self, report: &CrimeReport) {
        self.tallies.write().await.record(report);
    }

    /// Runs `append` while holding the write lock and counts `report` only
    /// if it succeeds.
    ///
    /// This makes "store the report, then count it" a single step as seen
    /// by snapshot readers: a snapshot taken concurrently either includes
    /// the report in every count or in none.
    ///
    /// # Errors
    ///
    /// Returns whatever error `append` returns; the counts are left
    /// untouched in that case.
    pub async fn commit_insert<F, E>(&self, report: &CrimeReport, append: F) -> Result<(), E>
    where
        F: Future<Output = Result<(), E>>,
    {
        let mut tallies = self.tallies.write().await;
        append.await?;
        tallies.record(report);
        Ok(())
    }

    /// Returns the current statistics, sorted by count descending with ties
    /// broken by name ascending.
    pub async fn snapshot(&self) -> StatsSnapshot {
        self.tallies.read().await.snapshot()
    }
}

/// Computes statistics from scratch over `reports`.
///
/// Independent of the incremental counters; for the same report set it
/// yields a snapshot equal to [`AggregationEngine::snapshot`].
#[must_use]
pub fn rescan<'a>(reports: impl IntoIterator<Item = &'a CrimeReport>) -> StatsSnapshot {
    let mut total = 0u64;
    let mut by_area: BTreeMap<&str, u64> = BTreeMap::new();
    let mut by_type: BTreeMap<CrimeType, u64> = BTreeMap::new();

    for report in reports {
        total += 1;
        *by_area.entry(report.area.as_str()).or_default() += 1;
        *by_type.entry(report.crime_type).or_default() += 1;
    }

    StatsSnapshot {
        total_reports: total,
        by_area: sort_area_counts(
            by_area
                .into_iter()
                .map(|(area, count)| AreaCount {
                    area: area.to_string(),
                    count,
                })
                .collect(),
        ),
        by_type: sort_type_counts(
            by_type
                .into_iter()
                .map(|(crime_type, count)| TypeCount { crime_type, count })
                .collect(),
        ),
    }
}

/// Orders `(name, count)` pairs by count descending, then name ascending.
fn by_count_then_name(a: (&str, u64), b: (&str, u64)) -> Ordering {
    b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0))
}

fn sort_area_counts(mut counts: Vec<AreaCount>) -> Vec<AreaCount> {
    counts.sort_by(|a, b| {
        by_count_then_name((a.area.as_str(), a.count), (b.area.as_str(), b.count))
    });
    counts
}

fn sort_type_counts(mut counts: Vec<TypeCount>) -> Vec<TypeCount> {
    counts.sort_by(|a, b| {
        by_count_then_name(
            (a.crime_type.as_ref(), a.count),
            (b.crime_type.as_ref(), b.count),
        )
    });
    counts
}
