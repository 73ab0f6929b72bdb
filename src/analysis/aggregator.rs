//! Year/orbit aggregation and series materialization.
//!
//! This module counts observations by launch year and orbit class and
//! re-projects the sparse counts onto a fixed class vocabulary for charting.

use crate::models::{Observation, Series};
use std::collections::{BTreeMap, HashMap};

/// Default orbit classes charted, in legend order.
pub const DEFAULT_CLASSES: [&str; 4] = ["LEO", "MEO", "GEO", "Elliptical"];

/// Counts keyed by year, then by orbit class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationTable {
    years: BTreeMap<String, BTreeMap<String, usize>>,
}

impl AggregationTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one observation.
    pub fn record(&mut self, observation: Observation) {
        *self
            .years
            .entry(observation.year)
            .or_default()
            .entry(observation.orbit_class)
            .or_default() += 1;
    }

    /// Count at `[year][orbit_class]`, zero when absent.
    pub fn count(&self, year: &str, orbit_class: &str) -> usize {
        self.years
            .get(year)
            .and_then(|classes| classes.get(orbit_class))
            .copied()
            .unwrap_or(0)
    }

    /// Distinct years, ascending lexicographic order.
    pub fn sorted_years(&self) -> Vec<String> {
        let mut years: Vec<String> = self.years.keys().cloned().collect();
        years.sort();
        years
    }

    /// Sum of every cell.
    pub fn total(&self) -> usize {
        self.years.values().flat_map(|classes| classes.values()).sum()
    }

    /// Totals per orbit class across all years.
    pub fn class_totals(&self) -> HashMap<String, usize> {
        let mut totals: HashMap<String, usize> = HashMap::new();

        for classes in self.years.values() {
            for (class, count) in classes {
                *totals.entry(class.clone()).or_default() += count;
            }
        }

        totals
    }

    /// Consume the table, returning the underlying nested map.
    pub fn into_map(self) -> BTreeMap<String, BTreeMap<String, usize>> {
        self.years
    }
}

impl FromIterator<Observation> for AggregationTable {
    fn from_iter<I: IntoIterator<Item = Observation>>(iter: I) -> Self {
        let mut table = Self::new();
        for observation in iter {
            table.record(observation);
        }
        table
    }
}

/// Aggregate a stream of observations in a single pass.
pub fn aggregate<I>(observations: I) -> AggregationTable
where
    I: IntoIterator<Item = Observation>,
{
    observations.into_iter().collect()
}

/// Aggregate a fallible stream, stopping at the first error.
pub fn try_aggregate<I, E>(observations: I) -> Result<AggregationTable, E>
where
    I: IntoIterator<Item = Result<Observation, E>>,
{
    let mut error = None;
    let table = aggregate(
        observations
            .into_iter()
            .map_while(|observation| observation.map_err(|e| error = Some(e)).ok()),
    );

    match error {
        Some(e) => Err(e),
        None => Ok(table),
    }
}

/// Dense re-projection of the table onto `classes`.
///
/// Produces one series per class, in the order given, each with one value
/// per entry of `years`. Missing cells are zero.
pub fn materialize_series<S: AsRef<str>>(
    table: &AggregationTable,
    years: &[String],
    classes: &[S],
) -> Vec<Series> {
    classes
        .iter()
        .map(|class| {
            let class = class.as_ref();
            Series {
                name: class.to_string(),
                values: years.iter().map(|year| table.count(year, class)).collect(),
            }
        })
        .collect()
}

/// Classes present in the table but missing from `classes`, sorted.
pub fn unlisted_classes<S: AsRef<str>>(table: &AggregationTable, classes: &[S]) -> Vec<String> {
    let mut unlisted: Vec<String> = table
        .class_totals()
        .into_keys()
        .filter(|class| !classes.iter().any(|c| c.as_ref() == class))
        .collect();
    unlisted.sort();
    unlisted
}

/// Default class vocabulary as owned strings.
pub fn default_classes() -> Vec<String> {
    DEFAULT_CLASSES.iter().map(|c| c.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{ExtractConfig, RecordExtractor};

    fn obs(year: &str, class: &str) -> Observation {
        Observation::new(year, class)
    }

    fn sample() -> AggregationTable {
        aggregate(vec![
            obs("2005", "LEO"),
            obs("2005", "GEO"),
            obs("1998", "LEO"),
            obs("2005", "LEO"),
            obs("2010", "Sun-Synchronous"),
        ])
    }

    #[test]
    fn test_two_rows_same_year() {
        let table = aggregate(vec![obs("2005", "LEO"), obs("2005", "GEO")]);

        let expected: BTreeMap<String, BTreeMap<String, usize>> = [(
            "2005".to_string(),
            [("LEO".to_string(), 1), ("GEO".to_string(), 1)]
                .into_iter()
                .collect(),
        )]
        .into_iter()
        .collect();

        assert_eq!(table.sorted_years(), vec!["2005"]);
        assert_eq!(table.into_map(), expected);
    }

    #[test]
    fn test_counts_and_total() {
        let table = sample();
        assert_eq!(table.count("2005", "LEO"), 2);
        assert_eq!(table.count("2005", "GEO"), 1);
        assert_eq!(table.count("2005", "MEO"), 0);
        assert_eq!(table.count("1970", "LEO"), 0);
        assert_eq!(table.total(), 5);
    }

    #[test]
    fn test_sorted_years_strictly_ascending() {
        let years = sample().sorted_years();
        assert_eq!(years, vec!["1998", "2005", "2010"]);
        assert!(years.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_labels_not_normalized() {
        let table = aggregate(vec![obs("2001", "LEO"), obs("2001", "LEO ")]);
        assert_eq!(table.count("2001", "LEO"), 1);
        assert_eq!(table.count("2001", "LEO "), 1);
        assert_eq!(table.class_totals().len(), 2);
    }

    #[test]
    fn test_materialize_series_zero_fill() {
        let table = sample();
        let years = table.sorted_years();
        let series = materialize_series(&table, &years, &DEFAULT_CLASSES);

        assert_eq!(series.len(), 4);
        assert_eq!(series[0].name, "LEO");
        assert_eq!(series[0].values, vec![1, 2, 0]);
        assert_eq!(series[1].values, vec![0, 0, 0]);
        assert_eq!(series[2].values, vec![0, 1, 0]);
        assert_eq!(series[3].name, "Elliptical");
        assert!(series.iter().all(|s| s.values.len() == years.len()));
    }

    #[test]
    fn test_materialize_series_custom_classes() {
        let table = sample();
        let years = table.sorted_years();
        let series = materialize_series(&table, &years, &["Sun-Synchronous".to_string()]);

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].values, vec![0, 0, 1]);
    }

    #[test]
    fn test_unlisted_classes() {
        let table = sample();
        assert_eq!(
            unlisted_classes(&table, &DEFAULT_CLASSES),
            vec!["Sun-Synchronous"]
        );
        assert!(unlisted_classes(&table, &["LEO", "GEO", "Sun-Synchronous"]).is_empty());
    }

    #[test]
    fn test_try_aggregate_stops_on_error() {
        let input: Vec<Result<Observation, String>> = vec![
            Ok(obs("2000", "LEO")),
            Err("bad".to_string()),
            Ok(obs("2001", "LEO")),
        ];
        assert_eq!(try_aggregate(input), Err("bad".to_string()));
    }

    #[test]
    fn test_try_aggregate_matches_aggregate() {
        let input = vec![obs("2000", "LEO"), obs("2000", "GEO"), obs("2001", "LEO")];
        let fallible: Vec<Result<Observation, String>> = input.iter().cloned().map(Ok).collect();

        assert_eq!(try_aggregate(fallible), Ok(aggregate(input)));
    }

    #[test]
    fn test_fixture_end_to_end() {
        let doc = include_str!("../../fixtures/sample_database.txt");
        let mut extractor = RecordExtractor::new(doc, ExtractConfig::default());
        let table = try_aggregate(extractor.by_ref()).unwrap();
        let stats = extractor.stats();

        assert_eq!(table.total(), stats.observations);
        assert_eq!(table.sorted_years(), vec!["1998", "2005", "2010"]);
        assert_eq!(table.count("2005", "MEO"), 1);
        assert_eq!(unlisted_classes(&table, &DEFAULT_CLASSES), vec!["Heliocentric"]);
    }

    #[test]
    fn test_idempotent() {
        let doc = include_str!("../../fixtures/sample_database.txt");
        let run = || {
            let mut extractor = RecordExtractor::new(doc, ExtractConfig::default());
            try_aggregate(extractor.by_ref()).unwrap()
        };
        assert_eq!(run(), run());
    }
}
