//! Recorded transition corpus with nearest-neighbor lookup.

use std::fs;
use std::path::Path;

use log::debug;
use simcore::{QueryVector, Transition};

use crate::error::DatasetError;

/// One recorded step: the six angles are the key, the torques the payload.
pub type DatasetEntry = Transition;

/// Closest entry to a query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestMatch<'a> {
    /// Position of the entry in load order
    pub index: usize,
    pub entry: &'a DatasetEntry,
    /// Euclidean distance in six-angle space
    pub distance: f64,
}

/// Read-only corpus of recorded transitions, kept in file order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    entries: Vec<DatasetEntry>,
}

impl Dataset {
    pub fn from_entries(entries: Vec<DatasetEntry>) -> Self {
        Self { entries }
    }

    /// Parses tab-separated rows. The first row is a header and is skipped;
    /// rows with fewer than eight fields or non-numeric fields are dropped.
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a str>) -> Self {
        let entries = rows
            .into_iter()
            .enumerate()
            .skip(1)
            .filter_map(|(line_no, row)| {
                let entry = parse_row(row);
                if entry.is_none() && !row.trim().is_empty() {
                    debug!("skipping dataset row {}: {:?}", line_no + 1, row);
                }
                entry
            })
            .collect();
        Self { entries }
    }

    pub fn parse(text: &str) -> Self {
        Self::from_rows(text.lines())
    }

    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    pub fn entries(&self) -> &[DatasetEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Linear scan for the entry whose six angles are closest to `query`.
    ///
    /// Ties keep the earliest entry. Returns `None` for an empty dataset.
    pub fn find_nearest(&self, query: &QueryVector) -> Option<NearestMatch<'_>> {
        let mut best: Option<NearestMatch<'_>> = None;
        let mut min_distance = f64::INFINITY;

        for (index, entry) in self.entries.iter().enumerate() {
            let distance = query.distance(&entry.key());
            if distance < min_distance {
                min_distance = distance;
                best = Some(NearestMatch {
                    index,
                    entry,
                    distance,
                });
            }
        }

        best
    }
}

fn parse_row(row: &str) -> Option<DatasetEntry> {
    let fields: Vec<&str> = row.trim().split('\t').collect();
    if fields.len() < 8 {
        return None;
    }

    let mut values = [0.0; 8];
    for (value, field) in values.iter_mut().zip(&fields) {
        *value = field.trim().parse().ok()?;
    }

    Some(Transition {
        prev_theta1: values[0],
        prev_theta2: values[1],
        start_theta1: values[2],
        start_theta2: values[3],
        end_theta1: values[4],
        end_theta2: values[5],
        tau1: values[6],
        tau2: values[7],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use simcore::TRANSITION_HEADER;

    fn sample() -> String {
        format!(
            "{TRANSITION_HEADER}\n\
             0.523599\t0.523599\t0.523599\t0.523599\t0.521145\t0.522518\t-24.54\t-10.94\n\
             0.523599\t0.523599\t0.521145\t0.522518\t0.516298\t0.520378\t-23.89\t-10.75\n\
             0.521145\t0.522518\t0.516298\t0.520378\t0.509133\t0.517203\t-22.71\t-10.50\n"
        )
    }

    #[test]
    fn test_parse_skips_header() {
        let dataset = Dataset::parse(&sample());
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.entries()[0].tau1, -24.54);
        assert_eq!(dataset.entries()[2].end_theta2, 0.517203);
    }

    #[test]
    fn test_short_and_garbage_rows_dropped() {
        let text = "header\n\
                    1\t2\t3\n\
                    \n\
                    0.1\t0.2\t0.3\t0.4\t0.5\t0.6\t7.0\t8.0\n\
                    a\tb\tc\td\te\tf\tg\th\n\
                    0.1\t0.2\t0.3\t0.4\t0.5\t0.6\t9.0\t10.0\textra\n";
        let dataset = Dataset::parse(text);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.entries()[1].tau2, 10.0);
    }

    #[test]
    fn test_header_only_is_empty() {
        assert!(Dataset::parse(TRANSITION_HEADER).is_empty());
        assert!(Dataset::parse("").is_empty());
    }

    #[test]
    fn test_empty_dataset_has_no_match() {
        let query = QueryVector::from_array([0.1; 6]);
        assert!(Dataset::default().find_nearest(&query).is_none());
    }

    #[test]
    fn test_single_entry_always_matches() {
        let dataset = Dataset::parse(&format!(
            "{TRANSITION_HEADER}\n0.1\t0.2\t0.3\t0.4\t0.5\t0.6\t7.0\t8.0"
        ));
        for query in [[0.0; 6], [100.0; 6], [-3.0, 2.0, -1.0, 0.0, 1.0, 2.0]] {
            let found = dataset.find_nearest(&QueryVector::from_array(query)).unwrap();
            assert_eq!(found.index, 0);
            assert_eq!(found.entry.tau1, 7.0);
        }
    }

    #[test]
    fn test_exact_match_beats_near_ties() {
        let dataset = Dataset::parse(&sample());
        let exact = dataset.entries()[1];
        let found = dataset.find_nearest(&exact.key()).unwrap();
        assert_eq!(found.index, 1);
        assert_eq!(found.distance, 0.0);
        assert_eq!(found.entry.torques(), exact.torques());
    }

    #[test]
    fn test_ties_keep_first_entry() {
        let row = "0.1\t0.1\t0.1\t0.1\t0.1\t0.1";
        let text = format!("h\n{row}\t1.0\t1.0\n{row}\t2.0\t2.0\n");
        let dataset = Dataset::parse(&text);
        let found = dataset.find_nearest(&QueryVector::from_array([0.0; 6])).unwrap();
        assert_eq!(found.index, 0);
        assert_eq!(found.entry.tau1, 1.0);
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = Dataset::load_file("/nonexistent/robot-control.txt").unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
    }
}
