use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use super::domain::WorkerId;
use super::matching::Candidate;

/// Failure while loading a candidate export.
#[derive(Debug)]
pub enum CandidateImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidRating { worker_id: String, rating: f64 },
    MissingWorkerId { row: usize },
}

impl std::fmt::Display for CandidateImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CandidateImportError::Io(err) => write!(f, "failed to read candidate file: {}", err),
            CandidateImportError::Csv(err) => write!(f, "invalid candidate CSV data: {}", err),
            CandidateImportError::InvalidRating { worker_id, rating } => write!(
                f,
                "worker {} has average rating {} outside 0-5",
                worker_id, rating
            ),
            CandidateImportError::MissingWorkerId { row } => {
                write!(f, "candidate row {} has no worker id", row)
            }
        }
    }
}

impl std::error::Error for CandidateImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CandidateImportError::Io(err) => Some(err),
            CandidateImportError::Csv(err) => Some(err),
            CandidateImportError::InvalidRating { .. }
            | CandidateImportError::MissingWorkerId { .. } => None,
        }
    }
}

impl From<std::io::Error> for CandidateImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CandidateImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Loads candidate lists exported as
/// `worker_id,profession,hourly_rate,average_rating,total_reviews`.
///
/// Empty `average_rating` and `total_reviews` cells mean "no reviews yet".
pub struct CandidateCsvImporter;

impl CandidateCsvImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Candidate>, CandidateImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Candidate>, CandidateImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut candidates = Vec::new();

        for (index, record) in csv_reader.deserialize::<CandidateRow>().enumerate() {
            let row = record?;
            if row.worker_id.is_empty() {
                // Header is line 1, so data rows start at 2.
                return Err(CandidateImportError::MissingWorkerId { row: index + 2 });
            }
            if let Some(rating) = row.average_rating {
                if !(0.0..=5.0).contains(&rating) {
                    return Err(CandidateImportError::InvalidRating {
                        worker_id: row.worker_id,
                        rating,
                    });
                }
            }

            candidates.push(Candidate {
                worker_id: WorkerId(row.worker_id),
                profession: row.profession,
                hourly_rate: row.hourly_rate,
                average_rating: row.average_rating,
                total_reviews: row.total_reviews.unwrap_or(0),
            });
        }

        Ok(candidates)
    }
}

#[derive(Debug, Deserialize)]
struct CandidateRow {
    worker_id: String,
    profession: String,
    hourly_rate: u32,
    #[serde(default, deserialize_with = "empty_as_none")]
    average_rating: Option<f64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    total_reviews: Option<u32>,
}

fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}
