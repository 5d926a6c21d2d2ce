use std::io::Read;

use serde::{Deserialize, Deserializer};

use super::domain::{Difficulty, DomainName};

/// One historical task row parsed from a marketplace CSV export. Only
/// completed rows with a positive budget feed the pricing average.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalTask {
    pub title: String,
    pub domain: DomainName,
    pub budget: u32,
    pub duration_days: u32,
    pub difficulty: Difficulty,
    pub completed: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum HistoryImportError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("history row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },
}

/// Parse a CSV export of past tasks. Header names follow the export format:
/// `Title`, `Domain`, `Budget`, `Duration`, `Difficulty`, `Status`.
pub fn parse_history<R: Read>(reader: R) -> Result<Vec<HistoricalTask>, HistoryImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut tasks = Vec::new();
    for (index, record) in csv_reader.deserialize::<HistoryRow>().enumerate() {
        let row = record?;
        let difficulty =
            Difficulty::try_from(row.difficulty).map_err(|err| HistoryImportError::InvalidRow {
                row: index + 1,
                reason: err.to_string(),
            })?;

        tasks.push(HistoricalTask {
            title: row.title,
            domain: DomainName::new(&row.domain),
            budget: row.budget,
            duration_days: row.duration,
            difficulty,
            completed: row.status.eq_ignore_ascii_case("completed"),
        });
    }

    Ok(tasks)
}

#[derive(Debug, Deserialize)]
struct HistoryRow {
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Domain")]
    domain: String,
    #[serde(rename = "Budget")]
    budget: u32,
    #[serde(rename = "Duration")]
    duration: u32,
    #[serde(rename = "Difficulty", default = "default_difficulty_tier")]
    difficulty: u8,
    #[serde(rename = "Status", deserialize_with = "non_empty_status")]
    status: String,
}

fn default_difficulty_tier() -> u8 {
    1
}

fn non_empty_status<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    if value.is_empty() {
        Ok("Open".to_string())
    } else {
        Ok(value)
    }
}
