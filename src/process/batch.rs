// src/process/batch.rs

use serde::Deserialize;
use serde_json::value::RawValue;

/// One undecoded result row, kept as the exact JSON text the API sent.
pub type RawRow = Box<RawValue>;

/// One chunk of a streamed or paged query response.
///
/// This is also the wire shape of a `searchStream` array element, so the HTTP
/// service deserializes straight into it.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBatch {
    #[serde(default)]
    pub results: Vec<RawRow>,
    #[serde(default)]
    pub field_mask: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
}

impl ResponseBatch {
    pub fn new(results: Vec<RawRow>) -> Self {
        Self {
            results,
            ..Self::default()
        }
    }

    /// Build a batch from already-parsed JSON rows.
    pub fn from_json_rows<I>(rows: I) -> serde_json::Result<Self>
    where
        I: IntoIterator<Item = serde_json::Value>,
    {
        let results = rows
            .into_iter()
            .map(|row| serde_json::value::to_raw_value(&row))
            .collect::<serde_json::Result<Vec<_>>>()?;
        Ok(Self::new(results))
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
