//! TSV fixture data.
//!
//! A TSV fixture is a tab-separated table whose first row names the
//! columns. The first column holds the record identifier:
//!
//! ```text
//! id	name	age
//! u1	Ann	31
//! u2	Bob	27
//! ```
//!
//! Header parsing stops at the first empty column name, and the first row
//! with an empty identifier ends the data. Cells made only of ASCII digits
//! become numbers; everything else stays a string.

use std::path::Path;

use serde_json::{Number, Value};

use crate::definition::{Record, RecordMap};
use crate::error::FixtureResult;
use seedling_domain::instance::ID_PROP;

/// Parses TSV text into records keyed by identifier.
///
/// # Errors
///
/// Returns [`FixtureError::Tsv`](crate::error::FixtureError::Tsv) if the
/// text is not valid delimited data.
///
/// # Example
///
/// ```
/// # use seedling_fixtures::tsv::parse_tsv;
/// # use serde_json::json;
/// let records = parse_tsv("id\tname\tage\nu1\tAnn\t31\n").unwrap();
/// assert_eq!(records["u1"]["age"], json!(31));
/// assert_eq!(records["u1"]["id"], json!("u1"));
/// ```
pub fn parse_tsv(text: &str) -> FixtureResult<RecordMap> {
	let mut reader = csv::ReaderBuilder::new()
		.delimiter(b'\t')
		.has_headers(false)
		.flexible(true)
		.from_reader(text.as_bytes());
	let mut rows = reader.records();

	let Some(header) = rows.next().transpose()? else {
		return Ok(RecordMap::new());
	};
	let names: Vec<String> = header
		.iter()
		.skip(1)
		.take_while(|name| !name.is_empty())
		.map(str::to_string)
		.collect();

	let mut records = RecordMap::new();
	for row in rows {
		let row = row?;
		let id = row.get(0).unwrap_or_default();
		if id.is_empty() {
			break;
		}
		let mut record = Record::new();
		record.insert(ID_PROP.to_string(), Value::String(id.to_string()));
		for (index, name) in names.iter().enumerate() {
			let cell = row.get(index + 1).unwrap_or_default();
			record.insert(name.clone(), coerce(cell));
		}
		records.insert(id.to_string(), record);
	}
	tracing::trace!(records = records.len(), columns = names.len(), "parsed TSV");
	Ok(records)
}

/// Reads and parses a TSV file.
pub fn read_tsv(path: impl AsRef<Path>) -> FixtureResult<RecordMap> {
	let path = path.as_ref();
	tracing::debug!(path = %path.display(), "reading TSV fixture");
	let text = std::fs::read_to_string(path)?;
	parse_tsv(&text)
}

fn coerce(cell: &str) -> Value {
	if cell.is_empty() || !cell.bytes().all(|b| b.is_ascii_digit()) {
		return Value::String(cell.to_string());
	}
	if let Ok(n) = cell.parse::<u64>() {
		return Value::Number(n.into());
	}
	cell.parse::<f64>()
		.ok()
		.and_then(Number::from_f64)
		.map_or_else(|| Value::String(cell.to_string()), Value::Number)
}
