use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
	pub id: String,
	pub vector: Vec<f32>,
	#[serde(default)]
	pub metadata: Map<String, Value>,
}

/// One ranked search result. Order is whatever the remote ranking produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
	pub id: String,
	pub score: f32,
	#[serde(default)]
	pub metadata: Option<Value>,
}

pub const DEFAULT_TOP_K: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
	pub vector: Vec<f32>,
	#[serde(default = "default_top_k")]
	pub top_k: u32,
	#[serde(default)]
	pub filter: Option<String>,
}
impl SearchQuery {
	pub fn new(vector: Vec<f32>) -> Self {
		Self { vector, top_k: DEFAULT_TOP_K, filter: None }
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimensionError {
	ZeroDimension,
	Mismatch { id: Option<String>, expected: u32, actual: usize },
}
impl fmt::Display for DimensionError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::ZeroDimension => write!(f, "Vector dimension must be greater than zero."),
			Self::Mismatch { id: Some(id), expected, actual } => write!(
				f,
				"Vector {id} has dimension {actual}, collection expects {expected}."
			),
			Self::Mismatch { id: None, expected, actual } =>
				write!(f, "Query vector has dimension {actual}, collection expects {expected}."),
		}
	}
}

impl std::error::Error for DimensionError {}

pub fn check_record_dimensions(
	expected: u32,
	records: &[VectorRecord],
) -> Result<(), DimensionError> {
	if expected == 0 {
		return Err(DimensionError::ZeroDimension);
	}

	for record in records {
		if record.vector.len() != expected as usize {
			return Err(DimensionError::Mismatch {
				id: Some(record.id.clone()),
				expected,
				actual: record.vector.len(),
			});
		}
	}

	Ok(())
}

pub fn check_query_dimension(expected: u32, query: &[f32]) -> Result<(), DimensionError> {
	if expected == 0 {
		return Err(DimensionError::ZeroDimension);
	}
	if query.len() != expected as usize {
		return Err(DimensionError::Mismatch { id: None, expected, actual: query.len() });
	}

	Ok(())
}

fn default_top_k() -> u32 {
	DEFAULT_TOP_K
}
