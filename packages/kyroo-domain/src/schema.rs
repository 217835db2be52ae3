use serde::{Deserialize, Serialize};

use crate::record::DimensionError;

pub const TEXT_EMBEDDINGS_DIMENSION: u32 = 1_536;
pub const IMAGE_EMBEDDINGS_DIMENSION: u32 = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricType {
	L2,
	Ip,
	Cosine,
}
impl MetricType {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::L2 => "L2",
			Self::Ip => "IP",
			Self::Cosine => "COSINE",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndexType {
	IvfFlat,
	IvfSq8,
	IvfPq,
	Hnsw,
	Scann,
}
impl IndexType {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::IvfFlat => "IVF_FLAT",
			Self::IvfSq8 => "IVF_SQ8",
			Self::IvfPq => "IVF_PQ",
			Self::Hnsw => "HNSW",
			Self::Scann => "SCANN",
		}
	}
}

/// Layout of a remote collection. Fixed once the collection exists remotely; changing any field
/// means deleting and recreating the collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorSchema {
	pub name: String,
	#[serde(default)]
	pub description: Option<String>,
	pub dimension: u32,
	pub metric_type: MetricType,
	pub index_type: IndexType,
}
impl VectorSchema {
	pub fn validate(&self) -> Result<(), DimensionError> {
		if self.dimension == 0 {
			return Err(DimensionError::ZeroDimension);
		}

		Ok(())
	}

	/// The same layout under the name and description of a concrete remote collection.
	pub fn for_remote(&self, remote_name: &str, description: Option<&str>) -> Self {
		Self {
			name: remote_name.to_string(),
			description: description.map(str::to_string).or_else(|| self.description.clone()),
			dimension: self.dimension,
			metric_type: self.metric_type,
			index_type: self.index_type,
		}
	}

	pub fn text_embeddings() -> Self {
		Self {
			name: "text_embeddings".to_string(),
			description: Some("Text embeddings collection".to_string()),
			dimension: TEXT_EMBEDDINGS_DIMENSION,
			metric_type: MetricType::Cosine,
			index_type: IndexType::Hnsw,
		}
	}

	pub fn image_embeddings() -> Self {
		Self {
			name: "image_embeddings".to_string(),
			description: Some("Image embeddings collection".to_string()),
			dimension: IMAGE_EMBEDDINGS_DIMENSION,
			metric_type: MetricType::L2,
			index_type: IndexType::IvfFlat,
		}
	}
}

#[derive(Debug, Clone)]
pub struct DefaultCollection {
	pub name: &'static str,
	pub description: &'static str,
	pub schema: VectorSchema,
}

/// Collections provisioned for every workspace that gets a remote cluster.
pub fn default_collections() -> Vec<DefaultCollection> {
	vec![
		DefaultCollection {
			name: "Text Embeddings",
			description: "Default collection for text embeddings",
			schema: VectorSchema::text_embeddings(),
		},
		DefaultCollection {
			name: "Image Embeddings",
			description: "Default collection for image embeddings",
			schema: VectorSchema::image_embeddings(),
		},
	]
}
