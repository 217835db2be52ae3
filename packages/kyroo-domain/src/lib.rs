pub mod naming;
pub mod record;
pub mod schema;
pub mod status;

pub use record::{DimensionError, SearchHit, SearchQuery, VectorRecord};
pub use schema::{DefaultCollection, IndexType, MetricType, VectorSchema};
pub use status::{CollectionStatus, MemberRole, OWNER_PERMISSIONS};
