//! Form schema management: the schema documents themselves, the store that
//! owns them, and the identity resolver that reconciles field ids with
//! human labels when reading submission values.

pub mod resolver;
pub mod store;
pub mod types;

pub use store::SchemaStore;
pub use types::{FormSchema, FormSettings, SchemaDeleteReport, SchemaSummary};
