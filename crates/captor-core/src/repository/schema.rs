//! Data schema and data field repository trait definition.

use captor_types::agent::{DataField, DataSchema, NewDataField, SchemaType};
use captor_types::error::RepositoryError;

/// Repository trait for an agent's data schema and its fields.
///
/// The store may hold several schemas for one agent; only the canonical one
/// (the earliest created) is ever read or modified through this trait.
pub trait SchemaRepository: Send + Sync {
    /// The agent's canonical schema with its fields in creation order.
    fn get_canonical(
        &self,
        agent_id: i64,
    ) -> impl std::future::Future<Output = Result<Option<DataSchema>, RepositoryError>> + Send;

    fn update_type(
        &self,
        schema_id: i64,
        schema_type: SchemaType,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn get_field(
        &self,
        field_id: i64,
    ) -> impl std::future::Future<Output = Result<Option<DataField>, RepositoryError>> + Send;

    fn create_field(
        &self,
        schema_id: i64,
        field: &NewDataField,
    ) -> impl std::future::Future<Output = Result<DataField, RepositoryError>> + Send;

    /// Persist a field's attributes. `schema_id` is never changed.
    fn update_field(
        &self,
        field: &DataField,
    ) -> impl std::future::Future<Output = Result<DataField, RepositoryError>> + Send;
}
