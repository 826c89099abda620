//! Schema and share-token persistence.

use super::core::DbOperations;
use crate::error::FormFoldResult;
use crate::schema::types::FormSchema;

impl DbOperations {
    /// Stores a schema document, overwriting any existing version
    /// (whole-document replace, last-write-wins).
    pub fn store_schema(&self, schema: &FormSchema) -> FormFoldResult<()> {
        self.store_in_tree(&self.schemas_tree, &schema.id, schema)
    }

    /// Gets a schema document by id
    pub fn get_schema(&self, schema_id: &str) -> FormFoldResult<Option<FormSchema>> {
        self.get_from_tree(&self.schemas_tree, schema_id)
    }

    /// Checks if a schema exists
    pub fn schema_exists(&self, schema_id: &str) -> FormFoldResult<bool> {
        self.exists_in_tree(&self.schemas_tree, schema_id)
    }

    /// Deletes a schema document
    pub fn delete_schema(&self, schema_id: &str) -> FormFoldResult<bool> {
        self.delete_from_tree(&self.schemas_tree, schema_id)
    }

    /// Lists all schema documents
    pub fn list_schemas(&self) -> FormFoldResult<Vec<FormSchema>> {
        let items: Vec<(String, FormSchema)> = self.list_items_in_tree(&self.schemas_tree)?;
        Ok(items.into_iter().map(|(_, schema)| schema).collect())
    }

    /// Records a share token in the uniqueness index
    pub fn store_share_token(&self, token: &str, schema_id: &str) -> FormFoldResult<()> {
        self.store_in_tree(&self.share_tokens_tree, token, &schema_id.to_string())
    }

    /// Checks whether a share token is already taken
    pub fn share_token_exists(&self, token: &str) -> FormFoldResult<bool> {
        self.exists_in_tree(&self.share_tokens_tree, token)
    }

    /// Resolves a share token to its schema id
    pub fn get_schema_id_by_token(&self, token: &str) -> FormFoldResult<Option<String>> {
        self.get_from_tree(&self.share_tokens_tree, token)
    }

    /// Removes a share token from the index
    pub fn delete_share_token(&self, token: &str) -> FormFoldResult<bool> {
        self.delete_from_tree(&self.share_tokens_tree, token)
    }
}
