use async_trait::async_trait;

use crate::{
	Document, DocumentId, DocumentSnapshot, Filter, QuerySnapshot, StoreError, Subscription,
};

/// Document database with live query support.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
	async fn create(&self, collection: &str, doc: Document) -> Result<DocumentId, StoreError>;

	async fn get(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>, StoreError>;

	/// Merges `patch` into the stored document. Fails with [`StoreError::NotFound`] if there is
	/// nothing to merge into.
	async fn update(
		&self,
		collection: &str,
		id: &DocumentId,
		patch: Document,
	) -> Result<(), StoreError>;

	/// Deleting a document that doesn't exist is not an error.
	async fn delete(&self, collection: &str, id: &DocumentId) -> Result<(), StoreError>;

	async fn subscribe_query(
		&self,
		collection: &str,
		filter: Filter,
	) -> Result<Subscription<QuerySnapshot>, StoreError>;

	async fn subscribe_doc(
		&self,
		collection: &str,
		id: &DocumentId,
	) -> Result<Subscription<DocumentSnapshot>, StoreError>;
}
