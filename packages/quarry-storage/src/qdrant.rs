use qdrant_client::qdrant::{
	CreateCollectionBuilder, CreateFieldIndexCollectionBuilder, Distance, FieldType, Modifier,
	SparseVectorParamsBuilder, SparseVectorsConfigBuilder, VectorParamsBuilder,
	VectorsConfigBuilder,
};

use quarry_domain::criteria::DocumentField;

use crate::Result;

pub const DENSE_VECTOR_NAME: &str = "dense";
pub const BM25_MODEL: &str = "qdrant/bm25";

/// Payload key holding the stable (possibly chunked) document id.
pub const DOC_ID_KEY: &str = "doc_id";
/// Payload key holding the knowledge base a document belongs to.
pub const COLLECTION_KEY: &str = "collection";
/// Payload key every search is filtered on.
pub const CATEGORY_KEY: &str = "category";

/// Name of the BM25 sparse vector indexed for `field`.
pub fn bm25_vector_name(field: DocumentField) -> &'static str {
	match field {
		DocumentField::Title => "title_bm25",
		DocumentField::Content => "content_bm25",
		DocumentField::Path => "path_bm25",
		DocumentField::Keywords => "keywords_bm25",
	}
}

pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &quarry_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	/// Creates the document collection with one dense vector and one BM25 vector per field.
	///
	/// Existing collections are left untouched.
	pub async fn ensure_collection(&self) -> Result<()> {
		if self.client.collection_exists(self.collection.clone()).await? {
			return Ok(());
		}

		let mut vectors_config = VectorsConfigBuilder::default();

		vectors_config.add_named_vector_params(
			DENSE_VECTOR_NAME,
			VectorParamsBuilder::new(self.vector_dim.into(), Distance::Cosine),
		);

		let mut sparse_vectors_config = SparseVectorsConfigBuilder::default();

		for field in DocumentField::ALL {
			sparse_vectors_config.add_named_vector_params(
				bm25_vector_name(field),
				SparseVectorParamsBuilder::default().modifier(Modifier::Idf as i32),
			);
		}

		self.client
			.create_collection(
				CreateCollectionBuilder::new(self.collection.clone())
					.vectors_config(vectors_config)
					.sparse_vectors_config(sparse_vectors_config),
			)
			.await?;
		self.client
			.create_field_index(
				CreateFieldIndexCollectionBuilder::new(
					self.collection.clone(),
					CATEGORY_KEY,
					FieldType::Keyword,
				)
				.wait(true),
			)
			.await?;

		tracing::info!(collection = %self.collection, "Created Qdrant collection.");

		Ok(())
	}
}
