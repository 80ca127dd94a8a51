pub mod access;
pub mod engine;
pub mod search;

mod error;

pub use access::{
	GrantRequest, GrantResponse, ListGrantsRequest, ListGrantsResponse, RevokeRequest,
	RevokeResponse,
};
pub use engine::{FieldFilter, HybridQuery, HybridQueryResult, RawHit};
pub use error::{Error, Result};
pub use search::{
	BoostInputs, FusionPolicy, LinearBlend, PerKind, RankExplain, RankSource, RetrieveRequest,
	RetrieveResponse, ScoreCombiner, SearchResult,
};

use std::{future::Future, pin::Pin, sync::Arc};

use quarry_config::{Config, EmbeddingProviderConfig};
use quarry_domain::access::Grant;
use quarry_providers::embedding;
use quarry_storage::{db::Db, qdrant::QdrantStore};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

/// A hybrid lexical/vector index.
pub trait SearchEngine
where
	Self: Send + Sync,
{
	/// Runs every query in one round trip; result `i` answers query `i`.
	fn batch_hybrid_search<'a>(
		&'a self,
		queries: &'a [HybridQuery],
	) -> BoxFuture<'a, Result<Vec<HybridQueryResult>>>;
}

/// Storage of per-user path grants.
pub trait PermissionStore
where
	Self: Send + Sync,
{
	fn find_grants_for_user<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Vec<Grant>>>;

	/// Writes `grant`, replacing the grant on the same user and path. Returns the paths of grants
	/// removed because the new grant supersedes them.
	fn put_grant<'a>(
		&'a self,
		grant: &'a Grant,
		granted_by: Option<&'a str>,
	) -> BoxFuture<'a, Result<Vec<String>>>;

	fn remove_grant<'a>(
		&'a self,
		user_id: &'a str,
		document_path: &'a str,
	) -> BoxFuture<'a, Result<bool>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
}

#[derive(Clone)]
pub struct Backends {
	pub engine: Arc<dyn SearchEngine>,
	pub permissions: Arc<dyn PermissionStore>,
}

pub struct QuarryService {
	pub cfg: Config,
	pub backends: Backends,
	pub providers: Providers,
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(embedding::embed(cfg, texts).await?) })
	}
}

impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>) -> Self {
		Self { embedding }
	}
}

impl Default for Providers {
	fn default() -> Self {
		Self { embedding: Arc::new(DefaultProviders) }
	}
}

impl Backends {
	pub fn new(engine: Arc<dyn SearchEngine>, permissions: Arc<dyn PermissionStore>) -> Self {
		Self { engine, permissions }
	}
}

impl QuarryService {
	pub fn new(cfg: Config, db: Db, qdrant: QdrantStore) -> Self {
		let backends = Backends::new(Arc::new(qdrant), Arc::new(db));

		Self { cfg, backends, providers: Providers::default() }
	}

	pub fn with_backends(cfg: Config, backends: Backends, providers: Providers) -> Self {
		Self { cfg, backends, providers }
	}
}
