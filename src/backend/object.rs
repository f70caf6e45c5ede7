use crate::backend::{self, Backend};
use crate::cache::{CacheStats, ShardCache};
use crate::config::BackendOptions;
use crate::error::{Error, Result};
use crate::index::ShardIndex;
use crate::util::shard_filename;
use object_store::ObjectStore;
use object_store::path::Path as ObjectPath;
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Reads shards from any `object_store` implementation (S3, MinIO, GCS,
/// Azure, local filesystem, in-memory).
///
/// The async client is driven by an owned current-thread runtime, so this
/// backend must not be used from inside another Tokio runtime's async
/// context. Client timeouts and retries are whatever the store was built
/// with.
pub struct ObjectStoreBackend {
  store: Arc<dyn ObjectStore>,
  prefix: String,
  index: ShardIndex,
  options: BackendOptions,
  cache: ShardCache,
  runtime: Runtime,
}

impl ObjectStoreBackend {
  /// Opens the shard set stored under `prefix` in `store`.
  pub fn new(store: Arc<dyn ObjectStore>, prefix: &str, options: BackendOptions) -> Result<Self> {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let prefix = prefix.trim_matches('/').to_string();

    let descriptor_key = object_key(&prefix, &options.descriptor_name);
    let bytes = runtime.block_on(async {
      match store.get(&descriptor_key).await {
        Ok(res) => res.bytes().await.map(Some),
        Err(object_store::Error::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
      }
    })?;
    let bytes = bytes.ok_or_else(|| Error::DescriptorNotFound(descriptor_key.to_string().into()))?;
    let index = ShardIndex::from_json(&bytes)?;
    let cache = ShardCache::new(options.cache_capacity)?;

    tracing::debug!(
      target: "ironshard",
      "Opened object store shard set {}/{}: {} shards, {} characters",
      store,
      prefix,
      index.num_shards(),
      index.total_length()
    );

    Ok(Self {
      store,
      prefix,
      index,
      options,
      cache,
      runtime,
    })
  }

  /// Opens a shard set in an S3-compatible bucket. Credentials and region
  /// come from the standard `AWS_*` environment variables; `endpoint` points
  /// at MinIO or another S3-compatible service.
  pub fn s3(bucket: &str, prefix: &str, endpoint: Option<&str>, options: BackendOptions) -> Result<Self> {
    let mut builder = object_store::aws::AmazonS3Builder::from_env().with_bucket_name(bucket);
    if let Some(endpoint) = endpoint {
      builder = builder.with_endpoint(endpoint).with_allow_http(true);
    }
    let store = builder.build()?;
    Self::new(Arc::new(store), prefix, options)
  }

  pub fn prefix(&self) -> &str {
    &self.prefix
  }

  fn read_shard_uncached(&self, shard_id: u64) -> Result<String> {
    let meta = backend::shard_meta(&self.index, shard_id)?;
    let key = object_key(&self.prefix, &shard_filename(shard_id, &self.options.shard_extension));

    let bytes = self.runtime.block_on(async {
      match self.store.get(&key).await {
        Ok(res) => res.bytes().await.map(Some),
        Err(object_store::Error::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
      }
    })?;
    let bytes = bytes.ok_or(Error::ShardNotFound(shard_id))?;

    let text = String::from_utf8(bytes.to_vec())
      .map_err(|e| Error::Corruption(format!("Shard {} is not valid UTF-8: {}", shard_id, e)))?;
    backend::verify_shard(&text, meta)?;
    Ok(text)
  }
}

impl Backend for ObjectStoreBackend {
  fn index(&self) -> &ShardIndex {
    &self.index
  }

  fn fetch_shard(&self, shard_id: u64) -> Result<Arc<String>> {
    self.cache.get_or_load(shard_id, || self.read_shard_uncached(shard_id))
  }

  fn fetch_shard_slice(&self, shard_id: u64, offset: u64, length: u64) -> Result<String> {
    let text = self.fetch_shard(shard_id)?;
    backend::slice_shard(&text, shard_id, offset, length)
  }

  fn cache_stats(&self) -> Option<CacheStats> {
    Some(self.cache.stats())
  }
}

/// Joins `prefix` and an object name into a store path.
pub(crate) fn object_key(prefix: &str, name: &str) -> ObjectPath {
  if prefix.is_empty() {
    ObjectPath::from(name)
  } else {
    ObjectPath::from(format!("{}/{}", prefix, name))
  }
}
