//! HTTP client for one storage node
//!
//! Every operation is a single request with no retries. Successful calls fill
//! the cache belonging to that operation; failed or cancelled calls leave all
//! caches untouched.

use super::{BlobStore, ChunkStore, ClientError, ClientResult, Operation};
use crate::address::{Address, Owner, Signature};
use crate::cache::Cache;
use crate::chunk::{soc, Chunk, ChunkError, SingleOwnerChunk};
use crate::config::{CacheConfig, Config, ConfigError, NodeConfig};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Body the node answers `GET /` with
pub const NODE_GREETING: &str = "Ethswarm Bee";

const PIN_HEADER: &str = "Swarm-Pin";
const ENCRYPT_HEADER: &str = "Swarm-Encrypt";
const POSTAGE_HEADER: &str = "Swarm-Postage-Batch-Id";
const OCTET_STREAM: &str = "application/octet-stream";

/// Envelope of address-returning endpoints
#[derive(Debug, Deserialize)]
struct ReferenceResponse {
    reference: String,
}

/// Entry counts of the client's caches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub chunks: usize,
    pub uploads: usize,
    pub downloads: usize,
}

/// Storage-node client
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    postage_batch_id: Option<String>,
    /// Caps requests in flight
    permits: Semaphore,
    /// address -> chunk bytes
    chunks: Cache<Address, Vec<u8>>,
    /// digest of (encrypt flag, content) -> (blob address, pinned)
    uploads: Cache<[u8; 32], (Address, bool)>,
    /// address -> blob bytes
    downloads: Cache<Address, Vec<u8>>,
}

impl Client {
    /// Create a client from a full configuration
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Self::with_settings(&config.node, &config.cache)
    }

    /// Create a client from node settings and cache capacities
    pub fn with_settings(node: &NodeConfig, cache: &CacheConfig) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(node.timeout())
            .pool_max_idle_per_host(node.max_idle_per_host)
            .build()
            .map_err(|e| ConfigError::Invalid(format!("failed to build http client: {}", e)))?;

        log::info!(
            "Storage node client for {} (timeout {}s, {} connections)",
            node.url,
            node.timeout_secs,
            node.max_connections_per_host
        );

        Ok(Self {
            http,
            base_url: node.url.trim_end_matches('/').to_string(),
            postage_batch_id: node.postage_batch_id.clone(),
            permits: Semaphore::new(node.max_connections_per_host.max(1)),
            chunks: Cache::new("chunk", cache.chunk_capacity),
            uploads: Cache::new("upload", cache.upload_capacity),
            downloads: Cache::new("download", cache.download_capacity),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            chunks: self.chunks.len(),
            uploads: self.uploads.len(),
            downloads: self.downloads.len(),
        }
    }

    /// Whether the node answers its root path with the expected greeting
    pub async fn check_connection(&self) -> bool {
        let op = Operation::CheckConnection;
        match self.execute(op, self.http.get(self.endpoint(""))).await {
            Ok((status, body)) => {
                status.is_success() && String::from_utf8_lossy(&body).trim() == NODE_GREETING
            }
            Err(e) => {
                log::warn!("{}", e);
                false
            }
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Attach stamp and pin headers to an upload
    fn upload_request(&self, path: &str, pin: bool) -> RequestBuilder {
        let mut request = self
            .http
            .post(self.endpoint(path))
            .header(CONTENT_TYPE, OCTET_STREAM);
        if let Some(batch) = &self.postage_batch_id {
            request = request.header(POSTAGE_HEADER, batch);
        }
        if pin {
            request = request.header(PIN_HEADER, "true");
        }
        request
    }

    /// Send a request and read its whole body
    async fn execute(
        &self,
        op: Operation,
        request: RequestBuilder,
    ) -> ClientResult<(StatusCode, Vec<u8>)> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ClientError::Cancelled { op })?;

        let response = request
            .send()
            .await
            .map_err(|source| ClientError::Transport { op, source })?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|source| ClientError::Transport { op, source })?;
        Ok((status, body.to_vec()))
    }

    fn check_status(
        op: Operation,
        address: &str,
        status: StatusCode,
        body: &[u8],
    ) -> ClientResult<()> {
        if status.is_success() {
            return Ok(());
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound {
                op,
                address: address.to_string(),
            });
        }
        Err(ClientError::Status {
            op,
            status,
            body: String::from_utf8_lossy(body).trim().to_string(),
        })
    }

    fn parse_reference(op: Operation, body: &[u8]) -> ClientResult<Address> {
        let envelope: ReferenceResponse =
            serde_json::from_slice(body).map_err(|e| ClientError::Decode {
                op,
                message: format!("invalid reference envelope: {}", e),
            })?;
        Address::from_hex(&envelope.reference).map_err(|e| ClientError::Decode {
            op,
            message: format!("invalid reference {:?}: {}", envelope.reference, e),
        })
    }

    /// Upload a request body and parse the returned reference
    async fn upload(
        &self,
        op: Operation,
        request: RequestBuilder,
        body: Vec<u8>,
    ) -> ClientResult<Address> {
        let start = Instant::now();
        let size = body.len();
        let result = async {
            let (status, response) = self.execute(op, request.body(body)).await?;
            Self::check_status(op, "-", status, &response)?;
            Self::parse_reference(op, &response)
        }
        .await;

        match &result {
            Ok(address) => log::debug!("{} {} ({} bytes) in {:?}", op, address, size, start.elapsed()),
            Err(e) => log::warn!("{} ({} bytes) failed after {:?}: {}", op, size, start.elapsed(), e),
        }
        result
    }

    /// Fetch `path`, returning status and body of a successful response
    async fn download(
        &self,
        op: Operation,
        path: &str,
        address: &Address,
    ) -> ClientResult<(StatusCode, Vec<u8>)> {
        let start = Instant::now();
        let result = async {
            let (status, body) = self.execute(op, self.http.get(self.endpoint(path))).await?;
            Self::check_status(op, &address.to_hex(), status, &body)?;
            Ok::<_, ClientError>((status, body))
        }
        .await;

        match &result {
            Ok((_, body)) => log::debug!("{} {} ({} bytes) in {:?}", op, address, body.len(), start.elapsed()),
            Err(e) if e.is_not_found() => log::debug!("{} after {:?}", e, start.elapsed()),
            Err(e) => log::warn!("{} failed after {:?}: {}", op, start.elapsed(), e),
        }
        result
    }

    async fn unpin(&self, op: Operation, path: &str, address: &Address) -> ClientResult<()> {
        let start = Instant::now();
        let (status, body) = self.execute(op, self.http.delete(self.endpoint(path))).await?;
        let result = Self::check_status(op, &address.to_hex(), status, &body);
        log::debug!("{} {} -> {} in {:?}", op, address, status, start.elapsed());
        result
    }

    /// Plain chunks must hash to `address`; anything else must at least be
    /// framed as a single-owner chunk, whose owner is unknown here
    fn check_chunk(address: &Address, body: &[u8]) -> Result<(), ChunkError> {
        match Chunk::from_bytes(body).and_then(|chunk| chunk.verify(address)) {
            Ok(()) => Ok(()),
            Err(e) => SingleOwnerChunk::from_bytes(body).map(|_| ()).map_err(|_| e),
        }
    }
}

/// Upload-dedup key: encrypted and plain uploads of the same bytes differ
fn upload_key(data: &[u8], encrypt: bool) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&[encrypt as u8]);
    hasher.update(data);
    hasher.finalize().into()
}

#[async_trait]
impl ChunkStore for Client {
    async fn upload_chunk(&self, chunk: &Chunk, pin: bool) -> ClientResult<Address> {
        let op = Operation::UploadChunk;
        let bytes = chunk.to_bytes();
        let request = self.upload_request("chunks", pin);
        let address = self.upload(op, request, bytes.clone()).await?;

        chunk
            .verify(&address)
            .map_err(|source| ClientError::InvalidChunk { op, source })?;

        self.chunks.put(address, bytes);
        Ok(address)
    }

    async fn download_chunk(
        &self,
        cancel: &CancellationToken,
        address: &Address,
    ) -> ClientResult<Vec<u8>> {
        let op = Operation::DownloadChunk;
        if let Some(data) = self.chunks.get(address) {
            log::debug!("{} {} (cached)", op, address);
            return Ok(data);
        }

        let path = format!("chunks/{}", address);
        let (_, body) = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClientError::Cancelled { op }),
            result = self.download(op, &path, address) => result?,
        };

        Self::check_chunk(address, &body).map_err(|source| {
            log::warn!("{} {}: node returned an invalid chunk: {}", op, address, source);
            ClientError::InvalidChunk { op, source }
        })?;
        self.chunks.put(*address, body.clone());
        Ok(body)
    }

    async fn upload_soc(
        &self,
        owner: &Owner,
        id: &Address,
        signature: &Signature,
        chunk: &Chunk,
    ) -> ClientResult<Address> {
        let op = Operation::UploadSoc;
        let path = format!("soc/{}/{}?sig={}", owner, id, signature.to_hex());
        let request = self.upload_request(&path, false);
        let address = self.upload(op, request, chunk.to_bytes()).await?;

        let expected = soc::soc_address(id, owner);
        if address != expected {
            return Err(ClientError::Decode {
                op,
                message: format!("node returned {} for soc {}", address, expected),
            });
        }
        Ok(address)
    }

    async fn delete_chunk(&self, address: &Address) -> ClientResult<()> {
        let path = format!("pin/chunks/{}", address);
        self.unpin(Operation::DeleteChunk, &path, address).await
    }
}

#[async_trait]
impl BlobStore for Client {
    async fn upload_blob(&self, data: &[u8], pin: bool, encrypt: bool) -> ClientResult<Address> {
        let op = Operation::UploadBlob;
        let key = upload_key(data, encrypt);
        // An entry uploaded without a pin cannot answer a pinned upload
        if let Some((address, pinned)) = self.uploads.get(&key) {
            if pinned || !pin {
                log::debug!("{} {} ({} bytes, cached)", op, address, data.len());
                return Ok(address);
            }
        }

        let mut request = self.upload_request("bytes", pin);
        if encrypt {
            request = request.header(ENCRYPT_HEADER, "true");
        }
        let address = self.upload(op, request, data.to_vec()).await?;

        self.uploads.put(key, (address, pin));
        Ok(address)
    }

    async fn download_blob(&self, address: &Address) -> ClientResult<(Vec<u8>, StatusCode)> {
        let op = Operation::DownloadBlob;
        if let Some(data) = self.downloads.get(address) {
            log::debug!("{} {} (cached)", op, address);
            return Ok((data, StatusCode::OK));
        }

        let path = format!("bytes/{}", address);
        let (status, body) = self.download(op, &path, address).await?;

        self.downloads.put(*address, body.clone());
        Ok((body, status))
    }

    async fn delete_blob(&self, address: &Address) -> ClientResult<()> {
        let path = format!("pin/bytes/{}", address);
        self.unpin(Operation::DeleteBlob, &path, address).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testnode::TestNode;
    use std::time::Duration;

    async fn client_for(node: &TestNode) -> Client {
        Client::new(&Config::for_node(node.url())).unwrap()
    }

    #[tokio::test]
    async fn test_chunk_roundtrip() {
        let node = TestNode::start().await;
        let client = client_for(&node).await;

        let chunk = Chunk::new(b"hello chunk".to_vec()).unwrap();
        let address = client.upload_chunk(&chunk, false).await.unwrap();
        assert_eq!(address, chunk.address());

        // Re-upload yields the same address
        assert_eq!(client.upload_chunk(&chunk, false).await.unwrap(), address);

        // Served from the cache filled by the upload
        let cancel = CancellationToken::new();
        let data = client.download_chunk(&cancel, &address).await.unwrap();
        assert_eq!(Chunk::from_bytes(&data).unwrap(), chunk);
        assert_eq!(node.hits("GET /chunks"), 0);

        // A fresh client has to go to the node
        let fresh = client_for(&node).await;
        let data = fresh.download_chunk(&cancel, &address).await.unwrap();
        assert_eq!(Chunk::from_bytes(&data).unwrap(), chunk);
        assert_eq!(node.hits("GET /chunks"), 1);
        fresh.download_chunk(&cancel, &address).await.unwrap();
        assert_eq!(node.hits("GET /chunks"), 1);
    }

    #[tokio::test]
    async fn test_random_chunk_roundtrip() {
        let node = TestNode::start().await;
        let client = client_for(&node).await;
        let fresh = client_for(&node).await;
        let cancel = CancellationToken::new();

        for size in [0usize, 1, 31, 32, 33, 4095, 4096] {
            let payload: Vec<u8> = (0..size).map(|_| rand::random::<u8>()).collect();
            let chunk = Chunk::new(payload).unwrap();
            let address = client.upload_chunk(&chunk, false).await.unwrap();
            let data = fresh.download_chunk(&cancel, &address).await.unwrap();
            assert_eq!(Chunk::from_bytes(&data).unwrap(), chunk, "size {}", size);
        }
    }

    #[tokio::test]
    async fn test_pin_header_sent() {
        let node = TestNode::start().await;
        let client = client_for(&node).await;

        let chunk = Chunk::new(b"pinned".to_vec()).unwrap();
        let address = client.upload_chunk(&chunk, true).await.unwrap();
        assert!(node.is_pinned(&address));

        let other = Chunk::new(b"not pinned".to_vec()).unwrap();
        let address = client.upload_chunk(&other, false).await.unwrap();
        assert!(!node.is_pinned(&address));
    }

    #[tokio::test]
    async fn test_missing_chunk_is_not_found() {
        let node = TestNode::start().await;
        let client = client_for(&node).await;

        let address = Address::keccak(&[b"nothing here"]);
        let err = client
            .download_chunk(&CancellationToken::new(), &address)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.operation(), Operation::DownloadChunk);
        assert_eq!(client.cache_stats().chunks, 0);
    }

    #[tokio::test]
    async fn test_cancelled_download_leaves_cache_empty() {
        let node = TestNode::start().await;
        let client = client_for(&node).await;

        let chunk = Chunk::new(b"cancel me".to_vec()).unwrap();
        let address = node.insert_chunk(&chunk);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = client.download_chunk(&cancel, &address).await.unwrap_err();
        assert!(matches!(err, ClientError::Cancelled { .. }));
        assert_eq!(client.cache_stats().chunks, 0);
        assert_eq!(node.hits("GET /chunks"), 0);
    }

    #[tokio::test]
    async fn test_cancel_while_request_pending() {
        let node = TestNode::start().await;
        let client = client_for(&node).await;

        let chunk = Chunk::new(b"slow chunk".to_vec()).unwrap();
        let address = node.insert_chunk(&chunk);
        node.delay_downloads(Duration::from_secs(5));

        let cancel = CancellationToken::new();
        let cancel_once_requested = async {
            while node.hits("GET /chunks") == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            cancel.cancel();
        };
        let (result, ()) = tokio::join!(
            client.download_chunk(&cancel, &address),
            cancel_once_requested
        );
        assert!(matches!(result, Err(ClientError::Cancelled { .. })));
        assert_eq!(node.hits("GET /chunks"), 1);
        assert_eq!(client.cache_stats().chunks, 0);

        // Nothing was remembered, so the next download asks the node again
        node.delay_downloads(Duration::ZERO);
        let data = client
            .download_chunk(&CancellationToken::new(), &address)
            .await
            .unwrap();
        assert_eq!(Chunk::from_bytes(&data).unwrap(), chunk);
        assert_eq!(node.hits("GET /chunks"), 2);
    }

    #[tokio::test]
    async fn test_invalid_chunk_is_rejected_and_not_cached() {
        let node = TestNode::start().await;
        let client = client_for(&node).await;
        let cancel = CancellationToken::new();

        // Well framed, but hashes to a different address
        let address = Chunk::new(b"expected".to_vec()).unwrap().address();
        let impostor = Chunk::new(b"impostor".to_vec()).unwrap();
        node.insert_raw_chunk(address, impostor.to_bytes());

        let err = client.download_chunk(&cancel, &address).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::InvalidChunk {
                source: ChunkError::AddressMismatch { .. },
                ..
            }
        ));
        assert_eq!(client.cache_stats().chunks, 0);
        assert!(client.download_chunk(&cancel, &address).await.is_err());
        assert_eq!(node.hits("GET /chunks"), 2);

        // Too short for any chunk framing
        let short = Address::keccak(&[b"short"]);
        node.insert_raw_chunk(short, vec![1, 2, 3]);
        let err = client.download_chunk(&cancel, &short).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidChunk { .. }));
    }

    #[tokio::test]
    async fn test_blob_download_cached() {
        let node = TestNode::start().await;
        let client = client_for(&node).await;

        let address = node.insert_blob(b"some blob content");
        let (data, status) = client.download_blob(&address).await.unwrap();
        assert_eq!(data, b"some blob content");
        assert_eq!(status, StatusCode::OK);

        let (again, _) = client.download_blob(&address).await.unwrap();
        assert_eq!(again, data);
        assert_eq!(node.hits("GET /bytes"), 1);
    }

    #[tokio::test]
    async fn test_blob_download_not_found_not_cached() {
        let node = TestNode::start().await;
        let client = client_for(&node).await;

        let address = Address::keccak(&[b"missing blob"]);
        let err = client.download_blob(&address).await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(client.cache_stats().downloads, 0);

        // Still absent: the second call reaches the node again
        assert!(client.download_blob(&address).await.is_err());
        assert_eq!(node.hits("GET /bytes"), 2);
    }

    #[tokio::test]
    async fn test_blob_upload_dedup() {
        let node = TestNode::start().await;
        let client = client_for(&node).await;

        let data = vec![42u8; 10_000];
        let first = client.upload_blob(&data, false, false).await.unwrap();
        let second = client.upload_blob(&data, false, false).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(node.hits("POST /bytes"), 1);

        // Encrypted upload of the same bytes is a separate request
        client.upload_blob(&data, false, true).await.unwrap();
        assert_eq!(node.hits("POST /bytes"), 2);
        assert!(node.saw_encrypt_header());

        // Pinning content first uploaded unpinned reaches the node once
        client.upload_blob(&data, true, false).await.unwrap();
        assert_eq!(node.hits("POST /bytes"), 3);
        assert!(node.is_pinned(&first));
        client.upload_blob(&data, true, false).await.unwrap();
        client.upload_blob(&data, false, false).await.unwrap();
        assert_eq!(node.hits("POST /bytes"), 3);
    }

    #[tokio::test]
    async fn test_pinned_blob_upload_dedup() {
        let node = TestNode::start().await;
        let client = client_for(&node).await;

        let first = client.upload_blob(b"same", true, false).await.unwrap();
        let second = client.upload_blob(b"same", true, false).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(node.hits("POST /bytes"), 1);
        assert!(node.is_pinned(&first));
    }

    #[tokio::test]
    async fn test_server_error_is_status() {
        let node = TestNode::start().await;
        let client = client_for(&node).await;

        node.fail_uploads(true);
        let err = client.upload_blob(b"doomed", false, false).await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(client.cache_stats().uploads, 0);

        // Failures are not remembered
        node.fail_uploads(false);
        client.upload_blob(b"doomed", false, false).await.unwrap();
        assert_eq!(client.cache_stats().uploads, 1);
    }

    #[tokio::test]
    async fn test_malformed_envelope_is_decode_error() {
        let node = TestNode::start().await;
        let client = client_for(&node).await;

        node.garble_references(true);
        let err = client.upload_blob(b"garbled", false, false).await.unwrap_err();
        assert!(matches!(err, ClientError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_node_is_transport_error() {
        // Nothing listens on port 9 of localhost in the test environment
        let client = Client::new(&Config::for_node("http://127.0.0.1:9")).unwrap();
        let err = client.upload_blob(b"x", false, false).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport { .. }));
        assert!(!client.check_connection().await);
    }

    #[tokio::test]
    async fn test_check_connection() {
        let node = TestNode::start().await;
        let client = client_for(&node).await;
        assert!(client.check_connection().await);
    }

    #[tokio::test]
    async fn test_unpin_twice() {
        let node = TestNode::start().await;
        let client = client_for(&node).await;

        let address = client.upload_blob(b"pin me", true, false).await.unwrap();
        assert!(node.is_pinned(&address));

        client.delete_blob(&address).await.unwrap();
        assert!(!node.is_pinned(&address));

        // Second unpin reports a benign not-found
        let err = client.delete_blob(&address).await.unwrap_err();
        assert!(err.is_not_found());

        let chunk = Chunk::new(b"pinned chunk".to_vec()).unwrap();
        let address = client.upload_chunk(&chunk, true).await.unwrap();
        client.delete_chunk(&address).await.unwrap();
        assert!(client.delete_chunk(&address).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_soc_upload_path() {
        let node = TestNode::start().await;
        let client = client_for(&node).await;

        let owner = Owner::from_bytes([9u8; 20]);
        let id = Address::keccak(&[b"soc id"]);
        let signature = Signature::from_bytes([1u8; 65]);
        let chunk = Chunk::new(b"soc payload".to_vec()).unwrap();

        let address = client.upload_soc(&owner, &id, &signature, &chunk).await.unwrap();
        assert_eq!(address, soc::soc_address(&id, &owner));

        let data = client
            .download_chunk(&CancellationToken::new(), &address)
            .await
            .unwrap();
        let parsed = soc::SingleOwnerChunk::from_bytes(&data).unwrap();
        assert_eq!(parsed.id, id);
        assert_eq!(parsed.signature, signature);
        assert_eq!(parsed.chunk, chunk);
    }

    #[tokio::test]
    async fn test_disabled_caches_still_work() {
        let node = TestNode::start().await;
        let mut config = Config::for_node(node.url());
        config.cache = CacheConfig {
            chunk_capacity: 0,
            upload_capacity: 0,
            download_capacity: 0,
        };
        let client = Client::new(&config).unwrap();

        let a = client.upload_blob(b"uncached", false, false).await.unwrap();
        let b = client.upload_blob(b"uncached", false, false).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(node.hits("POST /bytes"), 2);

        client.download_blob(&a).await.unwrap();
        client.download_blob(&a).await.unwrap();
        assert_eq!(node.hits("GET /bytes"), 2);
        assert_eq!(
            client.cache_stats(),
            CacheStats {
                chunks: 0,
                uploads: 0,
                downloads: 0
            }
        );
    }

    #[tokio::test]
    async fn test_concurrent_downloads() {
        let node = TestNode::start().await;
        let client = std::sync::Arc::new(client_for(&node).await);

        let mut addresses = Vec::new();
        for i in 0..20u32 {
            addresses.push(node.insert_blob(format!("blob {}", i).as_bytes()));
        }

        let mut handles = Vec::new();
        for (i, address) in addresses.into_iter().enumerate() {
            let client = client.clone();
            handles.push(tokio::spawn(async move {
                let (data, _) = client.download_blob(&address).await.unwrap();
                assert_eq!(data, format!("blob {}", i).as_bytes());
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(client.cache_stats().downloads, 20);
    }
}
