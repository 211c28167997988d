//! In-process storage node for client tests
//!
//! Speaks the subset of the node HTTP API the client uses and counts
//! requests per route so tests can assert on network round trips.

use crate::address::{Address, Owner, Signature};
use crate::chunk::{soc, Chunk, SingleOwnerChunk};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct NodeState {
    chunks: Mutex<HashMap<Address, Vec<u8>>>,
    blobs: Mutex<HashMap<Address, Vec<u8>>>,
    pins: Mutex<HashSet<Address>>,
    hits: Mutex<HashMap<&'static str, usize>>,
    fail_uploads: AtomicBool,
    garble: AtomicBool,
    saw_encrypt: AtomicBool,
    /// Milliseconds chunk downloads wait before answering
    download_delay_ms: AtomicU64,
}

impl NodeState {
    fn hit(&self, route: &'static str) {
        *self.hits.lock().entry(route).or_default() += 1;
    }

    fn reference(&self, address: Address) -> Response {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return (StatusCode::INTERNAL_SERVER_ERROR, "upload failed").into_response();
        }
        if self.garble.load(Ordering::SeqCst) {
            return (StatusCode::CREATED, Json(serde_json::json!({ "ref": 1 }))).into_response();
        }
        (
            StatusCode::CREATED,
            Json(serde_json::json!({ "reference": address.to_hex() })),
        )
            .into_response()
    }

    fn pin_if_requested(&self, headers: &HeaderMap, address: Address) {
        let pin = headers
            .get("swarm-pin")
            .map(|v| v.as_bytes() == b"true")
            .unwrap_or(false);
        if pin {
            self.pins.lock().insert(address);
        }
    }
}

pub(crate) struct TestNode {
    url: String,
    state: Arc<NodeState>,
}

impl TestNode {
    pub(crate) async fn start() -> Self {
        let state = Arc::new(NodeState::default());
        let app = Router::new()
            .route("/", get(greeting))
            .route("/chunks", post(upload_chunk))
            .route("/chunks/{address}", get(download_chunk))
            .route("/soc/{owner}/{id}", post(upload_soc))
            .route("/bytes", post(upload_blob))
            .route("/bytes/{address}", get(download_blob))
            .route("/pin/chunks/{address}", delete(unpin))
            .route("/pin/bytes/{address}", delete(unpin))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}", addr),
            state,
        }
    }

    pub(crate) fn url(&self) -> String {
        self.url.clone()
    }

    pub(crate) fn hits(&self, route: &str) -> usize {
        self.state.hits.lock().get(route).copied().unwrap_or(0)
    }

    pub(crate) fn is_pinned(&self, address: &Address) -> bool {
        self.state.pins.lock().contains(address)
    }

    pub(crate) fn insert_chunk(&self, chunk: &Chunk) -> Address {
        let address = chunk.address();
        self.state.chunks.lock().insert(address, chunk.to_bytes());
        address
    }

    /// Store arbitrary bytes under `address`, valid or not
    pub(crate) fn insert_raw_chunk(&self, address: Address, data: Vec<u8>) {
        self.state.chunks.lock().insert(address, data);
    }

    pub(crate) fn delay_downloads(&self, delay: Duration) {
        self.state
            .download_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub(crate) fn insert_blob(&self, data: &[u8]) -> Address {
        let address = Address::keccak(&[data]);
        self.state.blobs.lock().insert(address, data.to_vec());
        address
    }

    pub(crate) fn fail_uploads(&self, fail: bool) {
        self.state.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn garble_references(&self, garble: bool) {
        self.state.garble.store(garble, Ordering::SeqCst);
    }

    pub(crate) fn saw_encrypt_header(&self) -> bool {
        self.state.saw_encrypt.load(Ordering::SeqCst)
    }
}

async fn greeting(State(state): State<Arc<NodeState>>) -> &'static str {
    state.hit("GET /");
    "Ethswarm Bee\n"
}

async fn upload_chunk(
    State(state): State<Arc<NodeState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.hit("POST /chunks");
    let chunk = match Chunk::from_bytes(&body) {
        Ok(chunk) => chunk,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };
    let address = chunk.address();
    state.chunks.lock().insert(address, body.to_vec());
    state.pin_if_requested(&headers, address);
    state.reference(address)
}

async fn download_chunk(
    State(state): State<Arc<NodeState>>,
    Path(address): Path<String>,
) -> Response {
    state.hit("GET /chunks");
    let delay = state.download_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    let Ok(address) = Address::from_hex(&address) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    match state.chunks.lock().get(&address) {
        Some(data) => data.clone().into_response(),
        None => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}

async fn upload_soc(
    State(state): State<Arc<NodeState>>,
    Path((owner, id)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    state.hit("POST /soc");
    let parsed = (|| {
        let owner = Owner::from_hex(&owner).ok()?;
        let id = Address::from_hex(&id).ok()?;
        let sig = hex::decode(query.get("sig")?).ok()?;
        let signature = Signature::from_slice(&sig)?;
        let chunk = Chunk::from_bytes(&body).ok()?;
        Some((owner, SingleOwnerChunk { id, signature, chunk }))
    })();
    let Some((owner, wrapped)) = parsed else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    let address = soc::soc_address(&wrapped.id, &owner);
    state.chunks.lock().insert(address, wrapped.to_bytes());
    state.reference(address)
}

async fn upload_blob(
    State(state): State<Arc<NodeState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.hit("POST /bytes");
    let encrypt = headers.contains_key("swarm-encrypt");
    if encrypt {
        state.saw_encrypt.store(true, Ordering::SeqCst);
    }
    let address = if encrypt {
        Address::keccak(&[b"encrypted", &body])
    } else {
        Address::keccak(&[&body])
    };
    if !state.fail_uploads.load(Ordering::SeqCst) {
        state.blobs.lock().insert(address, body.to_vec());
        state.pin_if_requested(&headers, address);
    }
    state.reference(address)
}

async fn download_blob(
    State(state): State<Arc<NodeState>>,
    Path(address): Path<String>,
) -> Response {
    state.hit("GET /bytes");
    let Ok(address) = Address::from_hex(&address) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    match state.blobs.lock().get(&address) {
        Some(data) => data.clone().into_response(),
        None => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}

async fn unpin(State(state): State<Arc<NodeState>>, Path(address): Path<String>) -> Response {
    state.hit("DELETE /pin");
    let Ok(address) = Address::from_hex(&address) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    if state.pins.lock().remove(&address) {
        StatusCode::OK.into_response()
    } else {
        (StatusCode::NOT_FOUND, "not pinned").into_response()
    }
}
