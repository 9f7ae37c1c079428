use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use muralboard_shared::votes::VoteRecord;
use muralboard_shared::{PeerInfo, ServerMessage, Submission};
use rand::Rng;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// Colors handed out to connecting peers, in no particular order.
pub const PEER_COLORS: [&str; 6] = [
    "#FF0000", "#00FF00", "#0000FF", "#FFFF00", "#FF00FF", "#00FFFF",
];

pub const DEFAULT_BRUSH_SIZE: u8 = 5;

pub struct Peer {
    pub info: PeerInfo,
    pub tx: mpsc::UnboundedSender<ServerMessage>,
}

#[derive(Clone)]
pub struct AppState {
    pub peers: Arc<RwLock<HashMap<Uuid, Peer>>>,
    pub votes: Arc<RwLock<HashMap<String, VoteRecord>>>,
    pub submissions: Arc<RwLock<Vec<Submission>>>,
    pub data_dir: PathBuf,
    pub generate_url: Option<String>,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(
        data_dir: PathBuf,
        generate_url: Option<String>,
        votes: HashMap<String, VoteRecord>,
        submissions: Vec<Submission>,
    ) -> Self {
        Self {
            peers: Arc::new(RwLock::new(HashMap::new())),
            votes: Arc::new(RwLock::new(votes)),
            submissions: Arc::new(RwLock::new(submissions)),
            data_dir,
            generate_url,
            http: reqwest::Client::new(),
        }
    }

    pub async fn roster(&self) -> Vec<PeerInfo> {
        self.peers
            .read()
            .await
            .values()
            .map(|peer| peer.info.clone())
            .collect()
    }
}

pub fn pick_color() -> &'static str {
    let index = rand::rng().random_range(0..PEER_COLORS.len());
    PEER_COLORS[index]
}

pub fn now_millis_string() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis().to_string())
        .unwrap_or_default()
}
