use std::collections::HashMap;
use std::io;
use std::path::Path;

use muralboard_shared::votes::VoteRecord;
use muralboard_shared::Submission;

const VOTES_FILE: &str = "votes.json";
const SUBMISSIONS_FILE: &str = "submissions.json";

pub async fn load_votes(data_dir: &Path) -> HashMap<String, VoteRecord> {
    load_json(data_dir, VOTES_FILE).await.unwrap_or_default()
}

pub async fn save_votes(data_dir: &Path, votes: &HashMap<String, VoteRecord>) -> io::Result<()> {
    save_json(data_dir, VOTES_FILE, votes).await
}

pub async fn load_submissions(data_dir: &Path) -> Vec<Submission> {
    load_json(data_dir, SUBMISSIONS_FILE)
        .await
        .unwrap_or_default()
}

pub async fn save_submissions(data_dir: &Path, submissions: &[Submission]) -> io::Result<()> {
    save_json(data_dir, SUBMISSIONS_FILE, &submissions).await
}

async fn load_json<T: serde::de::DeserializeOwned>(data_dir: &Path, file: &str) -> Option<T> {
    let path = data_dir.join(file);
    let payload = match tokio::fs::read_to_string(&path).await {
        Ok(payload) => payload,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return None,
        Err(error) => {
            tracing::warn!(?path, %error, "failed to read data file");
            return None;
        }
    };
    match serde_json::from_str(&payload) {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::warn!(?path, %error, "discarding unreadable data file");
            None
        }
    }
}

/// Write-then-rename so a crash mid-write never leaves a truncated file.
async fn save_json<T: serde::Serialize>(data_dir: &Path, file: &str, value: &T) -> io::Result<()> {
    let path = data_dir.join(file);
    let tmp = data_dir.join(format!("{file}.tmp"));
    let payload = serde_json::to_vec_pretty(value)
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))?;
    tokio::fs::write(&tmp, payload).await?;
    tokio::fs::rename(&tmp, &path).await
}
