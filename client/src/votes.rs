use std::collections::HashMap;

use web_sys::Storage;

use muralboard_shared::votes::{merge_vote_maps, VoteDirection, VoteRecord, VoteTally};

/// localStorage key shared with earlier clients; changing it would orphan
/// existing local vote history.
pub const VOTE_STORAGE_KEY: &str = "submissionVotes";

/// Client-side vote ledger for all submissions. Mutations apply locally
/// first; localStorage and the server are written behind, and a failed
/// push is retried on the next vote rather than on a timer.
#[derive(Debug, Default)]
pub struct VoteBook {
    records: HashMap<String, VoteRecord>,
}

impl VoteBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tally(&self, submission_id: &str, user_id: &str) -> VoteTally {
        self.records
            .get(submission_id)
            .map(|record| record.tally_for(user_id))
            .unwrap_or(VoteTally {
                upvotes: 0,
                downvotes: 0,
                user_vote: None,
            })
    }

    pub fn vote(
        &mut self,
        submission_id: &str,
        user_id: &str,
        direction: VoteDirection,
    ) -> VoteTally {
        self.records
            .entry(submission_id.to_string())
            .or_default()
            .apply_vote(user_id, direction)
    }

    pub fn merge_remote(&mut self, remote: &HashMap<String, VoteRecord>) {
        merge_vote_maps(&mut self.records, remote);
    }

    pub fn to_json(&self) -> Option<String> {
        serde_json::to_string(&self.records).ok()
    }

    pub fn adopt_json(&mut self, json: &str) -> bool {
        match serde_json::from_str::<HashMap<String, VoteRecord>>(json) {
            Ok(remote) => {
                self.merge_remote(&remote);
                true
            }
            Err(_) => false,
        }
    }

    pub fn load_local(&mut self, storage: &Storage) {
        if let Ok(Some(json)) = storage.get_item(VOTE_STORAGE_KEY) {
            if !self.adopt_json(&json) {
                web_sys::console::warn_1(&"Discarding unreadable local vote data".into());
            }
        }
    }

    pub fn save_local(&self, storage: &Storage) {
        if let Some(json) = self.to_json() {
            let _ = storage.set_item(VOTE_STORAGE_KEY, &json);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_round_trips_through_json() {
        let mut book = VoteBook::new();
        book.vote("sub-1", "user-a", VoteDirection::Up);
        book.vote("sub-2", "user-a", VoteDirection::Down);

        let json = book.to_json().expect("serialize");
        let mut restored = VoteBook::new();
        assert!(restored.adopt_json(&json));

        assert_eq!(restored.tally("sub-1", "user-a").upvotes, 1);
        assert_eq!(
            restored.tally("sub-2", "user-a").user_vote,
            Some(VoteDirection::Down)
        );
    }

    #[test]
    fn unknown_submission_tallies_to_zero() {
        let book = VoteBook::new();
        let tally = book.tally("missing", "user-a");
        assert_eq!((tally.upvotes, tally.downvotes), (0, 0));
        assert_eq!(tally.user_vote, None);
    }

    #[test]
    fn malformed_json_is_rejected_without_mutating() {
        let mut book = VoteBook::new();
        book.vote("sub-1", "user-a", VoteDirection::Up);
        assert!(!book.adopt_json("{not json"));
        assert_eq!(book.tally("sub-1", "user-a").upvotes, 1);
    }

    #[test]
    fn remote_merge_is_authoritative_for_counts() {
        let mut book = VoteBook::new();
        book.vote("sub-1", "user-a", VoteDirection::Up);

        let mut remote = HashMap::new();
        remote.insert(
            "sub-1".to_string(),
            VoteRecord {
                upvotes: 7,
                downvotes: 3,
                user_votes: HashMap::new(),
            },
        );
        book.merge_remote(&remote);

        let tally = book.tally("sub-1", "user-a");
        assert_eq!((tally.upvotes, tally.downvotes), (7, 3));
        // The local user's own vote survives the shallow merge.
        assert_eq!(tally.user_vote, Some(VoteDirection::Up));
    }
}
