use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

/// Per-submission vote bookkeeping. Each user holds at most one active vote;
/// a `None` entry records an explicitly withdrawn vote (distinct from a user
/// that never voted, which matters for the remote merge).
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct VoteRecord {
    pub upvotes: i64,
    pub downvotes: i64,
    pub user_votes: HashMap<String, Option<VoteDirection>>,
}

/// What the UI reads after a vote: the counts plus the acting user's vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoteTally {
    pub upvotes: i64,
    pub downvotes: i64,
    pub user_vote: Option<VoteDirection>,
}

impl VoteRecord {
    pub fn tally_for(&self, user_id: &str) -> VoteTally {
        VoteTally {
            upvotes: self.upvotes,
            downvotes: self.downvotes,
            user_vote: self.user_votes.get(user_id).copied().flatten(),
        }
    }

    /// Applies a vote press. Pressing the direction the user already holds
    /// withdraws it; pressing the other direction moves the vote across.
    pub fn apply_vote(&mut self, user_id: &str, direction: VoteDirection) -> VoteTally {
        let current = self.user_votes.get(user_id).copied().flatten();
        match (current, direction) {
            (Some(VoteDirection::Up), VoteDirection::Up) => {
                self.upvotes -= 1;
                self.user_votes.insert(user_id.to_string(), None);
            }
            (Some(VoteDirection::Down), VoteDirection::Down) => {
                self.downvotes -= 1;
                self.user_votes.insert(user_id.to_string(), None);
            }
            (previous, VoteDirection::Up) => {
                if previous == Some(VoteDirection::Down) {
                    self.downvotes -= 1;
                }
                self.upvotes += 1;
                self.user_votes
                    .insert(user_id.to_string(), Some(VoteDirection::Up));
            }
            (previous, VoteDirection::Down) => {
                if previous == Some(VoteDirection::Up) {
                    self.upvotes -= 1;
                }
                self.downvotes += 1;
                self.user_votes
                    .insert(user_id.to_string(), Some(VoteDirection::Down));
            }
        }
        self.tally_for(user_id)
    }

    /// Overlays a remote record onto this one: counts are overwritten
    /// (remote is authoritative), vote maps are shallow-merged with remote
    /// entries winning on key conflicts.
    pub fn merge_remote(&mut self, remote: &VoteRecord) {
        self.upvotes = remote.upvotes;
        self.downvotes = remote.downvotes;
        for (user_id, vote) in &remote.user_votes {
            self.user_votes.insert(user_id.clone(), *vote);
        }
    }
}

/// Merges a remote vote map into the local one, submission by submission.
pub fn merge_vote_maps(
    local: &mut HashMap<String, VoteRecord>,
    remote: &HashMap<String, VoteRecord>,
) {
    for (submission_id, record) in remote {
        local
            .entry(submission_id.clone())
            .or_default()
            .merge_remote(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_upvote_round_trips_to_none() {
        let mut record = VoteRecord::default();
        let after_first = record.apply_vote("user-a", VoteDirection::Up);
        assert_eq!(after_first.upvotes, 1);
        assert_eq!(after_first.user_vote, Some(VoteDirection::Up));

        let after_second = record.apply_vote("user-a", VoteDirection::Up);
        assert_eq!(after_second.upvotes, 0);
        assert_eq!(after_second.user_vote, None);
    }

    #[test]
    fn switching_direction_moves_the_vote() {
        let mut record = VoteRecord::default();
        record.apply_vote("user-a", VoteDirection::Up);
        let tally = record.apply_vote("user-a", VoteDirection::Down);
        assert_eq!(tally.upvotes, 0);
        assert_eq!(tally.downvotes, 1);
        assert_eq!(tally.user_vote, Some(VoteDirection::Down));
    }

    #[test]
    fn votes_are_independent_per_user() {
        let mut record = VoteRecord::default();
        record.apply_vote("user-a", VoteDirection::Up);
        record.apply_vote("user-b", VoteDirection::Up);
        assert_eq!(record.upvotes, 2);
        assert_eq!(record.tally_for("user-a").user_vote, Some(VoteDirection::Up));
        record.apply_vote("user-a", VoteDirection::Up);
        assert_eq!(record.upvotes, 1);
        assert_eq!(record.tally_for("user-b").user_vote, Some(VoteDirection::Up));
    }

    #[test]
    fn remote_merge_overwrites_counts_and_unions_votes() {
        let mut local = HashMap::new();
        let mut local_record = VoteRecord::default();
        local_record.apply_vote("user-a", VoteDirection::Up);
        local.insert("sub-1".to_string(), local_record);

        let mut remote = HashMap::new();
        let mut remote_record = VoteRecord {
            upvotes: 5,
            downvotes: 2,
            user_votes: HashMap::new(),
        };
        remote_record
            .user_votes
            .insert("user-b".to_string(), Some(VoteDirection::Down));
        remote.insert("sub-1".to_string(), remote_record);
        remote.insert("sub-2".to_string(), VoteRecord::default());

        merge_vote_maps(&mut local, &remote);

        let merged = &local["sub-1"];
        assert_eq!(merged.upvotes, 5);
        assert_eq!(merged.downvotes, 2);
        // Local-only entries survive; remote entries win on conflict.
        assert_eq!(merged.tally_for("user-a").user_vote, Some(VoteDirection::Up));
        assert_eq!(
            merged.tally_for("user-b").user_vote,
            Some(VoteDirection::Down)
        );
        assert!(local.contains_key("sub-2"));
    }
}
