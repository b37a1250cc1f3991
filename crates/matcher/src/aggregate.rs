//! Vote counting over approximate search hits.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A candidate video and how many hits named it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateVote {
    pub video_id: String,
    pub votes: usize,
}

/// Count one vote per hit occurrence and keep the `limit` best-voted videos.
///
/// `hit_lists` holds one list of video ids per query frame, in frame order.
/// Ids may repeat inside a list and across lists; every occurrence counts.
/// Ties keep first-seen order.
pub fn aggregate_candidates<L, H, S>(hit_lists: L, limit: usize) -> Vec<CandidateVote>
where
    L: IntoIterator<Item = H>,
    H: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut votes: Vec<CandidateVote> = Vec::new();

    for list in hit_lists {
        for id in list {
            let id = id.as_ref();
            match slots.get(id) {
                Some(&slot) => votes[slot].votes += 1,
                None => {
                    slots.insert(id.to_string(), votes.len());
                    votes.push(CandidateVote {
                        video_id: id.to_string(),
                        votes: 1,
                    });
                }
            }
        }
    }

    // `sort_by` is stable, so equal counts stay in first-seen order.
    votes.sort_by(|a, b| b.votes.cmp(&a.votes));
    votes.truncate(limit);
    votes
}
