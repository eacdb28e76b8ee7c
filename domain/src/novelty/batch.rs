//! Pre-generated content batches served one item per fire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An ordered set of response variants owned by one recurring job.
///
/// The cursor points at the next item to serve; the batch is exhausted once
/// it reaches `items.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoveltyBatch {
    pub items: Vec<String>,
    pub item_type: String,
    pub cursor: usize,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_served_at: Option<DateTime<Utc>>,
}

/// Item handed out by [`NoveltyBatch::take_next`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedItem {
    pub item: String,
    pub item_type: String,
    /// Items still left after this one.
    pub remaining: usize,
}

impl NoveltyBatch {
    pub fn new(items: Vec<String>, item_type: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            items,
            item_type: item_type.into(),
            cursor: 0,
            created_at,
            last_served_at: None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.items.len()
    }

    pub fn remaining(&self) -> usize {
        self.items.len().saturating_sub(self.cursor)
    }

    /// Serve the item under the cursor and advance it.
    ///
    /// Returns `None` without touching state when exhausted.
    pub fn take_next(&mut self, now: DateTime<Utc>) -> Option<ServedItem> {
        let item = self.items.get(self.cursor)?.clone();
        self.cursor += 1;
        self.last_served_at = Some(now);
        Some(ServedItem {
            item,
            item_type: self.item_type.clone(),
            remaining: self.remaining(),
        })
    }
}
