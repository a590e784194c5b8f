use std::collections::HashMap;

use crate::normalizer::NormalizedItem;

/// Maximum number of items kept after ranking.
pub const POOL_SIZE: usize = 60;

/// Deduplicate by `id`, rank newest first and cap at [`POOL_SIZE`].
///
/// For a repeated `id` the strictly newer item wins and takes over the slot of
/// the first occurrence, so exact timestamp ties keep input order.
pub fn dedup_and_rank(items: Vec<NormalizedItem>) -> Vec<NormalizedItem> {
    let mut slots: Vec<NormalizedItem> = Vec::with_capacity(items.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(items.len());

    for item in items {
        match index.get(&item.id) {
            Some(&slot) => {
                if item.published_at > slots[slot].published_at {
                    slots[slot] = item;
                }
            }
            None => {
                index.insert(item.id.clone(), slots.len());
                slots.push(item);
            }
        }
    }

    // sort_by is stable
    slots.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    slots.truncate(POOL_SIZE);
    slots
}
