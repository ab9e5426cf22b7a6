// Pure merge functions. No I/O here so the append-only-on-identity
// invariant can be checked in isolation.

use std::collections::BTreeMap;

use campus_common::{CategorizedDataset, Category, Record};

/// Pick the surviving record for one identity.
///
/// The new crawl is authoritative. An unchanged page (same content hash)
/// keeps the persisted record verbatim, including its `scraped_at`.
fn reconcile(old: Record, new: Record) -> Record {
    if !new.content_hash.is_empty() && new.content_hash == old.content_hash {
        old
    } else {
        new
    }
}

/// `old` updated by `new`: a right-biased union keyed by identity.
///
/// Identities only in `old` survive untouched. Nothing is ever removed.
pub fn merge_records(
    mut old: BTreeMap<String, Record>,
    new: BTreeMap<String, Record>,
) -> BTreeMap<String, Record> {
    for (identity, record) in new {
        let merged = match old.remove(&identity) {
            Some(previous) => reconcile(previous, record),
            None => record,
        };
        old.insert(identity, merged);
    }
    old
}

fn merge_category(old: Category, new: Category) -> Category {
    let items = merge_records(old.items, new.items);
    let subtopics = if items.is_empty() {
        if new.subtopics.is_empty() {
            old.subtopics
        } else {
            new.subtopics
        }
    } else {
        subtopics_of(&items)
    };

    Category {
        id: new.id,
        name: if new.name.is_empty() { old.name } else { new.name },
        description: if new.description.is_empty() { old.description } else { new.description },
        url: if new.url.is_empty() { old.url } else { new.url },
        subtopics,
        items,
    }
}

/// Category-level merge for nested datasets.
///
/// Categories missing from `new` are preserved. A category present in both
/// takes the new header and merges its items by identity. Identity is unique
/// across the whole dataset: an item re-observed under another category moves
/// there, and a category left empty by that move is dropped.
pub fn merge_categories(mut old: CategorizedDataset, new: CategorizedDataset) -> CategorizedDataset {
    let mut moved: BTreeMap<String, Record> = BTreeMap::new();
    let mut emptied = Vec::new();
    for (id, category) in old.iter_mut() {
        let before = category.items.len();
        let kept = new.get(id);
        for (other_id, incoming) in &new {
            if other_id == id {
                continue;
            }
            for identity in incoming.items.keys() {
                if kept.is_some_and(|c| c.items.contains_key(identity)) {
                    continue;
                }
                if let Some(previous) = category.items.remove(identity) {
                    moved.insert(identity.clone(), previous);
                }
            }
        }
        if category.items.len() != before {
            if category.items.is_empty() {
                emptied.push(id.clone());
            } else {
                category.subtopics = subtopics_of(&category.items);
            }
        }
    }
    for id in emptied {
        old.remove(&id);
    }

    for (id, category) in new {
        let mut previous = old.remove(&id).unwrap_or_else(|| Category::new(id.clone(), ""));
        for identity in category.items.keys() {
            if let Some(record) = moved.remove(identity) {
                previous.items.entry(identity.clone()).or_insert(record);
            }
        }
        old.insert(id, merge_category(previous, category));
    }
    old
}

fn subtopics_of(items: &BTreeMap<String, Record>) -> Vec<String> {
    items.values().map(|r| r.title.clone()).collect()
}
