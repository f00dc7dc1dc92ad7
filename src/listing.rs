//! Display listings of the catalogue

use serde::Serialize;
use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::hash::BuildHasher;

use crate::models::MediaEntry;
use crate::sort::{sort_by_title, Collator};

/// Media entries of one folder
#[derive(Debug, Clone, Serialize)]
pub struct FolderListing {
    /// Folder relative to its root, `""` for files directly in a root
    pub folder: String,
    pub entries: Vec<MediaEntry>,
}

/// All entries ordered by display name
pub fn flat_listing(entries: &[MediaEntry], collator: &dyn Collator) -> Vec<MediaEntry> {
    let mut sorted = entries.to_vec();
    sort_by_title(&mut sorted, collator, |e| e.display_name.as_str());
    sorted
}

/// Entries grouped by folder. Folders are ordered by name with the same
/// rules as titles, so the root folder (`""`) comes last.
pub fn structured_listing(entries: &[MediaEntry], collator: &dyn Collator) -> Vec<FolderListing> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<MediaEntry>> = HashMap::new();
    for entry in entries {
        let folder = entry.folder();
        if !groups.contains_key(folder) {
            order.push(folder.to_string());
        }
        groups
            .entry(folder.to_string())
            .or_default()
            .push(entry.clone());
    }

    let mut listing: Vec<FolderListing> = order
        .into_iter()
        .map(|folder| {
            let mut entries = groups.remove(&folder).unwrap_or_default();
            sort_by_title(&mut entries, collator, |e| e.display_name.as_str());
            FolderListing { folder, entries }
        })
        .collect();
    sort_by_title(&mut listing, collator, |f| f.folder.as_str());
    listing
}

/// Entry picked by `seed`, `None` when there is nothing to pick
pub fn pick_entry(entries: &[MediaEntry], seed: u64) -> Option<&MediaEntry> {
    if entries.is_empty() {
        return None;
    }
    entries.get((seed % entries.len() as u64) as usize)
}

/// Entry picked at random, for "play something" links
pub fn random_entry(entries: &[MediaEntry]) -> Option<&MediaEntry> {
    // RandomState is keyed per instance from OS randomness
    let seed = RandomState::new().hash_one(entries.len());
    pick_entry(entries, seed)
}
