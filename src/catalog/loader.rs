// Catalog document decoding
// The build step writes either {"groups": [...]} or a bare array of groups.

use super::{Group, Hierarchy, Item, Tab, Title};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed catalog: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct Document {
    groups: Vec<GroupRecord>,
}

#[derive(Debug, Deserialize)]
struct GroupRecord {
    name: String,
    #[serde(default)]
    titles: Vec<TitleRecord>,
}

#[derive(Debug, Deserialize)]
struct TitleRecord {
    name: String,
    #[serde(default)]
    p: Option<u32>,
    #[serde(default)]
    tabs: Vec<TabRecord>,
}

#[derive(Debug, Deserialize)]
struct TabRecord {
    name: String,
    #[serde(default)]
    items: Vec<ItemRecord>,
}

// extra keys the build step emits (duration, bvid, ...) are ignored
#[derive(Debug, Deserialize)]
struct ItemRecord {
    title: String,
    cid: u64,
    #[serde(default)]
    p: u32,
}

pub(super) fn load_file(path: &Path) -> Result<Hierarchy, CatalogError> {
    let text = fs::read_to_string(path).map_err(|source| CatalogError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let hierarchy = parse(&text)?;
    info!(
        "Loaded catalog {} ({} groups, {} items)",
        path.display(),
        hierarchy.groups().len(),
        hierarchy.item_count()
    );
    Ok(hierarchy)
}

pub(super) fn parse(text: &str) -> Result<Hierarchy, CatalogError> {
    let raw: Value = serde_json::from_str(text)?;

    let records = if raw.is_array() {
        serde_json::from_value::<Vec<GroupRecord>>(raw)?
    } else {
        serde_json::from_value::<Document>(raw)?.groups
    };

    Ok(Hierarchy::new(records.into_iter().map(Group::from).collect()))
}

impl From<GroupRecord> for Group {
    fn from(record: GroupRecord) -> Self {
        Group::new(record.name, record.titles.into_iter().map(Title::from).collect())
    }
}

impl From<TitleRecord> for Title {
    fn from(record: TitleRecord) -> Self {
        let mut title = Title::new(record.name, record.tabs.into_iter().map(Tab::from).collect());
        title.priority = record.p;
        title
    }
}

impl From<TabRecord> for Tab {
    fn from(record: TabRecord) -> Self {
        Tab::new(record.name, record.items.into_iter().map(Item::from).collect())
    }
}

impl From<ItemRecord> for Item {
    fn from(record: ItemRecord) -> Self {
        Item::new(record.title, record.cid).with_priority(record.p)
    }
}
