// Catalog hierarchy - groups -> titles -> tabs -> items
// Content is immutable once loaded; only the expand flags on groups and titles move.

pub mod loader;

pub use loader::CatalogError;

use std::path::Path;
use tracing::debug;

/// A playable leaf. `cid` is what gets handed to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub name: String,
    pub cid: u64,
    pub priority: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub name: String,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title {
    pub name: String,
    pub priority: Option<u32>,
    pub tabs: Vec<Tab>,
    expanded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub titles: Vec<Title>,
    expanded: bool,
}

/// Address of a node that carries an expand flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Container {
    Group(usize),
    Title(usize, usize),
}

/// The whole catalog plus its expand state. Built once per load, mutated
/// only through [`Hierarchy::set_expanded`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hierarchy {
    groups: Vec<Group>,
}

impl Item {
    pub fn new(name: impl Into<String>, cid: u64) -> Self {
        Self {
            name: name.into(),
            cid,
            priority: 0,
        }
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }
}

impl Tab {
    pub fn new(name: impl Into<String>, items: Vec<Item>) -> Self {
        Self {
            name: name.into(),
            items,
        }
    }

    pub fn cids(&self) -> impl Iterator<Item = u64> + '_ {
        self.items.iter().map(|item| item.cid)
    }
}

impl Title {
    pub fn new(name: impl Into<String>, tabs: Vec<Tab>) -> Self {
        Self {
            name: name.into(),
            priority: None,
            tabs,
            expanded: false,
        }
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Priority with the catalog default applied (titles without one sort as 0).
    pub fn priority_or_default(&self) -> u32 {
        self.priority.unwrap_or(0)
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Every item CID under this title, tab order then item order.
    pub fn cids(&self) -> impl Iterator<Item = u64> + '_ {
        self.tabs.iter().flat_map(Tab::cids)
    }
}

impl Group {
    pub fn new(name: impl Into<String>, titles: Vec<Title>) -> Self {
        Self {
            name: name.into(),
            titles,
            expanded: false,
        }
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn cids(&self) -> impl Iterator<Item = u64> + '_ {
        self.titles.iter().flat_map(Title::cids)
    }
}

impl Hierarchy {
    /// Takes ownership of freshly decoded groups. Every flag starts collapsed.
    pub fn new(mut groups: Vec<Group>) -> Self {
        for group in &mut groups {
            group.expanded = false;
            for title in &mut group.titles {
                title.expanded = false;
            }
        }
        Self { groups }
    }

    /// Read and decode a catalog document from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        loader::load_file(path.as_ref())
    }

    /// Decode a catalog document that is already in memory.
    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        loader::parse(text)
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, group: usize) -> Option<&Group> {
        self.groups.get(group)
    }

    pub fn title(&self, group: usize, title: usize) -> Option<&Title> {
        self.groups.get(group)?.titles.get(title)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.groups.iter().map(|g| g.cids().count()).sum()
    }

    /// `None` when the address points nowhere.
    pub fn is_expanded(&self, target: Container) -> Option<bool> {
        match target {
            Container::Group(g) => self.group(g).map(Group::is_expanded),
            Container::Title(g, t) => self.title(g, t).map(Title::is_expanded),
        }
    }

    /// Flip exactly one flag. Returns true when the flag actually changed.
    pub fn set_expanded(&mut self, target: Container, expanded: bool) -> bool {
        let flag = match target {
            Container::Group(g) => self.groups.get_mut(g).map(|group| &mut group.expanded),
            Container::Title(g, t) => self
                .groups
                .get_mut(g)
                .and_then(|group| group.titles.get_mut(t))
                .map(|title| &mut title.expanded),
        };

        match flag {
            Some(flag) if *flag != expanded => {
                *flag = expanded;
                debug!(?target, expanded, "expand flag changed");
                true
            }
            _ => false,
        }
    }
}
