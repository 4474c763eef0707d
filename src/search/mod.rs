// Search - case-insensitive substring match over the whole catalog,
// including collapsed subtrees. A hit opens its ancestors and moves the cursor.

use crate::catalog::Hierarchy;
use crate::tree::{project_all, Navigator, NodeId, NodeKind, VisibleNode};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Empty query, state cleared, nothing moved.
    Cleared,
    /// No node matched; state cleared, cursor untouched.
    NotFound,
    /// No previous search to continue from.
    Idle,
    Found(NodeId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LastSearch {
    query: String,
    needle: String,
    matched: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SearchEngine {
    last: Option<LastSearch>,
}

impl SearchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query of the last successful search, if any.
    pub fn last_query(&self) -> Option<&str> {
        self.last.as_ref().map(|last| last.query.as_str())
    }

    pub fn clear(&mut self) {
        self.last = None;
    }

    /// Jump to the first node (in pre-order) whose name contains `query`.
    pub fn search(
        &mut self,
        query: &str,
        hierarchy: &mut Hierarchy,
        navigator: &mut Navigator,
    ) -> SearchOutcome {
        if query.is_empty() {
            self.clear();
            return SearchOutcome::Cleared;
        }

        let needle = query.to_lowercase();
        let sequence = project_all(hierarchy);

        match sequence.iter().position(|node| matches(node, &needle)) {
            Some(index) => {
                let id = sequence[index].id;
                debug!(query, index, ?id, "search hit");
                self.last = Some(LastSearch {
                    query: query.to_string(),
                    needle,
                    matched: index,
                });
                reveal(hierarchy, navigator, id);
                SearchOutcome::Found(id)
            }
            None => {
                debug!(query, "search miss");
                self.clear();
                SearchOutcome::NotFound
            }
        }
    }

    /// Continue after the last hit, wrapping to the top. A lone match
    /// wraps back onto itself.
    pub fn find_next(&mut self, hierarchy: &mut Hierarchy, navigator: &mut Navigator) -> SearchOutcome {
        let Some(last) = self.last.as_mut() else {
            return SearchOutcome::Idle;
        };

        let sequence = project_all(hierarchy);
        if sequence.is_empty() {
            self.last = None;
            return SearchOutcome::NotFound;
        }

        let start = (last.matched + 1).min(sequence.len());
        let hit = (start..sequence.len())
            .chain(0..start)
            .find(|&index| matches(&sequence[index], &last.needle));

        match hit {
            Some(index) => {
                last.matched = index;
                let id = sequence[index].id;
                debug!(query = %last.query, index, ?id, "search next");
                reveal(hierarchy, navigator, id);
                SearchOutcome::Found(id)
            }
            None => {
                self.last = None;
                SearchOutcome::NotFound
            }
        }
    }
}

// tab rows are section headers ("Tab1", "Main"), not something you jump to
fn matches(node: &VisibleNode, needle: &str) -> bool {
    node.kind() != NodeKind::Tab && node.name.to_lowercase().contains(needle)
}

/// Open every ancestor of `id`, re-project and put the cursor on it.
fn reveal(hierarchy: &mut Hierarchy, navigator: &mut Navigator, id: NodeId) {
    for ancestor in id.ancestors() {
        hierarchy.set_expanded(ancestor, true);
    }
    navigator.focus(hierarchy, id);
}
