// Tree projection - turns the catalog plus its expand flags into flat rows
// Rows are rebuilt from scratch after every structural change, never patched.

pub mod navigator;

pub use navigator::Navigator;

use crate::catalog::{Container, Hierarchy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Group,
    Title,
    Tab,
    Item,
}

impl NodeKind {
    pub fn is_expandable(self) -> bool {
        matches!(self, NodeKind::Group | NodeKind::Title)
    }

    pub fn is_leaf(self) -> bool {
        self == NodeKind::Item
    }

    /// Nesting level: group 0, title 1, tab 2, item 3.
    pub fn depth(self) -> usize {
        match self {
            NodeKind::Group => 0,
            NodeKind::Title => 1,
            NodeKind::Tab => 2,
            NodeKind::Item => 3,
        }
    }
}

/// Stable identity of a node: its position in the catalog. Survives
/// re-projection, which is what the cursor anchors on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
    Group { group: usize },
    Title { group: usize, title: usize },
    Tab { group: usize, title: usize, tab: usize },
    Item { group: usize, title: usize, tab: usize, item: usize },
}

impl NodeId {
    pub fn kind(self) -> NodeKind {
        match self {
            NodeId::Group { .. } => NodeKind::Group,
            NodeId::Title { .. } => NodeKind::Title,
            NodeId::Tab { .. } => NodeKind::Tab,
            NodeId::Item { .. } => NodeKind::Item,
        }
    }

    /// Owning group index.
    pub fn group(self) -> usize {
        match self {
            NodeId::Group { group }
            | NodeId::Title { group, .. }
            | NodeId::Tab { group, .. }
            | NodeId::Item { group, .. } => group,
        }
    }

    /// Owning title index, if the node sits at or below a title.
    pub fn title(self) -> Option<usize> {
        match self {
            NodeId::Group { .. } => None,
            NodeId::Title { title, .. } | NodeId::Tab { title, .. } | NodeId::Item { title, .. } => {
                Some(title)
            }
        }
    }

    /// The node's own expand flag address (groups and titles only).
    pub fn container(self) -> Option<Container> {
        match self {
            NodeId::Group { group } => Some(Container::Group(group)),
            NodeId::Title { group, title } => Some(Container::Title(group, title)),
            NodeId::Tab { .. } | NodeId::Item { .. } => None,
        }
    }

    /// Expandable ancestors, innermost first. Excludes the node itself.
    pub fn ancestors(self) -> Vec<Container> {
        match self {
            NodeId::Group { .. } => Vec::new(),
            NodeId::Title { group, .. } => vec![Container::Group(group)],
            NodeId::Tab { group, title, .. } | NodeId::Item { group, title, .. } => {
                vec![Container::Title(group, title), Container::Group(group)]
            }
        }
    }
}

/// One projected row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleNode {
    pub id: NodeId,
    pub depth: usize,
    pub name: String,
    pub cid: Option<u64>,
    pub expanded: bool,
}

impl VisibleNode {
    pub fn kind(&self) -> NodeKind {
        self.id.kind()
    }

    pub fn is_leaf(&self) -> bool {
        self.kind().is_leaf()
    }

    /// Indented label with an open/closed marker on expandable rows.
    pub fn display(&self) -> String {
        let marker = match (self.kind().is_expandable(), self.expanded) {
            (true, true) => "▼",
            (true, false) => "▶",
            (false, _) => " ",
        };
        format!("{}{} {}", "  ".repeat(self.depth), marker, self.name)
    }
}

/// Rows the user can currently see: pre-order walk, descending into a group
/// or title only while it is expanded.
pub fn project(hierarchy: &Hierarchy) -> Vec<VisibleNode> {
    walk(hierarchy, true)
}

/// Every node in pre-order, ignoring expand flags. Search runs over this.
pub fn project_all(hierarchy: &Hierarchy) -> Vec<VisibleNode> {
    walk(hierarchy, false)
}

fn walk(hierarchy: &Hierarchy, gated: bool) -> Vec<VisibleNode> {
    let mut rows = Vec::new();

    for (gi, group) in hierarchy.groups().iter().enumerate() {
        rows.push(VisibleNode {
            id: NodeId::Group { group: gi },
            depth: NodeKind::Group.depth(),
            name: group.name.clone(),
            cid: None,
            expanded: group.is_expanded(),
        });
        if gated && !group.is_expanded() {
            continue;
        }

        for (ti, title) in group.titles.iter().enumerate() {
            rows.push(VisibleNode {
                id: NodeId::Title { group: gi, title: ti },
                depth: NodeKind::Title.depth(),
                name: title.name.clone(),
                cid: None,
                expanded: title.is_expanded(),
            });
            if gated && !title.is_expanded() {
                continue;
            }

            for (tb, tab) in title.tabs.iter().enumerate() {
                rows.push(VisibleNode {
                    id: NodeId::Tab { group: gi, title: ti, tab: tb },
                    depth: NodeKind::Tab.depth(),
                    name: tab.name.clone(),
                    cid: None,
                    expanded: false,
                });

                for (ii, item) in tab.items.iter().enumerate() {
                    rows.push(VisibleNode {
                        id: NodeId::Item { group: gi, title: ti, tab: tb, item: ii },
                        depth: NodeKind::Item.depth(),
                        name: item.name.clone(),
                        cid: Some(item.cid),
                        expanded: false,
                    });
                }
            }
        }
    }

    rows
}

/// CIDs a play request on `id` covers, in catalog order.
pub fn cids_under(hierarchy: &Hierarchy, id: NodeId) -> Vec<u64> {
    match id {
        NodeId::Group { group } => hierarchy
            .group(group)
            .map(|g| g.cids().collect())
            .unwrap_or_default(),
        NodeId::Title { group, title } => hierarchy
            .title(group, title)
            .map(|t| t.cids().collect())
            .unwrap_or_default(),
        NodeId::Tab { group, title, tab } => hierarchy
            .title(group, title)
            .and_then(|t| t.tabs.get(tab))
            .map(|tab| tab.cids().collect())
            .unwrap_or_default(),
        NodeId::Item { group, title, tab, item } => hierarchy
            .title(group, title)
            .and_then(|t| t.tabs.get(tab))
            .and_then(|tab| tab.items.get(item))
            .map(|item| vec![item.cid])
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::{single_branch, two_groups};

    fn names(rows: &[VisibleNode]) -> Vec<&str> {
        rows.iter().map(|row| row.name.as_str()).collect()
    }

    #[test]
    fn collapsed_catalog_shows_only_groups() {
        let hierarchy = two_groups();
        assert_eq!(names(&project(&hierarchy)), vec!["Anime", "Docs"]);
    }

    #[test]
    fn expanding_reveals_children_in_order() {
        let mut hierarchy = single_branch();
        hierarchy.set_expanded(Container::Group(0), true);
        assert_eq!(names(&project(&hierarchy)), vec!["G", "T"]);

        hierarchy.set_expanded(Container::Title(0, 0), true);
        let rows = project(&hierarchy);
        assert_eq!(names(&rows), vec!["G", "T", "Tab1", "A", "B"]);

        let depths: Vec<usize> = rows.iter().map(|r| r.depth).collect();
        assert_eq!(depths, vec![0, 1, 2, 3, 3]);
        assert_eq!(rows[4].cid, Some(2));
        assert_eq!(rows[2].cid, None);
    }

    #[test]
    fn expanded_title_under_collapsed_group_stays_hidden() {
        let mut hierarchy = single_branch();
        hierarchy.set_expanded(Container::Title(0, 0), true);
        assert_eq!(names(&project(&hierarchy)), vec!["G"]);
    }

    #[test]
    fn projection_is_idempotent() {
        let mut hierarchy = two_groups();
        hierarchy.set_expanded(Container::Group(0), true);
        hierarchy.set_expanded(Container::Title(0, 0), true);
        assert_eq!(project(&hierarchy), project(&hierarchy));
    }

    #[test]
    fn every_row_has_open_ancestors() {
        let mut hierarchy = two_groups();
        hierarchy.set_expanded(Container::Group(0), true);
        hierarchy.set_expanded(Container::Title(0, 0), true);
        hierarchy.set_expanded(Container::Title(1, 0), true); // group 1 still closed

        for row in project(&hierarchy) {
            for ancestor in row.id.ancestors() {
                assert_eq!(hierarchy.is_expanded(ancestor), Some(true), "{:?}", row.id);
            }
        }
    }

    #[test]
    fn expand_then_collapse_restores_rows() {
        let mut hierarchy = two_groups();
        hierarchy.set_expanded(Container::Group(0), true);
        let before = project(&hierarchy);

        hierarchy.set_expanded(Container::Title(0, 1), true);
        assert_ne!(project(&hierarchy), before);
        hierarchy.set_expanded(Container::Title(0, 1), false);
        assert_eq!(project(&hierarchy), before);
    }

    #[test]
    fn full_sequence_ignores_flags() {
        let hierarchy = single_branch();
        assert_eq!(names(&project_all(&hierarchy)), vec!["G", "T", "Tab1", "A", "B"]);
    }

    #[test]
    fn display_marks_expandable_rows() {
        let mut hierarchy = single_branch();
        hierarchy.set_expanded(Container::Group(0), true);
        let rows = project_all(&hierarchy);

        assert_eq!(rows[0].display(), "▼ G");
        assert_eq!(rows[1].display(), "  ▶ T");
        assert_eq!(rows[3].display(), "        A");
    }

    #[test]
    fn cids_under_each_kind() {
        let hierarchy = two_groups();
        assert_eq!(cids_under(&hierarchy, NodeId::Group { group: 1 }), vec![301, 302]);
        assert_eq!(
            cids_under(&hierarchy, NodeId::Title { group: 0, title: 0 }),
            vec![101, 102, 103]
        );
        assert_eq!(
            cids_under(&hierarchy, NodeId::Tab { group: 0, title: 0, tab: 1 }),
            vec![103]
        );
        assert_eq!(
            cids_under(&hierarchy, NodeId::Item { group: 0, title: 1, tab: 0, item: 0 }),
            vec![201]
        );
        assert!(cids_under(&hierarchy, NodeId::Group { group: 9 }).is_empty());
    }
}
