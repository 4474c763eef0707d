use super::{project, NodeId, VisibleNode};
use crate::catalog::{Container, Hierarchy};
use tracing::debug;

/// Cursor over the projected rows. Owns the row cache so that every
/// structural change goes through a re-projection plus re-anchor.
#[derive(Debug, Clone)]
pub struct Navigator {
    rows: Vec<VisibleNode>,
    cursor: usize,
}

impl Navigator {
    pub fn new(hierarchy: &Hierarchy) -> Self {
        Self {
            rows: project(hierarchy),
            cursor: 0,
        }
    }

    pub fn rows(&self) -> &[VisibleNode] {
        &self.rows
    }

    /// `None` when there is nothing to point at.
    pub fn cursor(&self) -> Option<usize> {
        if self.rows.is_empty() {
            None
        } else {
            Some(self.cursor)
        }
    }

    pub fn current(&self) -> Option<&VisibleNode> {
        self.rows.get(self.cursor)
    }

    /// Move by `delta` rows, clamped to the list.
    pub fn move_by(&mut self, delta: isize) {
        if self.rows.is_empty() {
            return;
        }
        let last = self.rows.len() - 1;
        self.cursor = self.cursor.saturating_add_signed(delta).min(last);
    }

    pub fn move_to_top(&mut self) {
        self.cursor = 0;
    }

    pub fn move_to_bottom(&mut self) {
        self.cursor = self.rows.len().saturating_sub(1);
    }

    /// Open the group/title under the cursor. The cursor stays on it.
    pub fn expand(&mut self, hierarchy: &mut Hierarchy) -> bool {
        let Some(node) = self.current() else {
            return false;
        };
        let id = node.id;
        let Some(target) = id.container() else {
            return false;
        };

        if !hierarchy.set_expanded(target, true) {
            return false;
        }
        debug!(?id, "expanded");
        self.focus(hierarchy, id);
        true
    }

    /// Close the node under the cursor, or if it cannot be closed, its
    /// nearest open ancestor (title before group). The cursor lands on
    /// whatever was closed.
    pub fn collapse(&mut self, hierarchy: &mut Hierarchy) -> bool {
        let Some(node) = self.current() else {
            return false;
        };
        let id = node.id;

        let target = id
            .container()
            .into_iter()
            .chain(id.ancestors())
            .find(|candidate| hierarchy.is_expanded(*candidate) == Some(true));

        let Some(target) = target else {
            return false;
        };

        hierarchy.set_expanded(target, false);
        let anchor = container_id(target);
        debug!(?id, ?anchor, "collapsed");
        self.focus(hierarchy, anchor);
        true
    }

    /// Re-project and put the cursor on `id`, or on row 0 when `id` is not visible.
    pub fn focus(&mut self, hierarchy: &Hierarchy, id: NodeId) {
        self.rows = project(hierarchy);
        self.cursor = self.position_of(id).unwrap_or(0);
    }

    pub fn position_of(&self, id: NodeId) -> Option<usize> {
        self.rows.iter().position(|row| row.id == id)
    }
}

fn container_id(target: Container) -> NodeId {
    match target {
        Container::Group(group) => NodeId::Group { group },
        Container::Title(group, title) => NodeId::Title { group, title },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::{single_branch, two_groups};

    fn current_name(nav: &Navigator) -> &str {
        nav.current().map(|n| n.name.as_str()).unwrap_or("")
    }

    #[test]
    fn move_is_clamped() {
        let hierarchy = two_groups();
        let mut nav = Navigator::new(&hierarchy);

        nav.move_by(-3);
        assert_eq!(nav.cursor(), Some(0));
        nav.move_by(10);
        assert_eq!(nav.cursor(), Some(1));
        nav.move_by(-1);
        assert_eq!(nav.cursor(), Some(0));
    }

    #[test]
    fn empty_catalog_is_a_no_op() {
        let mut hierarchy = Hierarchy::default();
        let mut nav = Navigator::new(&hierarchy);

        assert_eq!(nav.cursor(), None);
        nav.move_by(1);
        nav.move_to_bottom();
        assert_eq!(nav.cursor(), None);
        assert!(!nav.expand(&mut hierarchy));
        assert!(!nav.collapse(&mut hierarchy));
    }

    #[test]
    fn expand_keeps_cursor_on_node() {
        let mut hierarchy = two_groups();
        let mut nav = Navigator::new(&hierarchy);

        nav.move_by(1); // Docs
        assert!(nav.expand(&mut hierarchy));
        assert_eq!(current_name(&nav), "Docs");

        // Expanding a group above the cursor shifts indices; identity wins.
        nav.move_to_top();
        assert!(nav.expand(&mut hierarchy));
        assert_eq!(current_name(&nav), "Anime");
        assert_eq!(nav.rows().len(), 5);

        // already open
        assert!(!nav.expand(&mut hierarchy));
    }

    #[test]
    fn expand_on_leaf_does_nothing() {
        let mut hierarchy = single_branch();
        hierarchy.set_expanded(Container::Group(0), true);
        hierarchy.set_expanded(Container::Title(0, 0), true);
        let mut nav = Navigator::new(&hierarchy);
        nav.move_by(3);

        assert!(!nav.expand(&mut hierarchy));
        assert_eq!(current_name(&nav), "A");

        // tab rows have no flag of their own
        nav.move_by(-1);
        assert_eq!(current_name(&nav), "Tab1");
        assert!(!nav.expand(&mut hierarchy));
        assert_eq!(current_name(&nav), "Tab1");
        assert_eq!(nav.rows().len(), 5);
    }

    #[test]
    fn collapse_bubbles_up_from_leaf() {
        let mut hierarchy = single_branch();
        let mut nav = Navigator::new(&hierarchy);
        nav.expand(&mut hierarchy);
        nav.move_by(1);
        nav.expand(&mut hierarchy);
        nav.move_by(3); // B
        assert_eq!(current_name(&nav), "B");

        assert!(nav.collapse(&mut hierarchy));
        assert_eq!(current_name(&nav), "T");
        assert_eq!(nav.rows().len(), 2);

        assert!(nav.collapse(&mut hierarchy));
        assert_eq!(current_name(&nav), "G");
        assert_eq!(nav.rows().len(), 1);

        // nothing left open
        assert!(!nav.collapse(&mut hierarchy));
    }

    #[test]
    fn collapse_on_tab_closes_its_title() {
        let mut hierarchy = single_branch();
        hierarchy.set_expanded(Container::Group(0), true);
        hierarchy.set_expanded(Container::Title(0, 0), true);
        let mut nav = Navigator::new(&hierarchy);
        nav.move_by(2);
        assert_eq!(current_name(&nav), "Tab1");

        assert!(nav.collapse(&mut hierarchy));
        assert_eq!(current_name(&nav), "T");
        assert_eq!(nav.rows().len(), 2);
    }

    #[test]
    fn collapse_open_node_keeps_cursor() {
        let mut hierarchy = two_groups();
        hierarchy.set_expanded(Container::Group(0), true);
        hierarchy.set_expanded(Container::Title(0, 1), true);
        let mut nav = Navigator::new(&hierarchy);
        nav.move_by(2); // Mushishi
        assert_eq!(current_name(&nav), "Mushishi");

        assert!(nav.collapse(&mut hierarchy));
        assert_eq!(current_name(&nav), "Mushishi");
        assert_eq!(hierarchy.is_expanded(Container::Title(0, 1)), Some(false));
        assert_eq!(hierarchy.is_expanded(Container::Group(0)), Some(true));
    }

    #[test]
    fn collapse_closed_title_closes_group() {
        let mut hierarchy = two_groups();
        hierarchy.set_expanded(Container::Group(1), true);
        let mut nav = Navigator::new(&hierarchy);
        nav.move_to_bottom(); // Planet Earth
        assert_eq!(current_name(&nav), "Planet Earth");

        assert!(nav.collapse(&mut hierarchy));
        assert_eq!(current_name(&nav), "Docs");
        assert_eq!(nav.cursor(), Some(1));
    }

    #[test]
    fn focus_falls_back_to_top() {
        let hierarchy = two_groups();
        let mut nav = Navigator::new(&hierarchy);
        nav.move_by(1);
        nav.focus(&hierarchy, NodeId::Title { group: 0, title: 0 });
        assert_eq!(nav.cursor(), Some(0));
    }
}
