use std::collections::HashMap;
use std::hash::Hash;

use comfy_table::Color;
use serde::{Serialize, Serializer};

use crate::error::{Error, Result};
use crate::group::Expansion;
use crate::repo::Record;

/// A node of a tree whose children are owned by the node itself.
pub trait TreeNode: Sized {
    type Key: Ord + Clone;

    /// The key used to remember whether this node is expanded.
    fn key(&self) -> &Self::Key;

    fn children(&self) -> &[Self];

    fn has_children(&self) -> bool {
        !self.children().is_empty()
    }
}

/// A record that may name a parent record of the same collection.
pub trait Hierarchical: Record {
    fn parent(&self) -> Option<&Self::Id>;
}

/// A borrowed record placed in a tree built from parent references.
#[derive(Debug, PartialEq)]
pub struct Node<'a, R: Record> {
    record: &'a R,
    children: Vec<Node<'a, R>>,
}

impl<'a, R: Record> Node<'a, R> {
    pub fn record(&self) -> &'a R {
        self.record
    }
}

impl<R> TreeNode for Node<'_, R>
where
    R: Record,
    R::Id: Ord,
{
    type Key = R::Id;

    fn key(&self) -> &R::Id {
        self.record.id()
    }

    fn children(&self) -> &[Self] {
        &self.children
    }
}

impl<R: Record + Serialize> Serialize for Node<'_, R> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut st = serializer.serialize_struct("Node", 2)?;
        st.serialize_field("record", self.record)?;
        st.serialize_field("children", &self.children)?;
        st.end()
    }
}

/// Builds the trees described by the parent references of `records`.
///
/// Roots and siblings keep the order of `records`. Fails with
/// `DuplicateId` when two records share an id, with `UnknownParent` when a
/// parent id is not in `records` and with `CyclicHierarchy` when a record
/// is its own ancestor.
pub fn build_forest<R>(records: &[R]) -> Result<Vec<Node<'_, R>>>
where
    R: Hierarchical,
    R::Id: Eq + Hash,
{
    check_acyclic(records)?;

    let mut children_of: HashMap<&R::Id, Vec<usize>> = HashMap::new();
    let mut roots = Vec::new();
    for (i, r) in records.iter().enumerate() {
        match r.parent() {
            Some(p) => children_of.entry(p).or_default().push(i),
            None => roots.push(i),
        }
    }

    fn build<'a, R>(
        records: &'a [R],
        idx: usize,
        children_of: &HashMap<&R::Id, Vec<usize>>,
    ) -> Node<'a, R>
    where
        R: Hierarchical,
        R::Id: Eq + Hash,
    {
        let record = &records[idx];
        let children = children_of
            .get(record.id())
            .map(|cs| cs.iter().map(|&c| build(records, c, children_of)).collect())
            .unwrap_or_default();

        Node { record, children }
    }

    Ok(roots
        .into_iter()
        .map(|i| build(records, i, &children_of))
        .collect())
}

/// Verifies that ids are unique, that every parent reference resolves and
/// that following parents from any record never comes back to it.
pub fn check_acyclic<R>(records: &[R]) -> Result<()>
where
    R: Hierarchical,
    R::Id: Eq + Hash,
{
    let mut index: HashMap<&R::Id, usize> = HashMap::with_capacity(records.len());
    for (i, r) in records.iter().enumerate() {
        if index.insert(r.id(), i).is_some() {
            return Err(Error::DuplicateId(r.id().to_string()));
        }
    }

    for r in records {
        let mut steps = 0;
        let mut curr = r;
        while let Some(pid) = curr.parent() {
            let Some(&pidx) = index.get(pid) else {
                return Err(Error::UnknownParent {
                    id: curr.id().to_string(),
                    parent: pid.to_string(),
                });
            };

            steps += 1;
            // a chain longer than the collection must revisit a record
            if pid == r.id() || steps > records.len() {
                return Err(Error::CyclicHierarchy(r.id().to_string()));
            }
            curr = &records[pidx];
        }
    }

    Ok(())
}

/// One line of a rendered tree.
#[derive(Debug, Serialize)]
pub struct VisibleRow<'a, N> {
    pub depth: usize,
    pub node: &'a N,
    pub has_children: bool,
    pub expanded: bool,
}

/// Walks `roots` depth first and returns the rows a reader sees: the
/// children of a node are listed only while the node is expanded.
pub fn visible_rows<'a, N: TreeNode>(
    roots: &'a [N],
    expansion: &Expansion<N::Key>,
) -> Vec<VisibleRow<'a, N>> {
    fn walk<'a, N: TreeNode>(
        node: &'a N,
        depth: usize,
        expansion: &Expansion<N::Key>,
        out: &mut Vec<VisibleRow<'a, N>>,
    ) {
        let has_children = node.has_children();
        let expanded = has_children && expansion.is_expanded(node.key());
        out.push(VisibleRow {
            depth,
            node,
            has_children,
            expanded,
        });

        if expanded {
            for child in node.children() {
                walk(child, depth + 1, expansion, out);
            }
        }
    }

    let mut out = Vec::new();
    for root in roots {
        walk(root, 0, expansion, &mut out);
    }
    out
}

/// Keys of every node that has children, for "expand all".
pub fn branch_keys<N: TreeNode>(roots: &[N]) -> Vec<N::Key> {
    let mut keys = Vec::new();
    let mut stack: Vec<&N> = roots.iter().rev().collect();
    while let Some(n) = stack.pop() {
        if n.has_children() {
            keys.push(n.key().clone());
        }
        stack.extend(n.children().iter().rev());
    }
    keys
}

/// Icon and colour of a tree row at a given depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthStyle {
    pub icon: &'static str,
    pub color: Color,
}

pub const DEPTH_STYLES: [DepthStyle; 6] = [
    DepthStyle { icon: "■", color: Color::Grey },
    DepthStyle { icon: "□", color: Color::DarkBlue },
    DepthStyle { icon: "▦", color: Color::DarkMagenta },
    DepthStyle { icon: "◫", color: Color::DarkGreen },
    DepthStyle { icon: "≡", color: Color::DarkYellow },
    DepthStyle { icon: "▤", color: Color::DarkCyan },
];

/// Depths past the end of `DEPTH_STYLES` reuse its last entry.
pub fn depth_style(depth: usize) -> DepthStyle {
    DEPTH_STYLES[depth.min(DEPTH_STYLES.len() - 1)]
}

/// Two spaces per level.
pub fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, PartialEq)]
    struct Item {
        id: String,
        parent: Option<String>,
    }

    impl Record for Item {
        type Id = String;

        fn id(&self) -> &String {
            &self.id
        }
    }

    impl Hierarchical for Item {
        fn parent(&self) -> Option<&String> {
            self.parent.as_ref()
        }
    }

    fn item(id: &str, parent: Option<&str>) -> Item {
        Item {
            id: id.to_string(),
            parent: parent.map(str::to_string),
        }
    }

    fn ids<'a>(rows: &[VisibleRow<'a, Node<'a, Item>>]) -> Vec<(usize, &'a str)> {
        rows.iter()
            .map(|r| (r.depth, r.node.record().id.as_str()))
            .collect()
    }

    fn sample() -> Vec<Item> {
        vec![
            item("1", None),
            item("3", None),
            item("3-1", Some("3")),
            item("3-2", Some("3")),
            item("3-1-a", Some("3-1")),
            item("4", None),
        ]
    }

    #[test]
    fn forest_keeps_record_order() {
        let records = sample();
        let forest = build_forest(&records).unwrap();

        let roots: Vec<_> = forest.iter().map(|n| n.record().id.as_str()).collect();
        assert_eq!(roots, vec!["1", "3", "4"]);

        let kids: Vec<_> = forest[1]
            .children()
            .iter()
            .map(|n| n.record().id.as_str())
            .collect();
        assert_eq!(kids, vec!["3-1", "3-2"]);
    }

    #[test]
    fn collapsed_nodes_hide_children() {
        let records = sample();
        let forest = build_forest(&records).unwrap();

        let rows = visible_rows(&forest, &Expansion::new());
        assert_eq!(ids(&rows), vec![(0, "1"), (0, "3"), (0, "4")]);
        assert!(rows[1].has_children && !rows[1].expanded);
        assert!(!rows[0].has_children);

        let exp: Expansion<String> = ["3".to_string()].into_iter().collect();
        let rows = visible_rows(&forest, &exp);
        assert_eq!(
            ids(&rows),
            vec![(0, "1"), (0, "3"), (1, "3-1"), (1, "3-2"), (0, "4")]
        );

        let mut exp = Expansion::new();
        exp.expand_all(branch_keys(&forest));
        let rows = visible_rows(&forest, &exp);
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[3].depth, 2);
    }

    #[test]
    fn expanding_a_leaf_changes_nothing() {
        let records = sample();
        let forest = build_forest(&records).unwrap();
        let exp: Expansion<String> = ["1".to_string()].into_iter().collect();

        let rows = visible_rows(&forest, &exp);
        assert!(!rows[0].expanded);
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let records = vec![item("1", None), item("2", Some("9"))];
        assert!(matches!(
            build_forest(&records),
            Err(Error::UnknownParent { ref id, ref parent }) if id == "2" && parent == "9"
        ));
    }

    #[test]
    fn cycles_are_rejected() {
        let own_parent = vec![item("1", Some("1"))];
        assert!(matches!(
            check_acyclic(&own_parent),
            Err(Error::CyclicHierarchy(_))
        ));

        let loop3 = vec![
            item("root", None),
            item("a", Some("c")),
            item("b", Some("a")),
            item("c", Some("b")),
        ];
        assert!(matches!(
            build_forest(&loop3),
            Err(Error::CyclicHierarchy(_))
        ));

        assert!(check_acyclic(&sample()).is_ok());
    }

    #[test]
    fn repeated_ids_are_rejected() {
        // "a" and "b" point at each other through their second copies
        let records = vec![
            item("a", None),
            item("b", Some("a")),
            item("a", Some("b")),
            item("b", None),
            item("a", None),
        ];
        assert!(matches!(check_acyclic(&records), Err(Error::DuplicateId(ref id)) if id == "a"));
        assert!(matches!(build_forest(&records), Err(Error::DuplicateId(_))));
    }

    #[test]
    fn depth_style_is_capped() {
        assert_eq!(depth_style(0), DEPTH_STYLES[0]);
        assert_eq!(depth_style(2).color, Color::DarkMagenta);
        assert_eq!(depth_style(5), DEPTH_STYLES[5]);
        assert_eq!(depth_style(42), DEPTH_STYLES[5]);
        assert_eq!(indent(3), "      ");
    }
}
