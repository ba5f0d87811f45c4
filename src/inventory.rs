use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::group::Expansion;
use crate::tree::TreeNode;

/// A stock line; variants of a product hang below it as children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub product_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    pub status: String,
    pub current_qty: u64,
    pub incoming: u64,
    pub usage: u64,
    pub out_of_stock: String,
    pub orders_by: String,
    pub weeks_stock: u32,
    pub lead: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<InventoryItem>,
}

impl TreeNode for InventoryItem {
    type Key = String;

    fn key(&self) -> &String {
        &self.id
    }

    fn children(&self) -> &[InventoryItem] {
        &self.children
    }
}

impl InventoryItem {
    /// Looks `id` up in this item and everything below it.
    pub fn find(&self, id: &str) -> Option<&InventoryItem> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    /// Number of items in the subtree rooted here, this one included.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(InventoryItem::subtree_len).sum::<usize>()
    }
}

/// Every item of the table starts collapsed.
pub fn default_expansion() -> Expansion<String> {
    Expansion::new()
}

/// Ids key the expansion set, so they must be unique across the whole
/// forest and not only among siblings.
pub fn check_unique_ids(roots: &[InventoryItem]) -> Result<()> {
    let mut seen = HashSet::new();
    let mut stack: Vec<&InventoryItem> = roots.iter().collect();
    while let Some(item) = stack.pop() {
        if !seen.insert(item.id.as_str()) {
            return Err(Error::DuplicateId(item.id.clone()));
        }
        stack.extend(item.children.iter());
    }
    Ok(())
}

pub fn find<'a>(roots: &'a [InventoryItem], id: &str) -> Option<&'a InventoryItem> {
    roots.iter().find_map(|r| r.find(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    use crate::tree::{branch_keys, visible_rows};

    fn item(id: &str, children: Vec<InventoryItem>) -> InventoryItem {
        InventoryItem {
            id: id.to_string(),
            product_name: format!("Product {id}"),
            sku: None,
            status: "Ready".to_string(),
            current_qty: 10,
            incoming: 0,
            usage: 1,
            out_of_stock: "Sep 14, 2022".to_string(),
            orders_by: "Sep 14, 2022".to_string(),
            weeks_stock: 4,
            lead: 7,
            children,
        }
    }

    fn table() -> Vec<InventoryItem> {
        vec![
            item("1", vec![]),
            item(
                "3",
                vec![item("3-1", vec![item("3-1-1", vec![])]), item("3-2", vec![])],
            ),
        ]
    }

    #[test]
    fn starts_collapsed_and_expands_by_id() {
        let items = table();
        let mut exp = default_expansion();
        assert_eq!(visible_rows(&items, &exp).len(), 2);

        exp.toggle("3".to_string());
        let rows = visible_rows(&items, &exp);
        let ids: Vec<_> = rows.iter().map(|r| (r.depth, r.node.id.as_str())).collect();
        assert_eq!(ids, vec![(0, "1"), (0, "3"), (1, "3-1"), (1, "3-2")]);

        exp.expand_all(branch_keys(&items));
        assert_eq!(visible_rows(&items, &exp).len(), 5);
    }

    #[test]
    fn lookup_and_size() {
        let items = table();
        assert_eq!(find(&items, "3-1-1").map(|i| i.id.as_str()), Some("3-1-1"));
        assert!(find(&items, "9").is_none());
        assert_eq!(items[1].subtree_len(), 4);
    }

    #[test]
    fn duplicate_ids_anywhere_are_rejected() {
        assert!(check_unique_ids(&table()).is_ok());

        let dup = vec![item("1", vec![]), item("2", vec![item("1", vec![])])];
        assert!(matches!(check_unique_ids(&dup), Err(Error::DuplicateId(id)) if id == "1"));
    }

    #[test]
    fn reads_camel_case_json() {
        let json = r#"{
            "id": "1", "productName": "Backpack", "status": "11,982 Ready",
            "currentQty": 653, "incoming": 653, "usage": 653,
            "outOfStock": "Sep 14, 2022", "ordersBy": "Sep 14, 2022",
            "weeksStock": 43, "lead": 103
        }"#;
        let it: InventoryItem = serde_json::from_str(json).unwrap();
        assert_eq!(it.product_name, "Backpack");
        assert!(it.children.is_empty());
        assert_eq!(it.sku, None);
    }
}
