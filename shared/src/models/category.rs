//! Category Model

use serde::{Deserialize, Serialize};

/// Category entity (nullable `parent_id` forms a tree)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub parent_id: Option<i64>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create category payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCreate {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub parent_id: Option<i64>,
    pub sort_order: Option<i32>,
}

/// Update category payload
///
/// `parent_id: Some(None)` is not distinguishable from absent in JSON, so
/// detaching from a parent uses `clear_parent`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub clear_parent: bool,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

/// Category with nested children, for the storefront menu
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    /// Build a forest from a flat list. Nodes whose parent is missing are
    /// treated as roots. Sibling order follows `sort_order`, then name.
    pub fn build_tree(mut categories: Vec<Category>) -> Vec<CategoryNode> {
        categories.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.name.cmp(&b.name)));
        let ids: std::collections::HashSet<i64> = categories.iter().map(|c| c.id).collect();
        let mut children: std::collections::HashMap<i64, Vec<Category>> =
            std::collections::HashMap::new();
        let mut roots = Vec::new();
        for category in categories {
            match category.parent_id {
                Some(parent) if ids.contains(&parent) && parent != category.id => {
                    children.entry(parent).or_default().push(category)
                }
                _ => roots.push(category),
            }
        }
        roots
            .into_iter()
            .map(|root| Self::attach(root, &mut children))
            .collect()
    }

    fn attach(
        category: Category,
        children: &mut std::collections::HashMap<i64, Vec<Category>>,
    ) -> CategoryNode {
        let kids = children.remove(&category.id).unwrap_or_default();
        CategoryNode {
            category,
            children: kids
                .into_iter()
                .map(|child| Self::attach(child, children))
                .collect(),
        }
    }
}

/// Walk the parent chain from `new_parent` and report whether `category_id`
/// would become its own ancestor. `parent_of` maps id to parent id.
pub fn creates_cycle(
    category_id: i64,
    new_parent: i64,
    parent_of: &std::collections::HashMap<i64, Option<i64>>,
) -> bool {
    let mut current = Some(new_parent);
    let mut steps = 0usize;
    while let Some(id) = current {
        if id == category_id {
            return true;
        }
        steps += 1;
        if steps > parent_of.len() {
            // Existing data already loops; refuse to extend it
            return true;
        }
        current = parent_of.get(&id).copied().flatten();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn cat(id: i64, parent: Option<i64>, sort: i32, name: &str) -> Category {
        Category {
            id,
            name: name.to_string(),
            slug: name.to_lowercase(),
            description: None,
            image: None,
            parent_id: parent,
            sort_order: sort,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_build_tree_nests_children() {
        let tree = CategoryNode::build_tree(vec![
            cat(3, Some(1), 0, "Shirts"),
            cat(1, None, 1, "Men"),
            cat(2, None, 0, "Women"),
            cat(4, Some(3), 0, "Polo"),
            cat(5, Some(99), 2, "Orphan"),
        ]);
        let names: Vec<_> = tree.iter().map(|n| n.category.name.as_str()).collect();
        assert_eq!(names, vec!["Women", "Men", "Orphan"]);
        let men = &tree[1];
        assert_eq!(men.children.len(), 1);
        assert_eq!(men.children[0].category.name, "Shirts");
        assert_eq!(men.children[0].children[0].category.name, "Polo");
    }

    #[test]
    fn test_creates_cycle() {
        // 1 <- 2 <- 3
        let parents: HashMap<i64, Option<i64>> =
            [(1, None), (2, Some(1)), (3, Some(2))].into_iter().collect();
        assert!(creates_cycle(1, 3, &parents));
        assert!(creates_cycle(2, 2, &parents));
        assert!(!creates_cycle(3, 1, &parents));
        assert!(!creates_cycle(4, 3, &parents));
    }
}
