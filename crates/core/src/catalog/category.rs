//! Two-level category tree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::product::double_option;
use crate::types::CategoryId;

/// Errors raised by category validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CategoryError {
    #[error("category name cannot be empty")]
    MissingName,
    #[error("a category cannot be its own parent")]
    SelfParent,
    /// The chosen parent is itself a child; the tree is only two levels deep.
    #[error("category {0} is not a top-level category")]
    ParentNotTopLevel(CategoryId),
}

/// A catalog category. No `parent_id` means top-level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Create a category with a slug derived from its name.
    #[must_use]
    pub fn new(name: impl Into<String>, parent_id: Option<CategoryId>) -> Self {
        let name = name.into();
        Self {
            id: CategoryId::generate(),
            slug: slugify(&name),
            name,
            parent_id,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub const fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Validate this category against its prospective parent.
    ///
    /// # Errors
    ///
    /// Returns an error for a blank name, a self-reference, or a parent that
    /// is not top-level.
    pub fn validate(&self, parent: Option<&Self>) -> Result<(), CategoryError> {
        if self.name.trim().is_empty() {
            return Err(CategoryError::MissingName);
        }
        if self.parent_id.as_ref() == Some(&self.id) {
            return Err(CategoryError::SelfParent);
        }
        if let Some(parent) = parent
            && !parent.is_top_level()
        {
            return Err(CategoryError::ParentNotTopLevel(parent.id.clone()));
        }
        Ok(())
    }

    /// Apply a partial update. The slug follows the name.
    pub fn apply_patch(&mut self, patch: &CategoryPatch) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
            self.slug = slugify(name);
        }
        if let Some(parent_id) = &patch.parent_id {
            self.parent_id.clone_from(parent_id);
        }
    }
}

/// Partial category update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<CategoryId>>,
}

/// Lowercase, ASCII-alphanumeric words joined by single hyphens.
#[must_use]
pub fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// A top-level category with its direct children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<Category>,
}

/// Categories grouped into the two-level display tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CategoryTree(Vec<CategoryNode>);

impl CategoryTree {
    /// Group a flat category list.
    ///
    /// Input order is preserved at both levels. A child whose parent is
    /// missing, or whose parent is itself a child, is promoted to top-level.
    #[must_use]
    pub fn build(categories: &[Category]) -> Self {
        let is_root = |id: &CategoryId| {
            categories
                .iter()
                .any(|c| &c.id == id && c.is_top_level())
        };

        let mut nodes: Vec<CategoryNode> = categories
            .iter()
            .filter(|c| c.parent_id.as_ref().is_none_or(|parent| !is_root(parent)))
            .map(|c| CategoryNode {
                category: c.clone(),
                children: Vec::new(),
            })
            .collect();

        for child in categories {
            let Some(parent_id) = &child.parent_id else {
                continue;
            };
            if let Some(node) = nodes
                .iter_mut()
                .find(|n| n.category.is_top_level() && &n.category.id == parent_id)
            {
                node.children.push(child.clone());
            }
        }

        Self(nodes)
    }

    #[must_use]
    pub fn nodes(&self) -> &[CategoryNode] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Men's T-Shirts"), "men-s-t-shirts");
        assert_eq!(slugify("  Home & Garden "), "home-garden");
    }

    #[test]
    fn test_tree_groups_children_under_parents() {
        let apparel = Category::new("Apparel", None);
        let shirts = Category::new("Shirts", Some(apparel.id.clone()));
        let toys = Category::new("Toys", None);

        let tree = CategoryTree::build(&[shirts.clone(), apparel.clone(), toys.clone()]);
        let nodes = tree.nodes();

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].category, apparel);
        assert_eq!(nodes[0].children, vec![shirts]);
        assert_eq!(nodes[1].category, toys);
        assert!(nodes[1].children.is_empty());
    }

    #[test]
    fn test_orphan_is_promoted() {
        let orphan = Category::new("Orphan", Some(CategoryId::new("gone")));
        let tree = CategoryTree::build(std::slice::from_ref(&orphan));
        assert_eq!(tree.nodes().len(), 1);
        assert_eq!(tree.nodes()[0].category, orphan);
    }

    #[test]
    fn test_parent_must_be_top_level() {
        let root = Category::new("Root", None);
        let mid = Category::new("Mid", Some(root.id.clone()));
        let leaf = Category::new("Leaf", Some(mid.id.clone()));

        assert_eq!(mid.validate(Some(&root)), Ok(()));
        assert_eq!(
            leaf.validate(Some(&mid)),
            Err(CategoryError::ParentNotTopLevel(mid.id.clone()))
        );
    }

    #[test]
    fn test_patch_updates_slug() {
        let mut category = Category::new("Old Name", None);
        category.apply_patch(&CategoryPatch {
            name: Some("New Name".to_string()),
            parent_id: None,
        });
        assert_eq!(category.slug, "new-name");
    }
}
