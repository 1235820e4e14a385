//! Catalog documents: products and the category tree.

mod category;
mod product;

pub use category::{Category, CategoryError, CategoryNode, CategoryPatch, CategoryTree, slugify};
pub use product::{Product, ProductError, ProductPatch};
