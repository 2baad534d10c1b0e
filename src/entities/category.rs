// 🏷️ Category Entity - Service categories with a rewritable identifier
//
// The identifier is minted locally during collection and may later be
// rewritten to the remote system's identifier. The display name is the
// identity key (case and whitespace insensitive).

use super::{i18n, I18n};
use crate::intern::InternTable;
use serde::{Deserialize, Serialize};

// ============================================================================
// CATEGORY ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,

    /// Display name, e.g. {"en": "Aesthetics & Dermatology"}
    pub name_i18n: I18n,

    /// First-seen order in the source sheet (1-based)
    pub sort_order: i64,
}

impl Category {
    pub fn new(id: i64, locale: &str, name: &str, sort_order: i64) -> Self {
        Category {
            id,
            name_i18n: i18n(locale, name),
            sort_order,
        }
    }

    /// Name in the given locale, falling back to any populated locale
    pub fn display_name(&self, locale: &str) -> &str {
        self.name_i18n
            .get(locale)
            .or_else(|| self.name_i18n.values().next())
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Same category, different identifier
    pub fn with_id(&self, id: i64) -> Category {
        Category {
            id,
            ..self.clone()
        }
    }
}

// ============================================================================
// CATEGORY REGISTRY
// ============================================================================

/// Deduplicates categories by normalized name during one collection run
///
/// The spelling kept for display is the first one seen.
pub struct CategoryRegistry {
    table: InternTable,
    categories: Vec<Category>,
    locale: String,
}

impl CategoryRegistry {
    pub fn new(locale: &str) -> Self {
        CategoryRegistry {
            table: InternTable::new(),
            categories: Vec::new(),
            locale: locale.to_string(),
        }
    }

    /// Identifier for `name`, creating the category on first sight
    pub fn resolve(&mut self, name: &str) -> i64 {
        let interned = self.table.intern(name);

        if interned.is_new {
            let sort_order = self.categories.len() as i64 + 1;
            let name = crate::normalize::collapse_whitespace(name);
            log::debug!("New category #{}: {}", interned.id, name);
            self.categories
                .push(Category::new(interned.id, &self.locale, &name, sort_order));
        }

        interned.id
    }

    /// All categories in first-seen order
    pub fn into_categories(self) -> Vec<Category> {
        self.categories
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_creation() {
        let category = Category::new(3, "en", "Botox", 2);
        assert_eq!(category.id, 3);
        assert_eq!(category.display_name("en"), "Botox");
        assert_eq!(category.sort_order, 2);
    }

    #[test]
    fn test_display_name_falls_back_to_any_locale() {
        let category = Category::new(1, "ru", "Ботокс", 1);
        assert_eq!(category.display_name("en"), "Ботокс");
    }

    #[test]
    fn test_with_id_keeps_values() {
        let category = Category::new(1, "en", "Fillers", 4);
        let rewritten = category.with_id(42);
        assert_eq!(rewritten.id, 42);
        assert_eq!(rewritten.name_i18n, category.name_i18n);
        assert_eq!(rewritten.sort_order, 4);
    }

    #[test]
    fn test_registry_dedup_case_insensitive() {
        let mut registry = CategoryRegistry::new("en");
        let a = registry.resolve("Botox");
        let b = registry.resolve("BOTOX");
        let c = registry.resolve("Fillers");

        assert_eq!(a, b);
        assert_ne!(a, c);

        let categories = registry.into_categories();
        assert_eq!(categories.len(), 2);
        // First spelling wins
        assert_eq!(categories[0].display_name("en"), "Botox");
    }

    #[test]
    fn test_registry_sort_order_is_first_seen() {
        let mut registry = CategoryRegistry::new("en");
        registry.resolve("Laser");
        registry.resolve("Botox");
        registry.resolve("laser");
        registry.resolve("Fillers");

        let categories = registry.into_categories();
        let names: Vec<&str> = categories.iter().map(|c| c.display_name("en")).collect();
        assert_eq!(names, vec!["Laser", "Botox", "Fillers"]);
        assert_eq!(
            categories.iter().map(|c| (c.id, c.sort_order)).collect::<Vec<_>>(),
            vec![(1, 1), (2, 2), (3, 3)]
        );
    }
}
