//! Client-side upkeep of the one-default-collection-per-list rule.
//!
//! The backend does not enforce the rule; these helpers are what the popups
//! run before and after writes.

use crate::models::Collection;

/// Ids of collections in `list_id` that must lose their default flag when
/// `new_default_id` becomes the default.
pub fn defaults_to_unset(
    collections: &[Collection],
    list_id: &str,
    new_default_id: &str,
) -> Vec<String> {
    collections
        .iter()
        .filter(|c| c.list_id == list_id && c.is_default && c.id != new_default_id)
        .map(|c| c.id.clone())
        .collect()
}

/// Mirror a new default locally.
pub fn mark_default(collections: &mut [Collection], list_id: &str, new_default_id: &str) {
    for c in collections.iter_mut().filter(|c| c.list_id == list_id) {
        c.is_default = c.id == new_default_id;
    }
}

pub fn default_collection<'a>(collections: &'a [Collection], list_id: &str) -> Option<&'a Collection> {
    collections
        .iter()
        .find(|c| c.list_id == list_id && c.is_default)
}

/// Default collection first, then creation order.
pub fn sort_collections(collections: &mut [Collection]) {
    collections.sort_by(|a, b| {
        b.is_default
            .cmp(&a.is_default)
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(id: &str, list: &str, default: bool) -> Collection {
        Collection {
            id: id.to_string(),
            name: id.to_uppercase(),
            bg_color: "#fff".to_string(),
            created_at: format!("2024-01-01T00:00:0{id}Z"),
            is_default: default,
            list_id: list.to_string(),
        }
    }

    #[test]
    fn unsets_other_defaults_in_same_list_only() {
        let all = [col("1", "a", true), col("2", "a", false), col("3", "b", true)];
        assert_eq!(defaults_to_unset(&all, "a", "2"), vec!["1".to_string()]);
        assert!(defaults_to_unset(&all, "a", "1").is_empty());
    }

    #[test]
    fn mark_default_leaves_exactly_one() {
        let mut all = vec![col("1", "a", true), col("2", "a", false), col("3", "b", true)];
        mark_default(&mut all, "a", "2");
        assert!(!all[0].is_default);
        assert!(all[1].is_default);
        assert!(all[2].is_default);
        assert_eq!(default_collection(&all, "a").map(|c| c.id.as_str()), Some("2"));
    }

    #[test]
    fn default_sorts_first() {
        let mut all = vec![col("1", "a", false), col("2", "a", true), col("3", "a", false)];
        sort_collections(&mut all);
        assert_eq!(
            all.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
            ["2", "1", "3"]
        );
    }
}
