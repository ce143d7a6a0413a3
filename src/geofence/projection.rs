//! Which site/group/spot rows the tree table shows, and which are expanded.

use super::store::{SpatialStore, Stored};
use crate::model::{EntityKey, Group, Site, Spot};
use std::collections::HashSet;

/// Per-row expand/collapse toggles plus the branch that was last auto-expanded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpansionState {
    expanded: HashSet<EntityKey>,
    branch: Option<String>,
}

impl ExpansionState {
    #[must_use]
    pub fn is_expanded(&self, key: &EntityKey) -> bool {
        self.expanded.contains(key)
    }

    pub fn toggle(&mut self, key: &EntityKey) {
        if !self.expanded.remove(key) {
            self.expanded.insert(key.clone());
        }
    }

    /// Expands the chain from the root site to the current selection.
    ///
    /// Rows of other sites collapse when the selection moves to a different
    /// site; toggles inside the same site are kept.
    pub fn follow_selection(&mut self, store: &SpatialStore) {
        let Some(selected) = store.selection() else {
            return;
        };
        let chain = store.ancestry(selected);
        let root = match chain.first() {
            Some(EntityKey::Site { id, .. }) => id.clone(),
            _ => return,
        };

        if self.branch.as_deref() != Some(root.as_str()) {
            self.expanded.clear();
            self.branch = Some(root);
        }
        self.expanded.extend(
            chain
                .into_iter()
                .filter(|key| !matches!(key, EntityKey::Spot { .. })),
        );
    }

    /// Rows whose entity no longer exists are forgotten.
    pub fn prune(&mut self, store: &SpatialStore) {
        self.expanded.retain(|key| store.contains(key));
        if let Some(branch) = &self.branch {
            if store.site(branch).is_none() {
                self.branch = None;
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreeRow {
    pub key: EntityKey,
    pub depth: u8,
    pub name: String,
    /// Counts for sites and groups, occupancy for spots.
    pub detail: String,
    pub has_children: bool,
    pub expanded: bool,
    pub selected: bool,
}

fn matches(name: &str, needle: &str) -> bool {
    needle.is_empty() || name.to_lowercase().contains(needle)
}

fn group_matches(store: &SpatialStore, group: &Group, needle: &str) -> bool {
    matches(&group.name, needle) || store.spots_of(&group.id).any(|s| matches(&s.name, needle))
}

fn site_matches(store: &SpatialStore, site: &Site, needle: &str) -> bool {
    matches(&site.name, needle)
        || store
            .groups_of(&site.id)
            .any(|g| group_matches(store, g, needle))
}

/// Sites the table shows.
///
/// With a group or spot selected only its ancestor site is shown, whatever
/// the search says. Otherwise a site shows when its own name matches or any
/// descendant matches.
#[must_use]
pub fn visible_sites<'a>(store: &'a SpatialStore, search: &str) -> Vec<&'a Site> {
    match store.selection() {
        Some(key @ (EntityKey::Group { .. } | EntityKey::Spot { .. })) => {
            store.root_site_of(key).into_iter().collect()
        }
        _ => {
            let needle = search.trim().to_lowercase();
            store
                .sites()
                .iter()
                .filter(|site| site_matches(store, site, &needle))
                .collect()
        }
    }
}

/// Flattens the visible tree into table rows, depth-first.
#[must_use]
pub fn project(store: &SpatialStore, expansion: &ExpansionState, search: &str) -> Vec<TreeRow> {
    let focused = matches!(
        store.selection(),
        Some(EntityKey::Group { .. } | EntityKey::Spot { .. })
    );
    let needle = if focused {
        String::new()
    } else {
        search.trim().to_lowercase()
    };
    let selection = store.selection();

    let row = |key: EntityKey, depth: u8, name: &str, detail: String, has_children: bool| TreeRow {
        expanded: has_children && expansion.is_expanded(&key),
        selected: selection == Some(&key),
        key,
        depth,
        name: name.to_string(),
        detail,
        has_children,
    };

    let mut rows = Vec::new();
    for site in visible_sites(store, search) {
        let site_hit = matches(&site.name, &needle);
        let groups: Vec<&Group> = store
            .groups_of(&site.id)
            .filter(|g| site_hit || group_matches(store, g, &needle))
            .collect();
        let site_row = row(
            site.key(),
            0,
            &site.name,
            format!("{}/{}", site.available_spot_number, site.total_spot_number),
            !groups.is_empty(),
        );
        let open = site_row.expanded;
        rows.push(site_row);
        if !open {
            continue;
        }

        for group in groups {
            let group_hit = site_hit || matches(&group.name, &needle);
            let spots: Vec<&Spot> = store
                .spots_of(&group.id)
                .filter(|s| group_hit || matches(&s.name, &needle))
                .collect();
            let group_row = row(
                group.key(),
                1,
                &group.name,
                format!("{}/{}", group.available_spot_number, group.total_spot_number),
                !spots.is_empty(),
            );
            let open = group_row.expanded;
            rows.push(group_row);
            if !open {
                continue;
            }

            for spot in spots {
                rows.push(row(
                    spot.key(),
                    2,
                    &spot.name,
                    crate::model::Choice::label(spot.status).to_string(),
                    false,
                ));
            }
        }
    }
    rows
}
