//! In-memory collections of sites, groups and spots plus the current selection.
//!
//! The store performs no validation. Callers check containment before
//! committing anything here.

use crate::model::{EntityKey, Group, Site, Spot};

/// An entity kind the store keeps a collection for.
pub trait Stored: Clone {
    fn id(&self) -> &str;
    fn key(&self) -> EntityKey;
    fn collection(store: &SpatialStore) -> &Vec<Self>;
    fn collection_mut(store: &mut SpatialStore) -> &mut Vec<Self>;
}

impl Stored for Site {
    fn id(&self) -> &str {
        &self.id
    }

    fn key(&self) -> EntityKey {
        EntityKey::site(self.id.clone(), self.subtype)
    }

    fn collection(store: &SpatialStore) -> &Vec<Self> {
        &store.sites
    }

    fn collection_mut(store: &mut SpatialStore) -> &mut Vec<Self> {
        &mut store.sites
    }
}

impl Stored for Group {
    fn id(&self) -> &str {
        &self.id
    }

    fn key(&self) -> EntityKey {
        EntityKey::group(self.id.clone())
    }

    fn collection(store: &SpatialStore) -> &Vec<Self> {
        &store.groups
    }

    fn collection_mut(store: &mut SpatialStore) -> &mut Vec<Self> {
        &mut store.groups
    }
}

impl Stored for Spot {
    fn id(&self) -> &str {
        &self.id
    }

    fn key(&self) -> EntityKey {
        EntityKey::spot(self.id.clone())
    }

    fn collection(store: &SpatialStore) -> &Vec<Self> {
        &store.spots
    }

    fn collection_mut(store: &mut SpatialStore) -> &mut Vec<Self> {
        &mut store.spots
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpatialStore {
    sites: Vec<Site>,
    groups: Vec<Group>,
    spots: Vec<Spot>,
    selection: Option<EntityKey>,
}

impl SpatialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Full reload of one collection.
    pub fn replace_all<T: Stored>(&mut self, list: Vec<T>) {
        *T::collection_mut(self) = list;
    }

    /// Replaces the first entity matching `matcher`, or prepends `entity`.
    pub fn upsert_one<T: Stored>(&mut self, entity: T, matcher: impl Fn(&T) -> bool) {
        let items = T::collection_mut(self);
        match items.iter_mut().find(|item| matcher(item)) {
            Some(slot) => *slot = entity,
            None => items.insert(0, entity),
        }
    }

    /// Upsert keyed on the entity's own id.
    pub fn upsert<T: Stored>(&mut self, entity: T) {
        let id = entity.id().to_string();
        self.upsert_one(entity, |item: &T| item.id() == id);
    }

    /// Removes every entity matching `predicate` and returns how many went.
    pub fn remove_matching<T: Stored>(&mut self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        let items = T::collection_mut(self);
        let before = items.len();
        items.retain(|item| !predicate(item));
        before - items.len()
    }

    pub fn set_selection(&mut self, selection: Option<EntityKey>) {
        self.selection = selection;
    }

    #[must_use]
    pub fn selection(&self) -> Option<&EntityKey> {
        self.selection.as_ref()
    }

    #[must_use]
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    #[must_use]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    #[must_use]
    pub fn spots(&self) -> &[Spot] {
        &self.spots
    }

    #[must_use]
    pub fn site(&self, id: &str) -> Option<&Site> {
        self.sites.iter().find(|s| s.id == id)
    }

    #[must_use]
    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    #[must_use]
    pub fn spot(&self, id: &str) -> Option<&Spot> {
        self.spots.iter().find(|s| s.id == id)
    }

    pub fn groups_of<'a>(&'a self, site_id: &'a str) -> impl Iterator<Item = &'a Group> + 'a {
        self.groups
            .iter()
            .filter(move |g| g.ref_parking_site == site_id)
    }

    pub fn spots_of<'a>(&'a self, group_id: &'a str) -> impl Iterator<Item = &'a Spot> + 'a {
        self.spots
            .iter()
            .filter(move |s| s.ref_parking_group == group_id)
    }

    #[must_use]
    pub fn contains(&self, key: &EntityKey) -> bool {
        match key {
            EntityKey::Site { id, .. } => self.site(id).is_some(),
            EntityKey::Group { id } => self.group(id).is_some(),
            EntityKey::Spot { id } => self.spot(id).is_some(),
        }
    }

    /// Chain of keys from the root site down to `key`, inclusive.
    ///
    /// Stops early when a parent reference points at nothing in the store.
    #[must_use]
    pub fn ancestry(&self, key: &EntityKey) -> Vec<EntityKey> {
        let mut chain = Vec::with_capacity(3);
        let mut group_id = None;
        match key {
            EntityKey::Spot { id } => {
                if let Some(spot) = self.spot(id) {
                    group_id = Some(spot.ref_parking_group.as_str());
                }
                chain.push(key.clone());
            }
            EntityKey::Group { id } => group_id = Some(id.as_str()),
            EntityKey::Site { .. } => {
                chain.push(key.clone());
                return chain;
            }
        }

        if let Some(group) = group_id.and_then(|id| self.group(id)) {
            chain.push(group.key());
            if let Some(site) = self.site(&group.ref_parking_site) {
                chain.push(site.key());
            }
        }
        chain.reverse();
        chain
    }

    /// Id of the site `key` lives under, if the chain is intact.
    #[must_use]
    pub fn root_site_of(&self, key: &EntityKey) -> Option<&Site> {
        match self.ancestry(key).first() {
            Some(EntityKey::Site { id, .. }) => self.site(id),
            _ => None,
        }
    }
}
