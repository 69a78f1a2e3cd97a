//! Campground documents and their in-memory store.
//!
//! `author` is set once at creation and never changes afterwards; updates are a
//! full overwrite of the listing fields with author and reviews carried over.

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

/// A review left on a campground. Reviews arrive through seed data; the review
/// routes of the original app are outside this service's surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub author: String,
    pub rating: u8,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct Campground {
    pub id: Uuid,
    pub title: String,
    pub location: String,
    pub price: f64,
    pub image: String,
    pub description: String,
    pub author: Uuid,
    pub reviews: Vec<Review>,
}

/// Validated input for creating or overwriting a campground.
#[derive(Debug, Clone, PartialEq)]
pub struct CampgroundInput {
    pub title: String,
    pub location: String,
    pub price: f64,
    pub image: String,
    pub description: String,
}

/// In-memory campground collection keyed by generated id. Writes are atomic per
/// document; there are no multi-document transactions, matching the store the
/// original app delegated to.
#[derive(Debug, Clone, Default)]
pub struct CampgroundStore {
    inner: Arc<DashMap<Uuid, Campground>>,
}

impl CampgroundStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, input: CampgroundInput, author: Uuid) -> Campground {
        self.insert_with_reviews(input, author, Vec::new())
    }

    pub fn insert_with_reviews(
        &self,
        input: CampgroundInput,
        author: Uuid,
        reviews: Vec<Review>,
    ) -> Campground {
        let campground = Campground {
            id: Uuid::new_v4(),
            title: input.title,
            location: input.location,
            price: input.price,
            image: input.image,
            description: input.description,
            author,
            reviews,
        };
        self.inner.insert(campground.id, campground.clone());
        campground
    }

    pub fn get(&self, id: Uuid) -> Option<Campground> {
        self.inner.get(&id).map(|entry| entry.value().clone())
    }

    /// All campgrounds, sorted by title then id for stable rendering.
    pub fn all(&self) -> Vec<Campground> {
        let mut all = self
            .inner
            .iter()
            .map(|entry| entry.value().clone())
            .collect::<Vec<_>>();
        all.sort_by(|left, right| {
            left.title
                .cmp(&right.title)
                .then_with(|| left.id.cmp(&right.id))
        });
        all
    }

    /// Full-field overwrite. `author` and `reviews` are preserved. Returns the
    /// updated document, or `None` when the id is unknown.
    pub fn update(&self, id: Uuid, input: CampgroundInput) -> Option<Campground> {
        let mut entry = self.inner.get_mut(&id)?;
        entry.title = input.title;
        entry.location = input.location;
        entry.price = input.price;
        entry.image = input.image;
        entry.description = input.description;
        Some(entry.value().clone())
    }

    pub fn remove(&self, id: Uuid) -> Option<Campground> {
        self.inner.remove(&id).map(|(_, campground)| campground)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
