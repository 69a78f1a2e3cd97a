//! Seed data loaded from a TOML file at startup.
//!
//! ## Seed file format
//!
//! ```toml
//! [[users]]
//! username = "bob"
//! email = "bob@example.com"
//! password = "pw"
//!
//! [[campgrounds]]
//! title = "River Bend"
//! location = "Bend, OR"
//! price = 25.0
//! image = "https://example.com/river.jpg"
//! description = "Quiet site by the water"
//! author = "bob"
//!
//! [[campgrounds.reviews]]
//! author = "alice"
//! rating = 5
//! body = "Lovely"
//! ```
//!
//! Users are registered before campgrounds, so `author` can name any seeded user.
//! Entries with a blank username or password are skipped; duplicate usernames are
//! deduplicated (last wins). A present but entirely empty seed file is an error.
//!
//! **Security:** the file holds plaintext passwords. Use `chmod 600`. The server
//! warns if it is world-readable (Unix).

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::campground::{CampgroundInput, CampgroundStore, Review};
use crate::users::{RegisterError, UserStore};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid seed data in {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("seed file {path} does not define any users or campgrounds")]
    Empty { path: String },
    #[error("failed to register seeded user {username}: {source}")]
    Register {
        username: String,
        source: RegisterError,
    },
    #[error("seeded campground {title} names unknown author {author}")]
    UnknownAuthor { title: String, author: String },
}

#[derive(Debug, Default, Deserialize)]
struct SeedFile {
    users: Option<Vec<SeedUser>>,
    campgrounds: Option<Vec<SeedCampground>>,
}

#[derive(Debug, Clone, Deserialize)]
struct SeedUser {
    username: String,
    email: String,
    password: String,
}

#[derive(Debug, Clone, Deserialize)]
struct SeedCampground {
    title: String,
    location: String,
    price: f64,
    image: String,
    description: String,
    author: String,
    #[serde(default)]
    reviews: Vec<SeedReview>,
}

#[derive(Debug, Clone, Deserialize)]
struct SeedReview {
    author: String,
    rating: u8,
    body: String,
}

#[derive(Debug, Clone, Copy)]
pub struct SeedSummary {
    pub users: usize,
    pub campgrounds: usize,
}

/// Load seed data into the stores. Warns if the file is world-readable.
pub fn load_seed(
    path: &Path,
    users: &UserStore,
    campgrounds: &CampgroundStore,
) -> Result<SeedSummary, SeedError> {
    check_seed_file_permissions(path);

    let raw = std::fs::read_to_string(path).map_err(|source| SeedError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let parsed: SeedFile = toml::from_str(&raw).map_err(|source| SeedError::Parse {
        path: path.display().to_string(),
        source,
    })?;

    let seed_users = dedup_users(parsed.users.unwrap_or_default());
    let seed_campgrounds = parsed.campgrounds.unwrap_or_default();
    if seed_users.is_empty() && seed_campgrounds.is_empty() {
        return Err(SeedError::Empty {
            path: path.display().to_string(),
        });
    }

    let mut user_count = 0;
    for entry in seed_users {
        users
            .register(&entry.username, &entry.email, &entry.password)
            .map_err(|source| SeedError::Register {
                username: entry.username.clone(),
                source,
            })?;
        user_count += 1;
    }

    let mut campground_count = 0;
    for entry in seed_campgrounds {
        let author =
            users
                .find_by_username(entry.author.trim())
                .ok_or_else(|| SeedError::UnknownAuthor {
                    title: entry.title.clone(),
                    author: entry.author.clone(),
                })?;
        let reviews = entry
            .reviews
            .into_iter()
            .map(|review| Review {
                author: review.author,
                rating: review.rating.min(5),
                body: review.body,
            })
            .collect::<Vec<_>>();
        campgrounds.insert_with_reviews(
            CampgroundInput {
                title: entry.title,
                location: entry.location,
                price: entry.price,
                image: entry.image,
                description: entry.description,
            },
            author.id,
            reviews,
        );
        campground_count += 1;
    }

    Ok(SeedSummary {
        users: user_count,
        campgrounds: campground_count,
    })
}

/// Drop entries with blank credentials; keep the last entry per username.
fn dedup_users(entries: Vec<SeedUser>) -> Vec<SeedUser> {
    let mut mapped = BTreeMap::new();
    for entry in entries {
        let username = entry.username.trim().to_string();
        if username.is_empty() || entry.password.trim().is_empty() {
            continue;
        }
        mapped.insert(username, entry);
    }
    mapped.into_values().collect::<Vec<_>>()
}

/// Warn if the seed file is world-readable. No-op on non-Unix.
#[cfg(unix)]
fn check_seed_file_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(meta) = std::fs::metadata(path) {
        let mode = meta.permissions().mode();
        if mode & 0o004 != 0 {
            warn!(
                path = %path.display(),
                "seed file is world-readable; consider chmod 600"
            );
        }
    }
}

#[cfg(not(unix))]
fn check_seed_file_permissions(_path: &Path) {}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use crate::campground::CampgroundStore;
    use crate::users::UserStore;

    use super::{load_seed, SeedError};

    const FULL_SEED: &str = r#"
[[users]]
username = "bob"
email = "bob@example.com"
password = "pw"

[[campgrounds]]
title = "River Bend"
location = "Bend, OR"
price = 25.0
image = "https://example.com/river.jpg"
description = "Quiet site by the water"
author = "bob"

[[campgrounds.reviews]]
author = "alice"
rating = 5
body = "Lovely"
"#;

    #[test]
    fn loads_users_and_campgrounds_with_reviews() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("seed.toml");
        std::fs::write(&path, FULL_SEED)?;

        let users = UserStore::new();
        let campgrounds = CampgroundStore::new();
        let summary = load_seed(&path, &users, &campgrounds)?;

        assert_eq!(summary.users, 1);
        assert_eq!(summary.campgrounds, 1);
        let bob = users.find_by_username("bob").unwrap();
        let listed = campgrounds.all();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].author, bob.id);
        assert_eq!(listed[0].reviews.len(), 1);
        assert_eq!(listed[0].reviews[0].rating, 5);
        Ok(())
    }

    #[test]
    fn empty_seed_file_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("seed.toml");
        std::fs::write(&path, "")?;

        let result = load_seed(&path, &UserStore::new(), &CampgroundStore::new());
        assert!(matches!(result, Err(SeedError::Empty { .. })));
        Ok(())
    }

    #[test]
    fn blank_credentials_are_skipped_and_duplicates_last_win() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("seed.toml");
        std::fs::write(
            &path,
            r#"
[[users]]
username = ""
email = "blank@example.com"
password = "pw"

[[users]]
username = "bob"
email = "first@example.com"
password = "pw1"

[[users]]
username = "bob"
email = "last@example.com"
password = "pw2"
"#,
        )?;

        let users = UserStore::new();
        let summary = load_seed(&path, &users, &CampgroundStore::new())?;

        assert_eq!(summary.users, 1);
        assert_eq!(users.find_by_username("bob").unwrap().email, "last@example.com");
        assert!(users.authenticate("bob", "pw2").is_some());
        Ok(())
    }

    #[test]
    fn campground_with_unknown_author_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("seed.toml");
        std::fs::write(
            &path,
            r#"
[[campgrounds]]
title = "Ghost Camp"
location = "Nowhere"
price = 5.0
image = "https://example.com/g.jpg"
description = "who owns this"
author = "nobody"
"#,
        )?;

        let result = load_seed(&path, &UserStore::new(), &CampgroundStore::new());
        assert!(matches!(result, Err(SeedError::UnknownAuthor { .. })));
        Ok(())
    }
}
