//! Test data generation for the movie-review workload.
//!
//! This module provides consistent data generators for benchmark reproducibility.
//! Generated names never carry the reserved insert marker and titles never
//! contain the update separator, so mutation resets only touch benchmark rows.

use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

/// Scale factor for benchmark data generation.
#[derive(Clone, Copy, Debug)]
pub enum Scale {
    /// Tiny scale: a handful of rows per type.
    /// Use for quick tests and development iteration.
    Tiny,
    /// Small scale: ~100 rows per type.
    Small,
    /// Medium scale: ~2,000 rows per type.
    Medium,
    /// Large scale: ~25,000 rows per type.
    Large,
}

impl Scale {
    /// Get the user count for this scale.
    pub fn users(&self) -> usize {
        match self {
            Scale::Tiny => 10,
            Scale::Small => 100,
            Scale::Medium => 2_000,
            Scale::Large => 25_000,
        }
    }

    /// Get the movie count for this scale.
    pub fn movies(&self) -> usize {
        match self {
            Scale::Tiny => 8,
            Scale::Small => 80,
            Scale::Medium => 1_500,
            Scale::Large => 20_000,
        }
    }

    /// Get the person count for this scale.
    pub fn people(&self) -> usize {
        match self {
            Scale::Tiny => 12,
            Scale::Small => 120,
            Scale::Medium => 2_500,
            Scale::Large => 30_000,
        }
    }

    /// Get the reviews-per-user ratio.
    pub fn reviews_per_user(&self) -> usize {
        match self {
            Scale::Tiny => 2,
            Scale::Small => 3,
            Scale::Medium => 3,
            Scale::Large => 4,
        }
    }
}

impl Default for Scale {
    fn default() -> Self {
        Scale::Medium
    }
}

/// User row data for population.
#[derive(Debug, Clone)]
pub struct UserData {
    pub id: String,
    pub name: String,
    pub image: String,
}

/// Person row data for population.
#[derive(Debug, Clone)]
pub struct PersonData {
    pub id: String,
    pub full_name: String,
    pub image: String,
    pub bio: String,
}

/// Movie row data for population.
///
/// Credit lists are ordered; the position of a person id is its billing
/// order (`list_order`) in the corresponding join table.
#[derive(Debug, Clone)]
pub struct MovieData {
    pub id: String,
    pub image: String,
    pub title: String,
    pub year: i32,
    pub description: String,
    pub directors: Vec<String>,
    pub cast: Vec<String>,
}

/// Review row data for population.
#[derive(Debug, Clone)]
pub struct ReviewData {
    pub id: String,
    pub body: String,
    pub rating: i32,
    pub creation_time: i64,
    pub author_id: String,
    pub movie_id: String,
}

/// Generate a deterministic id from seed and index.
///
/// The seed occupies the high bits so the id spaces of the entity types
/// stay disjoint no matter how many rows each generates.
fn generate_id(seed: u64, index: usize) -> String {
    let mut rng = StdRng::seed_from_u64((seed << 32) | index as u64);
    let mut bytes = [0u8; 16];
    rng.fill(&mut bytes);
    Uuid::from_bytes(bytes).to_string()
}

/// Generate a random string of specified length.
fn random_string(rng: &mut StdRng, len: usize) -> String {
    (0..len).map(|_| rng.sample(Alphanumeric) as char).collect()
}

/// Generate User rows with distinct names.
pub fn generate_users(count: usize) -> Vec<UserData> {
    const SEED: u64 = 20011;

    let name_prefixes = [
        "Alice", "Bob", "Charlie", "David", "Eve", "Frank", "Grace", "Henry", "Ivy", "Jack",
    ];

    (0..count)
        .map(|i| {
            let name = format!("{}_{}", name_prefixes[i % name_prefixes.len()], i);
            let image = format!("image_{}", name);
            UserData {
                id: generate_id(SEED, i),
                name,
                image,
            }
        })
        .collect()
}

/// Generate Person rows with full names and bios.
pub fn generate_people(count: usize) -> Vec<PersonData> {
    const SEED: u64 = 20021;
    let mut rng = StdRng::seed_from_u64(SEED);

    let first_names = [
        "Ava", "Ben", "Clara", "Dmitri", "Elena", "Felix", "Greta", "Hugo", "Ines", "Jonas",
    ];
    let last_names = [
        "Archer", "Bishop", "Castillo", "Duval", "Eriksen", "Fontaine", "Gallo", "Hale",
    ];

    (0..count)
        .map(|i| {
            let first = first_names[i % first_names.len()];
            let last = last_names[(i / first_names.len()) % last_names.len()];
            let full_name = format!("{} {} {}", first, last, i);
            let bio = random_string(&mut rng, 120);
            PersonData {
                id: generate_id(SEED, i),
                full_name,
                image: format!("image_person_{}", i),
                bio,
            }
        })
        .collect()
}

/// Generate Movie rows with ordered credits drawn from the given people.
pub fn generate_movies(count: usize, person_ids: &[String]) -> Vec<MovieData> {
    const SEED: u64 = 20031;
    let mut rng = StdRng::seed_from_u64(SEED);

    let adjectives = [
        "Silent", "Golden", "Broken", "Hidden", "Crimson", "Distant", "Electric", "Faded",
    ];
    let nouns = [
        "Harbor", "River", "Empire", "Garden", "Signal", "Mirror", "Summit", "Voyage",
    ];

    (0..count)
        .map(|i| {
            let title = format!(
                "{} {} {}",
                adjectives[i % adjectives.len()],
                nouns[(i / adjectives.len()) % nouns.len()],
                i
            );
            let year = 1950 + (i % 70) as i32;
            let description = random_string(&mut rng, 160);
            let directors: Vec<String> = person_ids
                .choose_multiple(&mut rng, 1 + i % 2)
                .cloned()
                .collect();
            let cast: Vec<String> = person_ids
                .choose_multiple(&mut rng, 3 + i % 3)
                .cloned()
                .collect();

            MovieData {
                id: generate_id(SEED, i),
                image: format!("image_movie_{}", i),
                title,
                year,
                description,
                directors,
                cast,
            }
        })
        .collect()
}

/// Generate Review rows with foreign keys to Users and Movies.
///
/// Creation times are strictly increasing with the index, so "latest"
/// orderings are well defined without ties.
pub fn generate_reviews(count: usize, user_ids: &[String], movie_ids: &[String]) -> Vec<ReviewData> {
    const SEED: u64 = 20041;
    const EPOCH: i64 = 1_600_000_000;
    let mut rng = StdRng::seed_from_u64(SEED);

    (0..count)
        .map(|i| {
            let body = random_string(&mut rng, 100);
            let rating = rng.gen_range(0..=5);
            ReviewData {
                id: generate_id(SEED, i),
                body,
                rating,
                creation_time: EPOCH + i as i64,
                author_id: user_ids[i % user_ids.len()].clone(),
                movie_id: movie_ids[i % movie_ids.len()].clone(),
            }
        })
        .collect()
}

/// Complete dataset for one population pass.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub users: Vec<UserData>,
    pub people: Vec<PersonData>,
    pub movies: Vec<MovieData>,
    pub reviews: Vec<ReviewData>,
}

impl Dataset {
    /// Small handcrafted dataset with known derived values, for tests and
    /// demos.
    ///
    /// - movie `m1` (1999): directed by `p2`, cast `[p3, p1]` in that billing
    ///   order, three reviews averaging 11/3
    /// - movie `m2` (1984): directed by `p1`, cast `[p2, p1]`, no reviews
    /// - movie `m3` (2010): directed by `p3`, cast `[p2]`, twelve reviews by
    ///   the second user
    pub fn demo() -> Self {
        fn user(id: &str, name: &str) -> UserData {
            UserData {
                id: id.to_string(),
                name: name.to_string(),
                image: format!("image_{}", name),
            }
        }
        fn person(id: &str, full_name: &str) -> PersonData {
            PersonData {
                id: id.to_string(),
                full_name: full_name.to_string(),
                image: format!("image_{}", id),
                bio: format!("bio of {}", full_name),
            }
        }
        fn movie(
            id: &str,
            title: &str,
            year: i32,
            directors: &[&str],
            cast: &[&str],
        ) -> MovieData {
            MovieData {
                id: id.to_string(),
                image: format!("image_{}", id),
                title: title.to_string(),
                year,
                description: format!("desc {}", id),
                directors: directors.iter().map(|s| s.to_string()).collect(),
                cast: cast.iter().map(|s| s.to_string()).collect(),
            }
        }
        fn review(id: &str, rating: i32, creation_time: i64, author: &str, movie: &str) -> ReviewData {
            ReviewData {
                id: id.to_string(),
                body: format!("review {}", id),
                rating,
                creation_time,
                author_id: author.to_string(),
                movie_id: movie.to_string(),
            }
        }

        let mut reviews = vec![
            review("r1", 5, 100, "u1", "m1"),
            review("r2", 2, 200, "u1", "m1"),
            review("r3", 4, 300, "u2", "m1"),
        ];
        for i in 0..12 {
            reviews.push(review(&format!("rb{}", i), 3, 1_000 + i as i64, "u2", "m3"));
        }

        Self {
            users: vec![user("u1", "Alice"), user("u2", "Bob")],
            people: vec![
                person("p1", "Nora Quinn"),
                person("p2", "Abel Reyes"),
                person("p3", "Zoe Park"),
            ],
            movies: vec![
                movie("m1", "First Light", 1999, &["p2"], &["p3", "p1"]),
                movie("m2", "Second Wind", 1984, &["p1"], &["p2", "p1"]),
                movie("m3", "Third Act", 2010, &["p3"], &["p2"]),
            ],
            reviews,
        }
    }

    /// Generate the full workload dataset at the given scale.
    pub fn generate(scale: Scale) -> Self {
        let users = generate_users(scale.users());
        let people = generate_people(scale.people());

        let person_ids: Vec<String> = people.iter().map(|p| p.id.clone()).collect();
        let movies = generate_movies(scale.movies(), &person_ids);

        let user_ids: Vec<String> = users.iter().map(|u| u.id.clone()).collect();
        let movie_ids: Vec<String> = movies.iter().map(|m| m.id.clone()).collect();
        let reviews = generate_reviews(
            scale.users() * scale.reviews_per_user(),
            &user_ids,
            &movie_ids,
        );

        Self {
            users,
            people,
            movies,
            reviews,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moviebench_core::{INSERT_PREFIX, TITLE_SEPARATOR};

    #[test]
    fn test_generation_is_deterministic() {
        let a = Dataset::generate(Scale::Tiny);
        let b = Dataset::generate(Scale::Tiny);
        let ids_a: Vec<&str> = a.movies.iter().map(|m| m.id.as_str()).collect();
        let ids_b: Vec<&str> = b.movies.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids_a, ids_b);
        assert_eq!(a.movies[0].title, b.movies[0].title);
    }

    #[test]
    fn test_titles_never_contain_separator() {
        let data = Dataset::generate(Scale::Small);
        assert!(data.movies.iter().all(|m| !m.title.contains(TITLE_SEPARATOR)));
    }

    #[test]
    fn test_names_avoid_insert_marker() {
        let data = Dataset::generate(Scale::Small);
        assert!(data.users.iter().all(|u| !u.name.starts_with(INSERT_PREFIX)));
    }

    #[test]
    fn test_ids_are_unique_across_entity_types() {
        let data = Dataset::generate(Scale::Tiny);
        let mut all: Vec<&str> = data
            .users
            .iter()
            .map(|u| u.id.as_str())
            .chain(data.people.iter().map(|p| p.id.as_str()))
            .chain(data.movies.iter().map(|m| m.id.as_str()))
            .chain(data.reviews.iter().map(|r| r.id.as_str()))
            .collect();
        let total = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), total);
    }

    #[test]
    fn test_tiny_dataset_shape() {
        let data = Dataset::generate(Scale::Tiny);
        assert_eq!(data.users.len(), Scale::Tiny.users());
        assert_eq!(data.movies.len(), Scale::Tiny.movies());
        assert_eq!(data.people.len(), Scale::Tiny.people());
        assert!(data.movies.iter().all(|m| !m.directors.is_empty()));
        assert!(data.movies.iter().all(|m| m.cast.len() >= 3));

        let times: Vec<i64> = data.reviews.iter().map(|r| r.creation_time).collect();
        assert!(times.windows(2).all(|w| w[0] < w[1]));
    }
}
