//! SQLite adapter for the movie-review workload.
//!
//! Runs in-process, so it needs no external service and backs the hermetic
//! test suite. The relational layout matches the PostgreSQL adapter, with
//! association tables carrying the credit billing order.

use rusqlite::{params, Connection};
use tracing::{debug, info};
use uuid::Uuid;

use moviebench_core::records::{
    CreditedMovie, InsertedUser, MovieCredit, MovieDetail, MovieReview, MovieSummary,
    PersonDetail, UpdatedMovie, UserDetail, UserReview, UserSummary,
};
use moviebench_core::{
    synthesize_user, title_suffix, BenchConfig, Error, IdPool, QueryAdapter, QueryName,
    INSERT_PREFIX, TITLE_SEPARATOR,
};

use crate::fixtures::{Dataset, Scale};

/// Map a driver error onto the adapter error taxonomy.
fn sqlite_err(err: rusqlite::Error) -> Error {
    if let rusqlite::Error::SqliteFailure(e, _) = &err {
        if e.code == rusqlite::ErrorCode::ConstraintViolation {
            return Error::Constraint(err.to_string());
        }
    }
    Error::Query(err.to_string())
}

/// Turn the no-rows case of a point read into a typed not-found error.
fn require_row<T>(res: rusqlite::Result<T>, entity: &'static str, id: &str) -> Result<T, Error> {
    match res {
        Ok(value) => Ok(value),
        Err(rusqlite::Error::QueryReturnedNoRows) => Err(Error::not_found(entity, id)),
        Err(err) => Err(sqlite_err(err)),
    }
}

/// SQLite adapter.
pub struct SqliteAdapter {
    conn: Connection,
}

impl SqliteAdapter {
    /// Open a database for the given configuration.
    ///
    /// An empty DSN or `:memory:` opens a fresh in-memory database; anything
    /// else is treated as a file path. The schema is applied idempotently
    /// either way.
    pub fn connect(cfg: &BenchConfig) -> Result<Self, Error> {
        let conn = if cfg.dsn.is_empty() || cfg.dsn == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(&cfg.dsn)
        }
        .map_err(|e| Error::Connection(e.to_string()))?;

        conn.execute_batch("PRAGMA foreign_keys = ON")
            .map_err(sqlite_err)?;

        let adapter = Self { conn };
        adapter.setup_schema()?;
        info!(dsn = %cfg.dsn, "opened sqlite database");
        Ok(adapter)
    }

    /// Create the workload schema (idempotent).
    pub fn setup_schema(&self) -> Result<(), Error> {
        self.conn
            .execute_batch(
                r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                image TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS persons (
                id TEXT PRIMARY KEY,
                full_name TEXT NOT NULL,
                image TEXT NOT NULL,
                bio TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS movies (
                id TEXT PRIMARY KEY,
                image TEXT NOT NULL,
                title TEXT NOT NULL,
                year INTEGER NOT NULL,
                description TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS movie_directors (
                movie_id TEXT NOT NULL REFERENCES movies(id),
                person_id TEXT NOT NULL REFERENCES persons(id),
                list_order INTEGER,
                PRIMARY KEY (movie_id, person_id)
            );

            CREATE TABLE IF NOT EXISTS movie_cast (
                movie_id TEXT NOT NULL REFERENCES movies(id),
                person_id TEXT NOT NULL REFERENCES persons(id),
                list_order INTEGER,
                PRIMARY KEY (movie_id, person_id)
            );

            CREATE TABLE IF NOT EXISTS reviews (
                id TEXT PRIMARY KEY,
                body TEXT NOT NULL,
                rating INTEGER NOT NULL,
                creation_time INTEGER NOT NULL,
                author_id TEXT NOT NULL REFERENCES users(id),
                movie_id TEXT NOT NULL REFERENCES movies(id)
            );

            CREATE INDEX IF NOT EXISTS idx_reviews_author ON reviews(author_id);
            CREATE INDEX IF NOT EXISTS idx_reviews_movie ON reviews(movie_id);
            CREATE INDEX IF NOT EXISTS idx_directors_person ON movie_directors(person_id);
            CREATE INDEX IF NOT EXISTS idx_cast_person ON movie_cast(person_id);
            CREATE INDEX IF NOT EXISTS idx_users_name ON users(name);
            "#,
            )
            .map_err(sqlite_err)
    }

    /// Replace the database contents with the given dataset, in one
    /// transaction.
    pub fn populate(&mut self, data: &Dataset) -> Result<(), Error> {
        self.populate_inner(data).map_err(sqlite_err)?;
        info!(
            users = data.users.len(),
            people = data.people.len(),
            movies = data.movies.len(),
            reviews = data.reviews.len(),
            "populated sqlite database"
        );
        Ok(())
    }

    fn populate_inner(&mut self, data: &Dataset) -> rusqlite::Result<()> {
        let tx = self.conn.transaction()?;
        // Children before parents, for the foreign keys.
        for table in [
            "reviews",
            "movie_cast",
            "movie_directors",
            "movies",
            "persons",
            "users",
        ] {
            tx.execute(&format!("DELETE FROM {}", table), [])?;
        }
        {
            let mut stmt =
                tx.prepare("INSERT INTO users (id, name, image) VALUES (?1, ?2, ?3)")?;
            for user in &data.users {
                stmt.execute(params![user.id, user.name, user.image])?;
            }
        }
        {
            let mut stmt = tx
                .prepare("INSERT INTO persons (id, full_name, image, bio) VALUES (?1, ?2, ?3, ?4)")?;
            for person in &data.people {
                stmt.execute(params![person.id, person.full_name, person.image, person.bio])?;
            }
        }
        {
            let mut movie_stmt = tx.prepare(
                "INSERT INTO movies (id, image, title, year, description) VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            let mut director_stmt = tx.prepare(
                "INSERT INTO movie_directors (movie_id, person_id, list_order) VALUES (?1, ?2, ?3)",
            )?;
            let mut cast_stmt = tx.prepare(
                "INSERT INTO movie_cast (movie_id, person_id, list_order) VALUES (?1, ?2, ?3)",
            )?;
            for movie in &data.movies {
                movie_stmt.execute(params![
                    movie.id,
                    movie.image,
                    movie.title,
                    movie.year,
                    movie.description
                ])?;
                for (order, person_id) in movie.directors.iter().enumerate() {
                    director_stmt.execute(params![movie.id, person_id, order as i32])?;
                }
                for (order, person_id) in movie.cast.iter().enumerate() {
                    cast_stmt.execute(params![movie.id, person_id, order as i32])?;
                }
            }
        }
        {
            let mut stmt = tx.prepare(
                "INSERT INTO reviews (id, body, rating, creation_time, author_id, movie_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for review in &data.reviews {
                stmt.execute(params![
                    review.id,
                    review.body,
                    review.rating,
                    review.creation_time,
                    review.author_id,
                    review.movie_id
                ])?;
            }
        }
        tx.commit()
    }

    /// Create an in-memory adapter with generated data at the given scale.
    pub fn with_scale(scale: Scale) -> Result<Self, Error> {
        let mut adapter = Self::connect(&BenchConfig::sqlite_in_memory())?;
        adapter.populate(&Dataset::generate(scale))?;
        Ok(adapter)
    }

    // -------------------------------------------------------------------------
    // Query helpers
    // -------------------------------------------------------------------------

    fn sample_ids(&self, table: &str, limit: usize) -> rusqlite::Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT id FROM {} ORDER BY random() LIMIT ?1", table))?;
        let rows = stmt.query_map([limit as i64], |row| row.get(0))?;
        rows.collect()
    }

    fn user_reviews(&self, user_id: &str) -> rusqlite::Result<Vec<UserReview>> {
        let mut stmt = self.conn.prepare(
            "SELECT r.id, r.body, r.rating, m.id, m.image, m.title,
                    (SELECT AVG(rating) FROM reviews WHERE movie_id = m.id)
             FROM reviews r
             JOIN movies m ON m.id = r.movie_id
             WHERE r.author_id = ?1
             ORDER BY r.creation_time DESC
             LIMIT 10",
        )?;
        let rows = stmt.query_map([user_id], |row| {
            Ok(UserReview {
                id: row.get(0)?,
                body: row.get(1)?,
                rating: row.get(2)?,
                movie: MovieSummary {
                    id: row.get(3)?,
                    image: row.get(4)?,
                    title: row.get(5)?,
                    avg_rating: row.get(6)?,
                },
            })
        })?;
        rows.collect()
    }

    fn movie_credits(&self, movie_id: &str, table: &str) -> rusqlite::Result<Vec<MovieCredit>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT p.id, p.full_name, p.image
             FROM {} c
             JOIN persons p ON p.id = c.person_id
             WHERE c.movie_id = ?1
             ORDER BY c.list_order NULLS LAST, p.full_name",
            table
        ))?;
        let rows = stmt.query_map([movie_id], |row| {
            Ok(MovieCredit {
                id: row.get(0)?,
                full_name: row.get(1)?,
                image: row.get(2)?,
            })
        })?;
        rows.collect()
    }

    fn movie_reviews(&self, movie_id: &str) -> rusqlite::Result<Vec<MovieReview>> {
        let mut stmt = self.conn.prepare(
            "SELECT r.id, r.body, r.rating, u.id, u.name, u.image
             FROM reviews r
             JOIN users u ON u.id = r.author_id
             WHERE r.movie_id = ?1
             ORDER BY r.creation_time DESC",
        )?;
        let rows = stmt.query_map([movie_id], |row| {
            Ok(MovieReview {
                id: row.get(0)?,
                body: row.get(1)?,
                rating: row.get(2)?,
                author: UserSummary {
                    id: row.get(3)?,
                    name: row.get(4)?,
                    image: row.get(5)?,
                },
            })
        })?;
        rows.collect()
    }

    fn filmography(&self, person_id: &str, table: &str) -> rusqlite::Result<Vec<CreditedMovie>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT m.id, m.image, m.title, m.year,
                    (SELECT AVG(rating) FROM reviews WHERE movie_id = m.id)
             FROM {} c
             JOIN movies m ON m.id = c.movie_id
             WHERE c.person_id = ?1
             ORDER BY m.year ASC, m.title ASC",
            table
        ))?;
        let rows = stmt.query_map([person_id], |row| {
            Ok(CreditedMovie {
                id: row.get(0)?,
                image: row.get(1)?,
                title: row.get(2)?,
                year: row.get(3)?,
                avg_rating: row.get(4)?,
            })
        })?;
        rows.collect()
    }
}

impl QueryAdapter for SqliteAdapter {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn load_ids(&self, cfg: &BenchConfig) -> Result<IdPool, Error> {
        let users = self
            .sample_ids("users", cfg.number_of_ids)
            .map_err(sqlite_err)?;
        let movies = self
            .sample_ids("movies", cfg.number_of_ids)
            .map_err(sqlite_err)?;
        let people = self
            .sample_ids("persons", cfg.number_of_ids)
            .map_err(sqlite_err)?;
        debug!(
            users = users.len(),
            movies = movies.len(),
            people = people.len(),
            "sampled benchmark ids"
        );
        Ok(IdPool::build(users, movies, people, cfg.concurrency))
    }

    fn get_user(&self, id: &str) -> Result<String, Error> {
        let (user_id, name, image) = require_row(
            self.conn.query_row(
                "SELECT id, name, image FROM users WHERE id = ?1",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            ),
            "User",
            id,
        )?;
        let detail = UserDetail {
            id: user_id,
            name,
            image,
            latest_reviews: self.user_reviews(id).map_err(sqlite_err)?,
        };
        Ok(serde_json::to_string(&detail)?)
    }

    fn get_movie(&self, id: &str) -> Result<String, Error> {
        let (movie_id, image, title, year, description, avg_rating) = require_row(
            self.conn.query_row(
                "SELECT id, image, title, year, description,
                        (SELECT AVG(rating) FROM reviews WHERE movie_id = movies.id)
                 FROM movies WHERE id = ?1",
                [id],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                },
            ),
            "Movie",
            id,
        )?;
        let detail = MovieDetail {
            id: movie_id,
            image,
            title,
            year,
            description,
            avg_rating,
            directors: self.movie_credits(id, "movie_directors").map_err(sqlite_err)?,
            cast: self.movie_credits(id, "movie_cast").map_err(sqlite_err)?,
            reviews: self.movie_reviews(id).map_err(sqlite_err)?,
        };
        Ok(serde_json::to_string(&detail)?)
    }

    fn get_person(&self, id: &str) -> Result<String, Error> {
        let (person_id, full_name, image, bio) = require_row(
            self.conn.query_row(
                "SELECT id, full_name, image, bio FROM persons WHERE id = ?1",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            ),
            "Person",
            id,
        )?;
        let detail = PersonDetail {
            id: person_id,
            full_name,
            image,
            bio,
            acted_in: self.filmography(id, "movie_cast").map_err(sqlite_err)?,
            directed: self.filmography(id, "movie_directors").map_err(sqlite_err)?,
        };
        Ok(serde_json::to_string(&detail)?)
    }

    fn update_movie(&self, id: &str) -> Result<String, Error> {
        let appended = format!("{}{}", TITLE_SEPARATOR, title_suffix(id));
        let updated = require_row(
            self.conn.query_row(
                "UPDATE movies SET title = title || ?2 WHERE id = ?1 RETURNING id, title",
                params![id, appended],
                |row| {
                    Ok(UpdatedMovie {
                        id: row.get(0)?,
                        title: row.get(1)?,
                    })
                },
            ),
            "Movie",
            id,
        )?;
        Ok(serde_json::to_string(&updated)?)
    }

    fn insert_user(&self, seed: &str) -> Result<String, Error> {
        let (name, image) = synthesize_user(seed);
        let user = InsertedUser {
            id: Uuid::new_v4().to_string(),
            name,
            image,
        };
        self.conn
            .execute(
                "INSERT INTO users (id, name, image) VALUES (?1, ?2, ?3)",
                params![user.id, user.name, user.image],
            )
            .map_err(sqlite_err)?;
        Ok(serde_json::to_string(&user)?)
    }

    fn setup(&self, _cfg: &BenchConfig, query: QueryName) -> Result<(), Error> {
        match query {
            QueryName::UpdateMovie => {
                let stripped = self
                    .conn
                    .execute(
                        "UPDATE movies
                         SET title = substr(title, 1, instr(title, ?1) - 1)
                         WHERE title LIKE '%' || ?1 || '%'",
                        [TITLE_SEPARATOR],
                    )
                    .map_err(sqlite_err)?;
                debug!(rows = stripped, "stripped update suffixes");
            }
            QueryName::InsertUser => {
                let deleted = self
                    .conn
                    .execute(
                        "DELETE FROM users WHERE name LIKE ?1",
                        [format!("{}%", INSERT_PREFIX)],
                    )
                    .map_err(sqlite_err)?;
                debug!(rows = deleted, "deleted benchmark insert rows");
            }
            _ => {}
        }
        Ok(())
    }

    fn cleanup(&self, cfg: &BenchConfig, query: QueryName) -> Result<(), Error> {
        // Mutation cleanup is the same reset as setup.
        if query.is_mutation() {
            self.setup(cfg, query)
        } else {
            Ok(())
        }
    }

    fn close(&mut self) -> Result<(), Error> {
        // The connection closes on drop.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_adapter_basic() {
        let adapter = SqliteAdapter::with_scale(Scale::Tiny).unwrap();
        let cfg = BenchConfig::sqlite_in_memory().with_number_of_ids(5);
        let pool = adapter.load_ids(&cfg).unwrap();
        assert_eq!(pool.get(QueryName::GetUser).len(), 5);
        assert_eq!(pool.get(QueryName::GetMovie).len(), 5);
    }

    #[test]
    fn test_sqlite_get_movie_shape() {
        let adapter = SqliteAdapter::with_scale(Scale::Tiny).unwrap();
        let cfg = BenchConfig::sqlite_in_memory().with_number_of_ids(1);
        let pool = adapter.load_ids(&cfg).unwrap();
        let id = &pool.get(QueryName::GetMovie)[0];

        let raw = adapter.get_movie(id).unwrap();
        let movie: MovieDetail = serde_json::from_str(&raw).unwrap();
        assert_eq!(movie.id, *id);
        assert!(!movie.directors.is_empty());
    }

    #[test]
    fn test_sqlite_missing_row_is_not_found() {
        let adapter = SqliteAdapter::with_scale(Scale::Tiny).unwrap();
        let err = adapter.get_user("no-such-id").unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
