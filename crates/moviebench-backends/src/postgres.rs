//! PostgreSQL adapter for the movie-review workload.
//!
//! Requires a running PostgreSQL instance; the connection target comes from
//! the configured DSN or the DATABASE_URL environment variable. Enable with
//! `--features postgres`.

use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tokio::runtime::Runtime;
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

use crate::fixtures::Dataset;

/// Map a driver error onto the adapter error taxonomy.
fn pg_err(err: sqlx::Error) -> Error {
    match &err {
        sqlx::Error::Database(db)
            if db.is_unique_violation()
                || db.is_foreign_key_violation()
                || db.is_check_violation() =>
        {
            Error::Constraint(err.to_string())
        }
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            Error::Connection(err.to_string())
        }
        _ => Error::Query(err.to_string()),
    }
}

fn user_review_from_row(row: &PgRow) -> Result<UserReview, sqlx::Error> {
    Ok(UserReview {
        id: row.try_get(0)?,
        body: row.try_get(1)?,
        rating: row.try_get(2)?,
        movie: MovieSummary {
            id: row.try_get(3)?,
            image: row.try_get(4)?,
            title: row.try_get(5)?,
            avg_rating: row.try_get(6)?,
        },
    })
}

fn movie_credit_from_row(row: &PgRow) -> Result<MovieCredit, sqlx::Error> {
    Ok(MovieCredit {
        id: row.try_get(0)?,
        full_name: row.try_get(1)?,
        image: row.try_get(2)?,
    })
}

fn movie_review_from_row(row: &PgRow) -> Result<MovieReview, sqlx::Error> {
    Ok(MovieReview {
        id: row.try_get(0)?,
        body: row.try_get(1)?,
        rating: row.try_get(2)?,
        author: UserSummary {
            id: row.try_get(3)?,
            name: row.try_get(4)?,
            image: row.try_get(5)?,
        },
    })
}

fn credited_movie_from_row(row: &PgRow) -> Result<CreditedMovie, sqlx::Error> {
    Ok(CreditedMovie {
        id: row.try_get(0)?,
        image: row.try_get(1)?,
        title: row.try_get(2)?,
        year: row.try_get(3)?,
        avg_rating: row.try_get(4)?,
    })
}

/// PostgreSQL adapter.
///
/// Queries run on a private single-connection pool driven by an owned Tokio
/// runtime, so every call blocks like the other adapters.
pub struct PostgresAdapter {
    pool: PgPool,
    rt: Runtime,
}

impl PostgresAdapter {
    /// Connect using the configured DSN, falling back to DATABASE_URL.
    pub fn connect(cfg: &BenchConfig) -> Result<Self, Error> {
        let url = if cfg.dsn.is_empty() {
            std::env::var("DATABASE_URL").map_err(|_| {
                Error::Connection("no DSN configured and DATABASE_URL not set".to_string())
            })?
        } else {
            cfg.dsn.clone()
        };

        let rt = Runtime::new().map_err(|e| Error::Connection(e.to_string()))?;
        let pool = rt
            .block_on(PgPoolOptions::new().max_connections(1).connect(&url))
            .map_err(|e| Error::Connection(e.to_string()))?;
        info!("connected to postgres");
        Ok(Self { pool, rt })
    }

    /// Create the workload schema (idempotent).
    pub fn setup_schema(&self) -> Result<(), Error> {
        self.rt.block_on(async {
            sqlx::raw_sql(
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
                    creation_time BIGINT NOT NULL,
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
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(pg_err)
        })
    }

    /// Replace all workload rows with the given dataset.
    pub fn populate(&self, data: &Dataset) -> Result<(), Error> {
        self.rt.block_on(async {
            let mut tx = self.pool.begin().await.map_err(pg_err)?;

            for table in [
                "reviews",
                "movie_cast",
                "movie_directors",
                "movies",
                "persons",
                "users",
            ] {
                sqlx::query(&format!("DELETE FROM {}", table))
                    .execute(&mut *tx)
                    .await
                    .map_err(pg_err)?;
            }

            for user in &data.users {
                sqlx::query("INSERT INTO users (id, name, image) VALUES ($1, $2, $3)")
                    .bind(&user.id)
                    .bind(&user.name)
                    .bind(&user.image)
                    .execute(&mut *tx)
                    .await
                    .map_err(pg_err)?;
            }

            for person in &data.people {
                sqlx::query(
                    "INSERT INTO persons (id, full_name, image, bio) VALUES ($1, $2, $3, $4)",
                )
                .bind(&person.id)
                .bind(&person.full_name)
                .bind(&person.image)
                .bind(&person.bio)
                .execute(&mut *tx)
                .await
                .map_err(pg_err)?;
            }

            for movie in &data.movies {
                sqlx::query(
                    "INSERT INTO movies (id, image, title, year, description) VALUES ($1, $2, $3, $4, $5)",
                )
                .bind(&movie.id)
                .bind(&movie.image)
                .bind(&movie.title)
                .bind(movie.year)
                .bind(&movie.description)
                .execute(&mut *tx)
                .await
                .map_err(pg_err)?;

                for (order, person_id) in movie.directors.iter().enumerate() {
                    sqlx::query(
                        "INSERT INTO movie_directors (movie_id, person_id, list_order) VALUES ($1, $2, $3)",
                    )
                    .bind(&movie.id)
                    .bind(person_id)
                    .bind(order as i32)
                    .execute(&mut *tx)
                    .await
                    .map_err(pg_err)?;
                }

                for (order, person_id) in movie.cast.iter().enumerate() {
                    sqlx::query(
                        "INSERT INTO movie_cast (movie_id, person_id, list_order) VALUES ($1, $2, $3)",
                    )
                    .bind(&movie.id)
                    .bind(person_id)
                    .bind(order as i32)
                    .execute(&mut *tx)
                    .await
                    .map_err(pg_err)?;
                }
            }

            for review in &data.reviews {
                sqlx::query(
                    "INSERT INTO reviews (id, body, rating, creation_time, author_id, movie_id)
                     VALUES ($1, $2, $3, $4, $5, $6)",
                )
                .bind(&review.id)
                .bind(&review.body)
                .bind(review.rating)
                .bind(review.creation_time)
                .bind(&review.author_id)
                .bind(&review.movie_id)
                .execute(&mut *tx)
                .await
                .map_err(pg_err)?;
            }

            tx.commit().await.map_err(pg_err)
        })?;

        info!(
            users = data.users.len(),
            people = data.people.len(),
            movies = data.movies.len(),
            reviews = data.reviews.len(),
            "populated postgres database"
        );
        Ok(())
    }

    async fn sample_ids(&self, table: &str, limit: usize) -> Result<Vec<String>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            "SELECT id FROM {} ORDER BY random() LIMIT $1",
            table
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(|row| row.try_get(0)).collect()
    }
}

impl QueryAdapter for PostgresAdapter {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn load_ids(&self, cfg: &BenchConfig) -> Result<IdPool, Error> {
        self.rt.block_on(async {
            let users = self
                .sample_ids("users", cfg.number_of_ids)
                .await
                .map_err(pg_err)?;
            let movies = self
                .sample_ids("movies", cfg.number_of_ids)
                .await
                .map_err(pg_err)?;
            let people = self
                .sample_ids("persons", cfg.number_of_ids)
                .await
                .map_err(pg_err)?;
            debug!(
                users = users.len(),
                movies = movies.len(),
                people = people.len(),
                "sampled benchmark ids"
            );
            Ok(IdPool::build(users, movies, people, cfg.concurrency))
        })
    }

    fn get_user(&self, id: &str) -> Result<String, Error> {
        self.rt.block_on(async {
            let row = sqlx::query("SELECT id, name, image FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(pg_err)?
                .ok_or_else(|| Error::not_found("User", id))?;

            let review_rows = sqlx::query(
                "SELECT r.id, r.body, r.rating, m.id, m.image, m.title,
                        (SELECT AVG(rating)::float8 FROM reviews WHERE movie_id = m.id)
                 FROM reviews r
                 JOIN movies m ON m.id = r.movie_id
                 WHERE r.author_id = $1
                 ORDER BY r.creation_time DESC
                 LIMIT 10",
            )
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(pg_err)?;

            let detail = UserDetail {
                id: row.try_get(0).map_err(pg_err)?,
                name: row.try_get(1).map_err(pg_err)?,
                image: row.try_get(2).map_err(pg_err)?,
                latest_reviews: review_rows
                    .iter()
                    .map(user_review_from_row)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(pg_err)?,
            };
            Ok(serde_json::to_string(&detail)?)
        })
    }

    fn get_movie(&self, id: &str) -> Result<String, Error> {
        self.rt.block_on(async {
            let row = sqlx::query(
                "SELECT id, image, title, year, description,
                        (SELECT AVG(rating)::float8 FROM reviews WHERE movie_id = movies.id)
                 FROM movies WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(pg_err)?
            .ok_or_else(|| Error::not_found("Movie", id))?;

            let director_rows = sqlx::query(
                "SELECT p.id, p.full_name, p.image
                 FROM movie_directors c
                 JOIN persons p ON p.id = c.person_id
                 WHERE c.movie_id = $1
                 ORDER BY c.list_order NULLS LAST, p.full_name",
            )
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(pg_err)?;

            let cast_rows = sqlx::query(
                "SELECT p.id, p.full_name, p.image
                 FROM movie_cast c
                 JOIN persons p ON p.id = c.person_id
                 WHERE c.movie_id = $1
                 ORDER BY c.list_order NULLS LAST, p.full_name",
            )
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(pg_err)?;

            let review_rows = sqlx::query(
                "SELECT r.id, r.body, r.rating, u.id, u.name, u.image
                 FROM reviews r
                 JOIN users u ON u.id = r.author_id
                 WHERE r.movie_id = $1
                 ORDER BY r.creation_time DESC",
            )
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(pg_err)?;

            let detail = MovieDetail {
                id: row.try_get(0).map_err(pg_err)?,
                image: row.try_get(1).map_err(pg_err)?,
                title: row.try_get(2).map_err(pg_err)?,
                year: row.try_get(3).map_err(pg_err)?,
                description: row.try_get(4).map_err(pg_err)?,
                avg_rating: row.try_get(5).map_err(pg_err)?,
                directors: director_rows
                    .iter()
                    .map(movie_credit_from_row)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(pg_err)?,
                cast: cast_rows
                    .iter()
                    .map(movie_credit_from_row)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(pg_err)?,
                reviews: review_rows
                    .iter()
                    .map(movie_review_from_row)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(pg_err)?,
            };
            Ok(serde_json::to_string(&detail)?)
        })
    }

    fn get_person(&self, id: &str) -> Result<String, Error> {
        self.rt.block_on(async {
            let row = sqlx::query("SELECT id, full_name, image, bio FROM persons WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(pg_err)?
                .ok_or_else(|| Error::not_found("Person", id))?;

            let acted_rows = sqlx::query(
                "SELECT m.id, m.image, m.title, m.year,
                        (SELECT AVG(rating)::float8 FROM reviews WHERE movie_id = m.id)
                 FROM movie_cast c
                 JOIN movies m ON m.id = c.movie_id
                 WHERE c.person_id = $1
                 ORDER BY m.year ASC, m.title ASC",
            )
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(pg_err)?;

            let directed_rows = sqlx::query(
                "SELECT m.id, m.image, m.title, m.year,
                        (SELECT AVG(rating)::float8 FROM reviews WHERE movie_id = m.id)
                 FROM movie_directors c
                 JOIN movies m ON m.id = c.movie_id
                 WHERE c.person_id = $1
                 ORDER BY m.year ASC, m.title ASC",
            )
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(pg_err)?;

            let detail = PersonDetail {
                id: row.try_get(0).map_err(pg_err)?,
                full_name: row.try_get(1).map_err(pg_err)?,
                image: row.try_get(2).map_err(pg_err)?,
                bio: row.try_get(3).map_err(pg_err)?,
                acted_in: acted_rows
                    .iter()
                    .map(credited_movie_from_row)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(pg_err)?,
                directed: directed_rows
                    .iter()
                    .map(credited_movie_from_row)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(pg_err)?,
            };
            Ok(serde_json::to_string(&detail)?)
        })
    }

    fn update_movie(&self, id: &str) -> Result<String, Error> {
        self.rt.block_on(async {
            let appended = format!("{}{}", TITLE_SEPARATOR, title_suffix(id));
            let row = sqlx::query(
                "UPDATE movies SET title = title || $2 WHERE id = $1 RETURNING id, title",
            )
            .bind(id)
            .bind(&appended)
            .fetch_optional(&self.pool)
            .await
            .map_err(pg_err)?
            .ok_or_else(|| Error::not_found("Movie", id))?;

            let updated = UpdatedMovie {
                id: row.try_get(0).map_err(pg_err)?,
                title: row.try_get(1).map_err(pg_err)?,
            };
            Ok(serde_json::to_string(&updated)?)
        })
    }

    fn insert_user(&self, seed: &str) -> Result<String, Error> {
        self.rt.block_on(async {
            let (name, image) = synthesize_user(seed);
            let user = InsertedUser {
                id: Uuid::new_v4().to_string(),
                name,
                image,
            };
            sqlx::query("INSERT INTO users (id, name, image) VALUES ($1, $2, $3)")
                .bind(&user.id)
                .bind(&user.name)
                .bind(&user.image)
                .execute(&self.pool)
                .await
                .map_err(pg_err)?;
            Ok(serde_json::to_string(&user)?)
        })
    }

    fn setup(&self, _cfg: &BenchConfig, query: QueryName) -> Result<(), Error> {
        self.rt.block_on(async {
            match query {
                QueryName::UpdateMovie => {
                    let result = sqlx::query(
                        "UPDATE movies
                         SET title = split_part(title, $1, 1)
                         WHERE title LIKE '%' || $1 || '%'",
                    )
                    .bind(TITLE_SEPARATOR)
                    .execute(&self.pool)
                    .await
                    .map_err(pg_err)?;
                    debug!(rows = result.rows_affected(), "stripped update suffixes");
                }
                QueryName::InsertUser => {
                    let result = sqlx::query("DELETE FROM users WHERE name LIKE $1")
                        .bind(format!("{}%", INSERT_PREFIX))
                        .execute(&self.pool)
                        .await
                        .map_err(pg_err)?;
                    debug!(rows = result.rows_affected(), "deleted benchmark insert rows");
                }
                _ => {}
            }
            Ok(())
        })
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
        self.rt.block_on(self.pool.close());
        Ok(())
    }
}
