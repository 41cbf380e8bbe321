use sqlx::SqliteExecutor;

#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct MovieRow {
    pub id: String,
    pub library_id: String,
    pub title: String,
    pub original_title: String,
    pub year: i64,
    pub overview: Option<String>,
    pub runtime_min: i64,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub created_ts: i64,
    pub updated_ts: i64,
}

/// Look up a movie by its identity key `(library, title, year)`.
pub async fn find_movie<'e, E>(
    exec: E,
    library_id: &str,
    title: &str,
    year: i64,
) -> Result<Option<MovieRow>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as(
        "SELECT id, library_id, title, original_title, year, overview, runtime_min, \
         poster_path, backdrop_path, created_ts, updated_ts \
         FROM movie WHERE library_id = ? AND title = ? AND year = ?",
    )
    .bind(library_id)
    .bind(title)
    .bind(year)
    .fetch_optional(exec)
    .await
}

/// Insert a movie seeded from the scanner. Enrichable fields start empty.
pub async fn create_movie<'e, E>(
    exec: E,
    library_id: &str,
    title: &str,
    year: i64,
    runtime_min: i64,
) -> Result<MovieRow, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        "INSERT INTO movie (id, library_id, title, original_title, year, runtime_min, \
         created_ts, updated_ts) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(library_id)
    .bind(title)
    .bind(title)
    .bind(year)
    .bind(runtime_min)
    .bind(now)
    .bind(now)
    .execute(exec)
    .await?;

    Ok(MovieRow {
        id,
        library_id: library_id.to_string(),
        title: title.to_string(),
        original_title: title.to_string(),
        year,
        overview: None,
        runtime_min,
        poster_path: None,
        backdrop_path: None,
        created_ts: now,
        updated_ts: now,
    })
}

pub async fn get_movie<'e, E>(exec: E, movie_id: &str) -> Result<Option<MovieRow>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as(
        "SELECT id, library_id, title, original_title, year, overview, runtime_min, \
         poster_path, backdrop_path, created_ts, updated_ts FROM movie WHERE id = ?",
    )
    .bind(movie_id)
    .fetch_optional(exec)
    .await
}

pub async fn list_movies<'e, E>(exec: E, library_id: &str) -> Result<Vec<MovieRow>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as(
        "SELECT id, library_id, title, original_title, year, overview, runtime_min, \
         poster_path, backdrop_path, created_ts, updated_ts \
         FROM movie WHERE library_id = ? ORDER BY title, year",
    )
    .bind(library_id)
    .fetch_all(exec)
    .await
}
