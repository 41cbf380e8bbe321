use cinedex_core::types::LibraryKind;
use sqlx::SqliteExecutor;

#[derive(Debug, Clone, serde::Serialize)]
pub struct LibraryRow {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub path: String,
    pub created_ts: i64,
    pub updated_ts: i64,
}

impl LibraryRow {
    /// Parsed library kind; `None` when the column holds an unknown tag.
    pub fn kind(&self) -> Option<LibraryKind> {
        LibraryKind::parse(&self.kind)
    }
}

type LibraryTuple = (String, String, String, String, i64, i64);

pub async fn create_library<'e, E>(
    exec: E,
    name: &str,
    kind: LibraryKind,
    path: &str,
) -> Result<LibraryRow, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        "INSERT INTO library (id, name, kind, path, created_ts, updated_ts) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(name)
    .bind(kind.as_str())
    .bind(path)
    .bind(now)
    .bind(now)
    .execute(exec)
    .await?;

    Ok(LibraryRow {
        id,
        name: name.to_string(),
        kind: kind.as_str().to_string(),
        path: path.to_string(),
        created_ts: now,
        updated_ts: now,
    })
}

pub async fn list_libraries<'e, E>(exec: E) -> Result<Vec<LibraryRow>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let rows: Vec<LibraryTuple> = sqlx::query_as(
        "SELECT id, name, kind, path, created_ts, updated_ts FROM library ORDER BY name",
    )
    .fetch_all(exec)
    .await?;

    Ok(rows.into_iter().map(row_to_library).collect())
}

pub async fn get_library<'e, E>(exec: E, library_id: &str) -> Result<Option<LibraryRow>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let row: Option<LibraryTuple> = sqlx::query_as(
        "SELECT id, name, kind, path, created_ts, updated_ts FROM library WHERE id = ?",
    )
    .bind(library_id)
    .fetch_optional(exec)
    .await?;

    Ok(row.map(row_to_library))
}

/// Rename a library. Returns `false` when the library does not exist.
pub async fn update_library<'e, E>(
    exec: E,
    library_id: &str,
    name: &str,
) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let now = chrono::Utc::now().timestamp();
    let result = sqlx::query("UPDATE library SET name = ?, updated_ts = ? WHERE id = ?")
        .bind(name)
        .bind(now)
        .bind(library_id)
        .execute(exec)
        .await?;
    Ok(result.rows_affected() > 0)
}

fn row_to_library(r: LibraryTuple) -> LibraryRow {
    LibraryRow {
        id: r.0,
        name: r.1,
        kind: r.2,
        path: r.3,
        created_ts: r.4,
        updated_ts: r.5,
    }
}
