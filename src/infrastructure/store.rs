use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection};
use serde::Serialize;
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to prepare database directory {path}: {source}")]
    Prepare {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to open database at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("database error: {0}")]
    Sql(#[from] rusqlite::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Person {
    pub id: i64,
    pub name: String,
    pub age: i64,
    pub profession: String,
    pub created_at: String,
}

/// Typed filters compiled into a parameterized SELECT. `max_age` is an
/// exclusive upper bound ("younger than"), `min_age` inclusive.
#[derive(Debug, Clone, Default)]
pub struct PersonFilter {
    pub min_age: Option<i64>,
    pub max_age: Option<i64>,
    pub profession: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub not_null: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableInfo {
    pub table_name: String,
    pub columns: Vec<ColumnInfo>,
    pub record_count: i64,
}

/// SQLite-backed people roster. All statements are parameterized; raw
/// query text from callers is never executed.
pub struct PeopleStore {
    conn: Mutex<Connection>,
}

impl PeopleStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| StoreError::Prepare {
                    path: parent.display().to_string(),
                    source,
                })?;
            }
        }
        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.display().to_string(),
            source,
        })?;
        info!(path = %path.display(), "Opened people database");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("people store lock");
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS people (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                age INTEGER NOT NULL,
                profession TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
            [],
        )?;
        Ok(())
    }

    pub fn insert_person(
        &self,
        name: &str,
        age: i64,
        profession: &str,
    ) -> Result<i64, StoreError> {
        let conn = self.conn.lock().expect("people store lock");
        conn.execute(
            "INSERT INTO people (name, age, profession) VALUES (?1, ?2, ?3)",
            params![name, age, profession],
        )?;
        let id = conn.last_insert_rowid();
        debug!(id, name, "Inserted person");
        Ok(id)
    }

    pub fn query_people(&self, filter: &PersonFilter) -> Result<Vec<Person>, StoreError> {
        let mut sql =
            String::from("SELECT id, name, age, profession, created_at FROM people");
        let mut clauses: Vec<&str> = Vec::new();
        let mut binds: Vec<SqlValue> = Vec::new();
        if let Some(min_age) = filter.min_age {
            clauses.push("age >= ?");
            binds.push(SqlValue::Integer(min_age));
        }
        if let Some(max_age) = filter.max_age {
            clauses.push("age < ?");
            binds.push(SqlValue::Integer(max_age));
        }
        if let Some(profession) = &filter.profession {
            clauses.push("profession = ?");
            binds.push(SqlValue::Text(profession.clone()));
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY id");
        if let Some(limit) = filter.limit {
            sql.push_str(" LIMIT ?");
            binds.push(SqlValue::Integer(limit));
        }

        let conn = self.conn.lock().expect("people store lock");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(binds), |row| {
            Ok(Person {
                id: row.get(0)?,
                name: row.get(1)?,
                age: row.get(2)?,
                profession: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    pub fn count_people(&self) -> Result<i64, StoreError> {
        let conn = self.conn.lock().expect("people store lock");
        let count = conn.query_row("SELECT COUNT(*) FROM people", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn table_info(&self) -> Result<TableInfo, StoreError> {
        let conn = self.conn.lock().expect("people store lock");
        let mut stmt = conn.prepare("PRAGMA table_info(people)")?;
        let columns = stmt
            .query_map([], |row| {
                Ok(ColumnInfo {
                    name: row.get(1)?,
                    data_type: row.get(2)?,
                    not_null: row.get::<_, i64>(3)? != 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        let record_count =
            conn.query_row("SELECT COUNT(*) FROM people", [], |row| row.get(0))?;
        Ok(TableInfo {
            table_name: "people".to_string(),
            columns,
            record_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_init_is_idempotent_across_reopens() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("roster.db");

        let store = PeopleStore::open(&path).expect("first open");
        store
            .insert_person("Ada Lovelace", 36, "Mathematician")
            .expect("insert");
        drop(store);

        let reopened = PeopleStore::open(&path).expect("second open");
        assert_eq!(reopened.count_people().expect("count"), 1);
    }

    #[test]
    fn replayed_insert_applies_twice() {
        let store = PeopleStore::open_in_memory().expect("open");
        store
            .insert_person("Jane Doe", 32, "Data Scientist")
            .expect("first insert");
        store
            .insert_person("Jane Doe", 32, "Data Scientist")
            .expect("second insert");

        assert_eq!(store.count_people().expect("count"), 2);
    }

    #[test]
    fn max_age_filter_is_exclusive() {
        let store = PeopleStore::open_in_memory().expect("open");
        store.insert_person("Alice", 25, "Developer").expect("insert");
        store.insert_person("Bob", 30, "Engineer").expect("insert");
        store.insert_person("Carol", 40, "Manager").expect("insert");

        let filter = PersonFilter {
            max_age: Some(30),
            ..PersonFilter::default()
        };
        let people = store.query_people(&filter).expect("query");
        let names: Vec<_> = people.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Alice"]);
    }

    #[test]
    fn combined_filters_and_limit() {
        let store = PeopleStore::open_in_memory().expect("open");
        store.insert_person("Alice", 25, "Developer").expect("insert");
        store.insert_person("Dana", 28, "Developer").expect("insert");
        store.insert_person("Erin", 29, "Developer").expect("insert");
        store.insert_person("Bob", 27, "Engineer").expect("insert");

        let filter = PersonFilter {
            min_age: Some(26),
            profession: Some("Developer".into()),
            limit: Some(1),
            ..PersonFilter::default()
        };
        let people = store.query_people(&filter).expect("query");
        assert_eq!(people.len(), 1);
        assert_eq!(people[0].name, "Dana");
    }

    #[test]
    fn table_info_reports_schema_and_count() {
        let store = PeopleStore::open_in_memory().expect("open");
        store.insert_person("Alice", 25, "Developer").expect("insert");

        let info = store.table_info().expect("table info");
        assert_eq!(info.table_name, "people");
        assert_eq!(info.record_count, 1);
        let names: Vec<_> = info.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["id", "name", "age", "profession", "created_at"]
        );
    }
}
