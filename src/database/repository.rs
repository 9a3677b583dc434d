use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};

use crate::database::manager::DatabaseError;
use crate::database::record::{Changes, FieldValue};

/// A row type stored in a single table with a text `id` primary key.
pub trait Entity: for<'r> FromRow<'r, SqliteRow> + Send + Unpin {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];
}

/// Offset pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: i64,
    pub limit: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self { skip: 0, limit: 100 }
    }
}

/// Generic table access. Every method runs on a caller-supplied connection so
/// that services decide the transaction boundaries.
pub struct Repository<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T: Entity> Repository<T> {
    fn select_sql() -> String {
        format!("SELECT {} FROM {}", T::COLUMNS.join(", "), T::TABLE)
    }

    pub async fn find(conn: &mut SqliteConnection, id: &str) -> Result<Option<T>, DatabaseError> {
        Self::find_by(conn, "id", id).await
    }

    pub async fn find_by(
        conn: &mut SqliteConnection,
        column: &'static str,
        value: &str,
    ) -> Result<Option<T>, DatabaseError> {
        let sql = format!("{} WHERE {} = ?", Self::select_sql(), column);
        let row = sqlx::query_as::<_, T>(&sql)
            .bind(value)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row)
    }

    /// True when some row other than `exclude_id` has `column = value`
    pub async fn taken_by_other(
        conn: &mut SqliteConnection,
        column: &'static str,
        value: &str,
        exclude_id: &str,
    ) -> Result<bool, DatabaseError> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ? AND id <> ?)",
            T::TABLE,
            column
        );
        let (taken,): (bool,) = sqlx::query_as(&sql)
            .bind(value)
            .bind(exclude_id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(taken)
    }

    pub async fn exists(conn: &mut SqliteConnection, id: &str) -> Result<bool, DatabaseError> {
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?)", T::TABLE);
        let (found,): (bool,) = sqlx::query_as(&sql).bind(id).fetch_one(&mut *conn).await?;
        Ok(found)
    }

    /// Rows in insertion order
    pub async fn list(conn: &mut SqliteConnection, page: Page) -> Result<Vec<T>, DatabaseError> {
        let sql = format!("{} ORDER BY rowid LIMIT ? OFFSET ?", Self::select_sql());
        let rows = sqlx::query_as::<_, T>(&sql)
            .bind(page.limit)
            .bind(page.skip)
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows)
    }

    pub async fn count_where(
        conn: &mut SqliteConnection,
        column: &'static str,
        value: &str,
    ) -> Result<i64, DatabaseError> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {} = ?", T::TABLE, column);
        let (count,): (i64,) = sqlx::query_as(&sql).bind(value).fetch_one(&mut *conn).await?;
        Ok(count)
    }

    pub async fn insert(conn: &mut SqliteConnection, changes: Changes) -> Result<T, DatabaseError> {
        let fields = changes.into_fields();
        let columns: Vec<&str> = fields.iter().map(|(c, _)| *c).collect();

        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "INSERT INTO {} ({}) VALUES (",
            T::TABLE,
            columns.join(", ")
        ));
        for (i, (_, value)) in fields.into_iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            bind_value(&mut qb, value);
        }
        qb.push(") RETURNING ");
        qb.push(T::COLUMNS.join(", "));

        let row = qb.build_query_as::<T>().fetch_one(&mut *conn).await?;
        Ok(row)
    }

    /// Apply `changes` to the row. Columns not in `changes` keep their value.
    /// Returns `None` when no row has this id.
    pub async fn update(
        conn: &mut SqliteConnection,
        id: &str,
        changes: Changes,
    ) -> Result<Option<T>, DatabaseError> {
        if changes.is_empty() {
            return Self::find(conn, id).await;
        }

        let mut qb = QueryBuilder::<Sqlite>::new(format!("UPDATE {} SET ", T::TABLE));
        for (i, (column, value)) in changes.into_fields().into_iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(column);
            qb.push(" = ");
            bind_value(&mut qb, value);
        }
        qb.push(" WHERE id = ");
        qb.push_bind(id.to_string());
        qb.push(" RETURNING ");
        qb.push(T::COLUMNS.join(", "));

        let row = qb.build_query_as::<T>().fetch_optional(&mut *conn).await?;
        Ok(row)
    }

    /// Returns false when no row has this id
    pub async fn delete(conn: &mut SqliteConnection, id: &str) -> Result<bool, DatabaseError> {
        let sql = format!("DELETE FROM {} WHERE id = ?", T::TABLE);
        let result = sqlx::query(&sql).bind(id).execute(&mut *conn).await?;
        Ok(result.rows_affected() > 0)
    }
}

fn bind_value(qb: &mut QueryBuilder<'_, Sqlite>, value: FieldValue) {
    match value {
        FieldValue::Text(text) => {
            qb.push_bind(text);
        }
        FieldValue::Bool(flag) => {
            qb.push_bind(flag);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::manager::DatabaseManager;
    use crate::database::models::owner::Owner;

    fn owner_changes(id: &str, email: &str) -> Changes {
        Changes::new()
            .set("id", id)
            .set("name", "Ana")
            .set("email", email)
            .set("phone", "555")
    }

    #[tokio::test]
    async fn insert_find_update_delete() {
        let db = DatabaseManager::connect_in_memory().await.unwrap();
        let mut conn = db.acquire().await.unwrap();

        let owner: Owner = Repository::insert(&mut conn, owner_changes("o1", "ana@x.com"))
            .await
            .unwrap();
        assert_eq!(owner.email, "ana@x.com");

        let found = Repository::<Owner>::find(&mut conn, "o1").await.unwrap().unwrap();
        assert_eq!(found, owner);

        let updated = Repository::<Owner>::update(&mut conn, "o1", Changes::new().set("phone", "999"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.phone, "999");
        assert_eq!(updated.name, "Ana");

        assert!(Repository::<Owner>::update(&mut conn, "nope", Changes::new().set("phone", "1"))
            .await
            .unwrap()
            .is_none());

        assert!(Repository::<Owner>::delete(&mut conn, "o1").await.unwrap());
        assert!(!Repository::<Owner>::delete(&mut conn, "o1").await.unwrap());
        assert!(!Repository::<Owner>::exists(&mut conn, "o1").await.unwrap());
    }

    #[tokio::test]
    async fn list_keeps_insertion_order_and_paginates() {
        let db = DatabaseManager::connect_in_memory().await.unwrap();
        let mut conn = db.acquire().await.unwrap();

        for (id, email) in [("z", "z@x.com"), ("a", "a@x.com"), ("m", "m@x.com")] {
            Repository::<Owner>::insert(&mut conn, owner_changes(id, email)).await.unwrap();
        }

        let all = Repository::<Owner>::list(&mut conn, Page::default()).await.unwrap();
        let ids: Vec<_> = all.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);

        let window = Repository::<Owner>::list(&mut conn, Page { skip: 1, limit: 1 }).await.unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].id, "a");
    }

    #[tokio::test]
    async fn unique_column_violation_is_classified() {
        let db = DatabaseManager::connect_in_memory().await.unwrap();
        let mut conn = db.acquire().await.unwrap();

        Repository::<Owner>::insert(&mut conn, owner_changes("o1", "dup@x.com")).await.unwrap();
        let err = Repository::<Owner>::insert(&mut conn, owner_changes("o2", "dup@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::UniqueViolation(_)));

        assert!(Repository::<Owner>::taken_by_other(&mut conn, "email", "dup@x.com", "o2")
            .await
            .unwrap());
        assert!(!Repository::<Owner>::taken_by_other(&mut conn, "email", "dup@x.com", "o1")
            .await
            .unwrap());
    }
}
