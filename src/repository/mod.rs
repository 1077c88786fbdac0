//! SQL access, one module per table family. Functions that must join a caller's transaction take
//! a `&mut SqliteConnection` or any `SqliteExecutor`.

pub mod addresses;
pub mod cart;
pub mod orders;
pub mod products;
pub mod wishlist;

pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// The row of an `INSERT/UPDATE ... RETURNING` write.
///
/// Such writes go through `fetch_all`: `fetch_one` leaves the SQLite statement unfinished and the
/// write stays invisible to other pooled connections until the statement is reset.
pub(crate) fn single_row<T>(rows: Vec<T>) -> sqlx::Result<T> {
    rows.into_iter().next().ok_or(sqlx::Error::RowNotFound)
}
