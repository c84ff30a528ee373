//! Database functions for storing and querying financial records.

use rusqlite::{Connection, Row, named_params};

use crate::{
    Error,
    record::{FinancialRecord, NewRecord, RecordId, RecordPatch, UserId},
};

const RECORD_COLUMNS: &str = "id, user_id, date, description, amount, category, payment_method";

/// Create a new record in the database.
///
/// The database assigns the record's ID.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn create_record(record: &NewRecord, connection: &Connection) -> Result<FinancialRecord, Error> {
    let record = connection
        .prepare(&format!(
            "INSERT INTO financial_record (user_id, date, description, amount, category, payment_method)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING {RECORD_COLUMNS}"
        ))?
        .query_row(
            (
                record.user_id.as_str(),
                record.date,
                &record.description,
                record.amount,
                record.category,
                record.payment_method,
            ),
            map_record_row,
        )?;

    Ok(record)
}

/// Retrieve a record from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a stored record,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_record(id: &RecordId, connection: &Connection) -> Result<FinancialRecord, Error> {
    let record = connection
        .prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM financial_record WHERE id = :id"
        ))?
        .query_row(named_params! {":id": id.as_str()}, map_record_row)?;

    Ok(record)
}

/// Retrieve every record owned by `user_id`, in the order they were created.
///
/// A user without records gets an empty vector, not an error.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_records_by_user(
    user_id: &UserId,
    connection: &Connection,
) -> Result<Vec<FinancialRecord>, Error> {
    connection
        .prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM financial_record WHERE user_id = :user_id ORDER BY seq"
        ))?
        .query_map(named_params! {":user_id": user_id.as_str()}, map_record_row)?
        .map(|maybe_record| maybe_record.map_err(Error::from))
        .collect()
}

/// Merge the fields set in `patch` into the record `id` and return the
/// result.
///
/// Fields that are `None` in `patch` keep their stored value. The merge
/// happens in a single statement, so concurrent writers never observe a
/// half-applied patch.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a stored record,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_record(
    id: &RecordId,
    patch: &RecordPatch,
    connection: &Connection,
) -> Result<FinancialRecord, Error> {
    let record = connection
        .prepare(&format!(
            "UPDATE financial_record SET
                description = COALESCE(:description, description),
                amount = COALESCE(:amount, amount),
                category = COALESCE(:category, category),
                payment_method = COALESCE(:payment_method, payment_method)
             WHERE id = :id
             RETURNING {RECORD_COLUMNS}"
        ))?
        .query_row(
            named_params! {
                ":id": id.as_str(),
                ":description": patch.description,
                ":amount": patch.amount,
                ":category": patch.category,
                ":payment_method": patch.payment_method,
            },
            map_record_row,
        )?;

    Ok(record)
}

/// Permanently delete the record `id` and return what was deleted.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a stored record,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_record(id: &RecordId, connection: &Connection) -> Result<FinancialRecord, Error> {
    let record = connection
        .prepare(&format!(
            "DELETE FROM financial_record WHERE id = :id RETURNING {RECORD_COLUMNS}"
        ))?
        .query_row(named_params! {":id": id.as_str()}, map_record_row)?;

    Ok(record)
}

/// Create the financial record table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_record_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    // `seq` fixes the display order; `id` is the opaque key handed to clients.
    connection.execute(
        "CREATE TABLE IF NOT EXISTS financial_record (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE DEFAULT (lower(hex(randomblob(12)))),
                user_id TEXT NOT NULL CHECK (length(user_id) > 0),
                date TEXT NOT NULL,
                description TEXT NOT NULL,
                amount REAL NOT NULL,
                category TEXT NOT NULL,
                payment_method TEXT NOT NULL
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_financial_record_user ON financial_record(user_id, seq);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a [FinancialRecord].
///
/// The row must contain the columns in the order of `RECORD_COLUMNS`.
pub fn map_record_row(row: &Row) -> Result<FinancialRecord, rusqlite::Error> {
    let id: String = row.get(0)?;
    let user_id: String = row.get(1)?;

    Ok(FinancialRecord {
        id: RecordId::new(id),
        user_id: UserId::new_unchecked(&user_id),
        date: row.get(2)?,
        description: row.get(3)?,
        amount: row.get(4)?,
        category: row.get(5)?,
        payment_method: row.get(6)?,
    })
}
