//! Helpers shared by the unit tests.

use rusqlite::Connection;
use serde::Deserialize;
use time::macros::datetime;

use crate::{
    AppState,
    db::initialize,
    record::{Category, NewRecord, PaymentMethod, UserId},
};

/// The JSON body of an error response.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

pub(crate) fn get_test_connection() -> Connection {
    let conn = Connection::open_in_memory().expect("Could not open database in memory.");
    initialize(&conn).expect("Could not initialize database.");
    conn
}

pub(crate) fn get_test_app_state() -> AppState {
    let conn = Connection::open_in_memory().expect("Could not open database in memory.");
    AppState::new(conn).expect("Could not create app state.")
}

/// A food record paid in cash on a fixed date.
pub(crate) fn new_record(user_id: &str, description: &str, amount: f64) -> NewRecord {
    NewRecord {
        user_id: UserId::new(user_id).expect("Invalid user ID"),
        date: datetime!(2024-05-01 08:00:00 UTC),
        description: description.to_owned(),
        amount,
        category: Category::Food,
        payment_method: PaymentMethod::Cash,
    }
}
