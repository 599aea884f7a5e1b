//! Shared helpers for tests.

#![allow(missing_docs)]

use axum_test::TestServer;
use rusqlite::Connection;

use crate::{
    AppState, PasswordHash, User, UserID, ValidatedPassword,
    auth::encode_token,
    budget::{Budget, NewBudget, create_budget},
    build_router, initialize_db,
    transaction::{NewTransaction, Transaction, create_transaction},
    user::create_user,
};

pub const TEST_SECRET: &str = "test-jwt-secret";

pub const TEST_PASSWORD: &str = "correct horse battery staple";

/// Low bcrypt cost so that tests that create users stay fast.
const TEST_HASH_COST: u32 = 4;

/// An in-memory database with every table created.
pub fn get_test_connection() -> Connection {
    let connection = Connection::open_in_memory().unwrap();
    initialize_db(&connection).expect("Could not initialize database");

    connection
}

/// Insert a user with a placeholder password hash and return their ID.
pub fn insert_test_user(connection: &Connection, email: &str) -> UserID {
    create_user(
        "Test User",
        email,
        PasswordHash::new_unchecked("hunter2"),
        connection,
    )
    .expect("Could not create test user")
    .id
}

pub fn get_test_state() -> AppState {
    AppState::new(
        Connection::open_in_memory().unwrap(),
        TEST_SECRET,
        "Etc/UTC",
    )
    .expect("Could not create app state")
}

pub fn get_test_server() -> TestServer {
    get_test_server_with_state(get_test_state())
}

pub fn get_test_server_with_state(state: AppState) -> TestServer {
    TestServer::new(build_router(state)).expect("Could not create test server.")
}

/// Create a user whose password is [TEST_PASSWORD].
pub fn create_test_user(state: &AppState, email: &str) -> User {
    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(TEST_PASSWORD),
        TEST_HASH_COST,
    )
    .unwrap();
    let connection = state.db_connection.lock().unwrap();

    create_user("Test User", email, password_hash, &connection)
        .expect("Could not create test user")
}

pub fn auth_token_for(state: &AppState, user_id: UserID) -> String {
    encode_token(user_id, state.token_duration, &state.jwt_keys)
        .expect("Could not create token")
}

pub fn insert_transaction(
    state: &AppState,
    user_id: UserID,
    new_transaction: NewTransaction,
) -> Transaction {
    let connection = state.db_connection.lock().unwrap();

    create_transaction(user_id, &new_transaction, &connection)
        .expect("Could not create test transaction")
}

pub fn insert_budget(state: &AppState, user_id: UserID, new_budget: NewBudget) -> Budget {
    let connection = state.db_connection.lock().unwrap();

    create_budget(user_id, &new_budget, &connection).expect("Could not create test budget")
}
