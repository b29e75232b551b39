#![allow(missing_docs)]

use axum_test::TestServer;
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, PasswordHash, build_router,
    auth::AuthResponse,
    db::initialize,
    endpoints,
    user::{NewUser, User, create_user},
};

pub(crate) const TEST_NAME: &str = "Test User";
pub(crate) const TEST_EMAIL: &str = "test@test.com";
pub(crate) const TEST_PASSWORD: &str = "averysafeandsecurepassword";

/// The lowest cost bcrypt allows, so tests that register users stay fast.
const TEST_PASSWORD_COST: u32 = 4;

pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not create in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");

    connection
}

pub(crate) fn insert_test_user(connection: &Connection, email: &str) -> User {
    create_user(
        NewUser {
            full_name: TEST_NAME.to_owned(),
            email: email.parse().expect("Could not parse test email"),
            password_hash: PasswordHash::new_unchecked("hunter2"),
            profile_image_url: None,
        },
        connection,
    )
    .expect("Could not create test user")
}

pub(crate) fn get_test_state(upload_dir: &std::path::Path) -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not create in-memory SQLite database");

    AppState::new(connection, "nafstenoas", upload_dir)
        .expect("Could not create app state")
        .with_password_cost(TEST_PASSWORD_COST)
}

/// Create a test server backed by an in-memory database.
///
/// Uploads are written to the system temp directory.
pub(crate) fn get_test_server() -> TestServer {
    let state = get_test_state(&std::env::temp_dir());

    TestServer::try_new(build_router(state)).expect("Could not create test server.")
}

pub(crate) async fn register_test_user(server: &TestServer) -> AuthResponse {
    register_user_with_email(server, TEST_EMAIL).await
}

pub(crate) async fn register_user_with_email(server: &TestServer, email: &str) -> AuthResponse {
    server
        .post(endpoints::REGISTER)
        .json(&json!({
            "fullName": TEST_NAME,
            "email": email,
            "password": TEST_PASSWORD,
        }))
        .await
        .json::<AuthResponse>()
}
