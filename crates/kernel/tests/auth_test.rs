#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Signup, login, logout and the protected-route gate.

mod common;

use axum::http::StatusCode;
use snippetbox_test_utils::assertions;

use common::TestApp;

#[tokio::test]
async fn protected_page_redirects_anonymous_visitor_to_login() {
    let app = TestApp::new();
    let mut client = app.client();

    let response = client.get("/snippet/create").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/user/login"));
}

#[tokio::test]
async fn protected_handler_does_not_run_for_anonymous_post() {
    let app = TestApp::new();
    let mut client = app.client();

    let response = client
        .submit_form(
            "/user/login",
            "/snippet/create",
            &[("title", "Sneaky"), ("content", "body"), ("expires", "7")],
        )
        .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/user/login"));
    assert!(app.state.snippets().latest().await.unwrap().is_empty());
}

#[tokio::test]
async fn signup_rejects_seven_character_password() {
    let app = TestApp::new();
    let mut client = app.client();

    let response = app
        .sign_up(&mut client, "Alice", "alice@example.com", "1234567")
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assertions::contains(&response.body, "This field must be at least 8 characters long");
    // Input is echoed back, the password never is.
    assertions::contains(&response.body, r#"value="alice@example.com""#);
    assertions::not_contains(&response.body, "1234567");
    assert_eq!(app.users.id_for_email("alice@example.com"), None);
}

#[tokio::test]
async fn signup_accepts_eight_character_password() {
    let app = TestApp::new();
    let mut client = app.client();

    let response = app
        .sign_up(&mut client, "Alice", "alice@example.com", "12345678")
        .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/user/login"));
    assert!(app.users.id_for_email("alice@example.com").is_some());

    let login_page = client.get("/user/login").await;
    assertions::contains(&login_page.body, "Your signup was successful. Please log in.");

    // The flash is shown once.
    let again = client.get("/user/login").await;
    assertions::not_contains(&again.body, "Your signup was successful");
}

#[tokio::test]
async fn signup_with_taken_email_reports_field_error() {
    let app = TestApp::new();
    let mut client = app.client();
    app.sign_up(&mut client, "Alice", "alice@example.com", "pa55word!")
        .await;

    let response = app
        .sign_up(&mut client, "Impostor", "alice@example.com", "different1")
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assertions::contains(&response.body, "User already exists");
}

#[tokio::test]
async fn wrong_credentials_twice_stay_anonymous() {
    let app = TestApp::new();
    let mut client = app.client();
    app.sign_up(&mut client, "Bob", "bob@example.com", "correct horse")
        .await;

    for _ in 0..2 {
        let response = app.log_in(&mut client, "bob@example.com", "battery staple").await;
        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        assertions::contains(&response.body, "Invalid Email or Password");
        assertions::contains(&response.body, r#"value="bob@example.com""#);

        let gate = client.get("/snippet/create").await;
        assert_eq!(gate.location(), Some("/user/login"));
    }
}

#[tokio::test]
async fn unknown_email_is_reported_like_a_wrong_password() {
    let app = TestApp::new();
    let mut client = app.client();

    let response = app.log_in(&mut client, "nobody@example.com", "whatever1").await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assertions::contains(&response.body, "Invalid Email or Password");
}

#[tokio::test]
async fn login_renews_session_token() {
    let app = TestApp::new();
    let mut client = app.client();
    app.sign_up(&mut client, "Carol", "carol@example.com", "pa55word!")
        .await;

    let login_page = client.get("/user/login").await;
    let before = client.session_id().map(str::to_string);
    assert!(before.is_some());
    let token_before = login_page.csrf_token().unwrap();

    let response = client
        .post_form(
            "/user/login",
            &[
                ("csrf_token", token_before.as_str()),
                ("email", "carol@example.com"),
                ("password", "pa55word!"),
            ],
        )
        .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/snippet/create"));
    assert_ne!(client.session_id().map(str::to_string), before);

    let create = client.get("/snippet/create").await;
    assert_eq!(create.status, StatusCode::OK);
    assert_ne!(create.csrf_token().unwrap(), token_before);
}

#[tokio::test]
async fn logout_renews_session_token_and_drops_identity() {
    let app = TestApp::new();
    let mut client = app.logged_in_client("dave@example.com").await;
    let before = client.session_id().map(str::to_string);

    let response = client.submit_form("/", "/user/logout", &[]).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/"));
    assert_ne!(client.session_id().map(str::to_string), before);

    let home = client.get("/").await;
    assertions::contains(&home.body, "You&#x27;ve been logged out successfully!");
    assertions::contains(&home.body, r#"href="/user/login""#);

    let gate = client.get("/snippet/create").await;
    assert_eq!(gate.location(), Some("/user/login"));
}

#[tokio::test]
async fn deleted_user_degrades_to_anonymous() {
    let app = TestApp::new();
    let mut client = app.logged_in_client("erin@example.com").await;

    let id = app.users.id_for_email("erin@example.com").unwrap();
    assert!(app.users.remove(id));

    let home = client.get("/").await;
    assert_eq!(home.status, StatusCode::OK);
    assertions::contains(&home.body, r#"href="/user/signup""#);
    assertions::not_contains(&home.body, "/user/logout");

    let gate = client.get("/snippet/create").await;
    assert_eq!(gate.location(), Some("/user/login"));
}

#[tokio::test]
async fn authenticated_pages_are_not_cached() {
    let app = TestApp::new();
    let mut client = app.logged_in_client("frank@example.com").await;

    let response = client.get("/snippet/create").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("cache-control"), Some("no-store"));
}
