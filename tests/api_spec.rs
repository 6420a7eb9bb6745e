use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::{TestResponse, TestServer, TestServerConfig};
use pocketdesk::api::create_router;
use pocketdesk::api::handlers::{
    GOOGLE_DISABLED_MESSAGE, GOOGLE_FAILED_MESSAGE, INVALID_CREDENTIALS_MESSAGE,
    MISSING_CREDENTIALS_MESSAGE, MISSING_TITLE_MESSAGE, NOTE_LIMIT_MESSAGE,
    USERNAME_TAKEN_MESSAGE,
};
use pocketdesk::config::GoogleConfig;
use pocketdesk::models::*;
use pocketdesk::quotes::{fallback_quote, Quote, StaticQuotes};
use pocketdesk::session::SESSION_COOKIE_NAME;
use pocketdesk::{AppState, Config, Database};
use uuid::Uuid;

const QUOTE_TEXT: &str = "Stay hungry, stay foolish.";

fn quotes() -> Arc<StaticQuotes> {
    Arc::new(StaticQuotes::new(vec![Quote {
        text: QUOTE_TEXT.to_string(),
        author: Some("Steve Jobs, type.fit".to_string()),
    }]))
}

fn test_db() -> Database {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    db
}

fn server_for(state: AppState) -> TestServer {
    let config = TestServerConfig {
        save_cookies: true,
        ..TestServerConfig::default()
    };
    TestServer::new_with_config(create_router(state), config).expect("Failed to create test server")
}

/// A browser with its own cookie jar against the given database.
fn client(db: &Database) -> TestServer {
    let state = AppState::new(db.clone(), Config::default())
        .expect("Failed to build state")
        .with_quotes(quotes());
    server_for(state)
}

fn setup() -> (TestServer, Database) {
    let db = test_db();
    (client(&db), db)
}

fn credentials(username: &str, password: &str) -> Credentials {
    Credentials {
        username: username.to_string(),
        password: password.to_string(),
    }
}

async fn register(server: &TestServer, username: &str, password: &str) -> TestResponse {
    server
        .post("/register")
        .form(&credentials(username, password))
        .await
}

async fn login(server: &TestServer, username: &str, password: &str) -> TestResponse {
    server.post("/").form(&credentials(username, password)).await
}

async fn create_note(server: &TestServer, title: &str, content: &str) -> TestResponse {
    server
        .post("/create")
        .form(&CreateNoteInput {
            title: title.to_string(),
            content: content.to_string(),
        })
        .await
}

fn assert_redirect(response: &TestResponse, location: &str) {
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), location);
}

fn user_id(db: &Database, username: &str) -> Uuid {
    db.find_user_by_username(username)
        .expect("Query failed")
        .expect("User not found")
        .id
}

mod health {
    use super::*;

    #[tokio::test]
    async fn reports_ok() {
        let (server, _db) = setup();

        let response = server.get("/health").await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "ok");
    }
}

mod registration {
    use super::*;

    #[tokio::test]
    async fn shows_the_form() {
        let (server, _db) = setup();

        let response = server.get("/register").await;

        response.assert_status_ok();
        assert!(response.text().contains(r#"action="/register""#));
    }

    #[tokio::test]
    async fn creates_user_and_signs_in() {
        let (server, db) = setup();

        let response = register(&server, "alice", "wonderland").await;
        assert_redirect(&response, "/main");

        let user = db.find_user_by_username("alice").unwrap().unwrap();
        assert!(user.password_hash.unwrap().starts_with("$argon2id$"));

        let dashboard = server.get("/main").await;
        dashboard.assert_status_ok();
        assert!(dashboard.text().contains("Hello, alice!"));
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected_and_first_password_kept() {
        let (server, db) = setup();

        register(&server, "alice", "first-password").await;
        server.get("/logout").await;

        let response = register(&server, "alice", "second-password").await;
        assert_redirect(&response, "/register");

        let form = server.get("/register").await;
        assert!(form.text().contains(USERNAME_TAKEN_MESSAGE));
        assert_eq!(db.count_users().unwrap(), 1);

        assert_redirect(&login(&server, "alice", "second-password").await, "/");
        assert_redirect(&login(&server, "alice", "first-password").await, "/main");
    }

    #[tokio::test]
    async fn blank_credentials_are_rejected() {
        let (server, db) = setup();

        let response = register(&server, "   ", "secret").await;
        assert_redirect(&response, "/register");

        let form = server.get("/register").await;
        assert!(form.text().contains(MISSING_CREDENTIALS_MESSAGE));
        assert_eq!(db.count_users().unwrap(), 0);
    }

    #[tokio::test]
    async fn flash_is_shown_only_once() {
        let (server, _db) = setup();

        register(&server, "", "").await;

        assert!(server
            .get("/register")
            .await
            .text()
            .contains(MISSING_CREDENTIALS_MESSAGE));
        assert!(!server
            .get("/register")
            .await
            .text()
            .contains(MISSING_CREDENTIALS_MESSAGE));
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn shows_the_form() {
        let (server, _db) = setup();

        let response = server.get("/").await;

        response.assert_status_ok();
        assert!(response.text().contains(r#"action="/""#));
        assert!(!response.text().contains("/auth/google"));
    }

    #[tokio::test]
    async fn valid_credentials_open_the_dashboard() {
        let (server, db) = setup();
        register(&server, "alice", "wonderland").await;
        server.get("/logout").await;

        let response = login(&server, "alice", "wonderland").await;
        assert_redirect(&response, "/main");

        server.get("/main").await.assert_status_ok();
        assert_eq!(db.count_users().unwrap(), 1);
    }

    #[tokio::test]
    async fn wrong_password_flashes_an_error() {
        let (server, _db) = setup();
        register(&server, "alice", "wonderland").await;
        server.get("/logout").await;

        let response = login(&server, "alice", "looking-glass").await;
        assert_redirect(&response, "/");

        let page = server.get("/").await;
        assert!(page.text().contains(INVALID_CREDENTIALS_MESSAGE));
        assert_redirect(&server.get("/main").await, "/");
    }

    #[tokio::test]
    async fn unknown_user_gets_the_same_error() {
        let (server, _db) = setup();

        let response = login(&server, "nobody", "whatever").await;
        assert_redirect(&response, "/");
        assert!(server
            .get("/")
            .await
            .text()
            .contains(INVALID_CREDENTIALS_MESSAGE));
    }
}

mod logout {
    use super::*;

    #[tokio::test]
    async fn ends_the_session() {
        let (server, _db) = setup();
        register(&server, "alice", "wonderland").await;
        server.get("/main").await.assert_status_ok();

        let response = server.get("/logout").await;
        assert_redirect(&response, "/");

        assert_redirect(&server.get("/main").await, "/");
        assert_redirect(&server.get("/create").await, "/");
    }

    #[tokio::test]
    async fn old_cookie_is_no_longer_accepted() {
        let (server, _db) = setup();
        let registered = register(&server, "alice", "wonderland").await;
        let old_cookie = registered.cookie(SESSION_COOKIE_NAME);

        server.get("/logout").await;

        let response = server.get("/main").add_cookie(old_cookie).await;
        assert_redirect(&response, "/");
    }
}

mod anonymous_access {
    use super::*;

    #[tokio::test]
    async fn protected_pages_redirect_to_login() {
        let (server, _db) = setup();

        assert_redirect(&server.get("/main").await, "/");
        assert_redirect(&server.get("/create").await, "/");
        assert_redirect(&server.get("/notes/anything").await, "/");
    }

    #[tokio::test]
    async fn mutations_redirect_without_executing() {
        let (server, db) = setup();

        let response = server
            .post("/main")
            .form(&CreateTodoInput {
                content: "sneaky".to_string(),
            })
            .await;
        assert_redirect(&response, "/");

        let response = server
            .post("/delete")
            .form(&DeleteTodoInput {
                todo_id: Uuid::new_v4().to_string(),
            })
            .await;
        assert_redirect(&response, "/");

        assert_redirect(&create_note(&server, "Sneaky", "note").await, "/");

        let response = server
            .post("/notes/sneaky")
            .form(&DeleteNoteInput {
                note_id: Uuid::new_v4().to_string(),
            })
            .await;
        assert_redirect(&response, "/");

        assert_eq!(db.count_users().unwrap(), 0);
    }
}

mod dashboard {
    use super::*;

    #[tokio::test]
    async fn shows_quote_with_cleaned_author() {
        let (server, _db) = setup();
        register(&server, "alice", "wonderland").await;

        let text = server.get("/main").await.text();

        assert!(text.contains(QUOTE_TEXT));
        assert!(text.contains("Steve Jobs"));
        assert!(!text.contains("type.fit"));
    }

    #[tokio::test]
    async fn falls_back_when_quotes_are_unavailable() {
        let db = test_db();
        let state = AppState::new(db.clone(), Config::default())
            .unwrap()
            .with_quotes(Arc::new(StaticQuotes::default()));
        let server = server_for(state);
        register(&server, "alice", "wonderland").await;

        let response = server.get("/main").await;

        response.assert_status_ok();
        assert!(response.text().contains(&fallback_quote().text));
    }
}

mod todos {
    use super::*;

    async fn add_todo(server: &TestServer, content: &str) -> TestResponse {
        server
            .post("/main")
            .form(&CreateTodoInput {
                content: content.to_string(),
            })
            .await
    }

    async fn delete_todo(server: &TestServer, todo_id: &str) -> TestResponse {
        server
            .post("/delete")
            .form(&DeleteTodoInput {
                todo_id: todo_id.to_string(),
            })
            .await
    }

    #[tokio::test]
    async fn added_items_appear_in_order() {
        let (server, db) = setup();
        register(&server, "alice", "wonderland").await;

        assert_redirect(&add_todo(&server, "Buy milk").await, "/main");
        add_todo(&server, "Walk the dog").await;

        let todos = db.list_todos(user_id(&db, "alice")).unwrap();
        let contents: Vec<_> = todos.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["Buy milk", "Walk the dog"]);

        let text = server.get("/main").await.text();
        let milk = text.find("Buy milk").unwrap();
        let dog = text.find("Walk the dog").unwrap();
        assert!(milk < dog);
    }

    #[tokio::test]
    async fn blank_items_are_ignored() {
        let (server, db) = setup();
        register(&server, "alice", "wonderland").await;

        assert_redirect(&add_todo(&server, "   ").await, "/main");

        assert!(db.list_todos(user_id(&db, "alice")).unwrap().is_empty());
    }

    #[tokio::test]
    async fn content_is_escaped_on_the_dashboard() {
        let (server, _db) = setup();
        register(&server, "alice", "wonderland").await;

        add_todo(&server, "<script>alert(1)</script>").await;

        let text = server.get("/main").await.text();
        assert!(text.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!text.contains("<script>alert(1)"));
    }

    #[tokio::test]
    async fn delete_removes_the_item() {
        let (server, db) = setup();
        register(&server, "alice", "wonderland").await;
        add_todo(&server, "Buy milk").await;
        add_todo(&server, "Walk the dog").await;
        let alice = user_id(&db, "alice");
        let milk = db.list_todos(alice).unwrap()[0].id;

        let response = delete_todo(&server, &milk.to_string()).await;
        assert_redirect(&response, "/main");

        let todos = db.list_todos(alice).unwrap();
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].content, "Walk the dog");
    }

    #[tokio::test]
    async fn deleting_an_absent_id_is_a_no_op() {
        let (server, db) = setup();
        register(&server, "alice", "wonderland").await;
        add_todo(&server, "Buy milk").await;

        assert_redirect(
            &delete_todo(&server, &Uuid::new_v4().to_string()).await,
            "/main",
        );
        assert_redirect(&delete_todo(&server, "not-a-uuid").await, "/main");
        assert_redirect(&delete_todo(&server, "").await, "/main");

        assert_eq!(db.list_todos(user_id(&db, "alice")).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn users_cannot_delete_each_others_items() {
        let db = test_db();
        let alice = client(&db);
        let bob = client(&db);
        register(&alice, "alice", "wonderland").await;
        register(&bob, "bob", "builder").await;
        add_todo(&alice, "Alice's secret").await;
        let alice_id = user_id(&db, "alice");
        let todo = db.list_todos(alice_id).unwrap()[0].id;

        delete_todo(&bob, &todo.to_string()).await;

        assert_eq!(db.list_todos(alice_id).unwrap().len(), 1);
        assert!(!bob.get("/main").await.text().contains("Alice's secret"));
    }
}

mod notes {
    use super::*;

    #[tokio::test]
    async fn create_form_is_shown_below_capacity() {
        let (server, _db) = setup();
        register(&server, "alice", "wonderland").await;

        let response = server.get("/create").await;

        response.assert_status_ok();
        assert!(response.text().contains(r#"action="/create""#));
    }

    #[tokio::test]
    async fn created_note_is_listed_and_viewable() {
        let (server, _db) = setup();
        register(&server, "alice", "wonderland").await;

        let response = create_note(&server, "My First Note", "Remember the milk").await;
        assert_redirect(&response, "/main");

        let dashboard = server.get("/main").await.text();
        assert!(dashboard.contains(r#"href="/notes/my-first-note""#));

        let page = server.get("/notes/my-first-note").await;
        page.assert_status_ok();
        assert!(page.text().contains("Remember the milk"));
    }

    #[tokio::test]
    async fn slug_lookup_ignores_case_and_separators() {
        let (server, _db) = setup();
        register(&server, "alice", "wonderland").await;
        create_note(&server, "My First Note", "content").await;

        server.get("/notes/MY-FIRST-NOTE").await.assert_status_ok();
        server.get("/notes/my%20first%20note").await.assert_status_ok();
        server.get("/notes/my_first_note").await.assert_status_ok();
    }

    #[tokio::test]
    async fn unknown_slug_is_not_found() {
        let (server, _db) = setup();
        register(&server, "alice", "wonderland").await;

        let response = server.get("/notes/does-not-exist").await;

        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        assert!(response.text().contains("Not found"));
        assert!(response.text().contains(r#"href="/logout""#));
    }

    #[tokio::test]
    async fn blank_title_is_rejected() {
        let (server, db) = setup();
        register(&server, "alice", "wonderland").await;

        assert_redirect(&create_note(&server, "  ", "content").await, "/create");

        assert!(server
            .get("/create")
            .await
            .text()
            .contains(MISSING_TITLE_MESSAGE));
        assert_eq!(db.count_notes(user_id(&db, "alice")).unwrap(), 0);
    }

    #[tokio::test]
    async fn title_without_letters_or_digits_is_rejected() {
        let (server, db) = setup();
        register(&server, "alice", "wonderland").await;

        for title in ["!!!", "---", " ? . "] {
            assert_redirect(&create_note(&server, title, "content").await, "/create");
        }

        assert!(server
            .get("/create")
            .await
            .text()
            .contains(MISSING_TITLE_MESSAGE));
        assert_eq!(db.count_notes(user_id(&db, "alice")).unwrap(), 0);
        assert!(!server.get("/main").await.text().contains(r#"href="/notes/""#));
    }

    #[tokio::test]
    async fn never_more_than_three_notes() {
        let (server, db) = setup();
        register(&server, "alice", "wonderland").await;
        let alice = user_id(&db, "alice");

        for i in 0..MAX_NOTES_PER_USER {
            create_note(&server, &format!("Note {}", i), "body").await;
        }
        assert_eq!(db.count_notes(alice).unwrap(), MAX_NOTES_PER_USER);

        let response = create_note(&server, "One too many", "body").await;
        assert_redirect(&response, "/main");
        assert_eq!(db.count_notes(alice).unwrap(), MAX_NOTES_PER_USER);

        let dashboard = server.get("/main").await.text();
        assert!(dashboard.contains(NOTE_LIMIT_MESSAGE));
        assert!(!dashboard.contains("One too many"));
    }

    #[tokio::test]
    async fn create_page_is_blocked_at_capacity() {
        let (server, _db) = setup();
        register(&server, "alice", "wonderland").await;
        for i in 0..MAX_NOTES_PER_USER {
            create_note(&server, &format!("Note {}", i), "body").await;
        }

        let response = server.get("/create").await;

        assert_redirect(&response, "/main");
        assert!(server.get("/main").await.text().contains(NOTE_LIMIT_MESSAGE));
    }

    #[tokio::test]
    async fn delete_frees_a_slot() {
        let (server, db) = setup();
        register(&server, "alice", "wonderland").await;
        let alice = user_id(&db, "alice");
        for i in 0..MAX_NOTES_PER_USER {
            create_note(&server, &format!("Note {}", i), "body").await;
        }
        let first = db.list_notes(alice).unwrap()[0].clone();

        let response = server
            .post(&format!("/notes/{}", first.slug()))
            .form(&DeleteNoteInput {
                note_id: first.id.to_string(),
            })
            .await;
        assert_redirect(&response, "/main");

        assert_eq!(db.count_notes(alice).unwrap(), MAX_NOTES_PER_USER - 1);
        server.get("/create").await.assert_status_ok();
    }

    #[tokio::test]
    async fn deleting_an_absent_id_is_a_no_op() {
        let (server, db) = setup();
        register(&server, "alice", "wonderland").await;
        create_note(&server, "Keep me", "body").await;

        let response = server
            .post("/notes/keep-me")
            .form(&DeleteNoteInput {
                note_id: Uuid::new_v4().to_string(),
            })
            .await;
        assert_redirect(&response, "/main");

        assert_eq!(db.count_notes(user_id(&db, "alice")).unwrap(), 1);
    }

    #[tokio::test]
    async fn notes_are_private_to_their_owner() {
        let db = test_db();
        let alice = client(&db);
        let bob = client(&db);
        register(&alice, "alice", "wonderland").await;
        register(&bob, "bob", "builder").await;
        create_note(&alice, "Diary", "dear diary").await;
        let alice_id = user_id(&db, "alice");
        let diary = db.list_notes(alice_id).unwrap()[0].id;

        let peek = bob.get("/notes/diary").await;
        assert_eq!(peek.status_code(), StatusCode::NOT_FOUND);

        bob.post("/notes/diary")
            .form(&DeleteNoteInput {
                note_id: diary.to_string(),
            })
            .await;
        assert_eq!(db.count_notes(alice_id).unwrap(), 1);
    }
}

mod google_sign_in {
    use super::*;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use pocketdesk::api::handlers::GOOGLE_EMAIL_TAKEN_MESSAGE;
    use pocketdesk::auth::{GoogleEndpoints, GoogleOAuth};
    use serde_json::json;

    fn google_config() -> GoogleConfig {
        GoogleConfig {
            client_id: "client-123".to_string(),
            client_secret: "shh".to_string(),
            redirect_url: "http://localhost:3000/auth/google/main".to_string(),
        }
    }

    fn google_server() -> TestServer {
        let config = Config {
            google: Some(google_config()),
            ..Config::default()
        };
        let state = AppState::new(test_db(), config)
            .expect("Failed to build state")
            .with_quotes(quotes());
        server_for(state)
    }

    #[tokio::test]
    async fn disabled_without_credentials() {
        let (server, _db) = setup();

        let response = server.get("/auth/google").await;
        assert_redirect(&response, "/");

        assert!(server
            .get("/")
            .await
            .text()
            .contains(GOOGLE_DISABLED_MESSAGE));
    }

    #[tokio::test]
    async fn login_page_offers_google_when_configured() {
        let server = google_server();

        assert!(server.get("/").await.text().contains(r#"href="/auth/google""#));
    }

    #[tokio::test]
    async fn start_redirects_to_google() {
        let server = google_server();

        let response = server.get("/auth/google").await;

        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        let location = response.header("location");
        let location = location.to_str().unwrap();
        assert!(location.starts_with("https://accounts.google.com/o/oauth2/v2/auth"));
        assert!(location.contains("client_id=client-123"));
    }

    #[tokio::test]
    async fn callback_with_wrong_state_is_rejected() {
        let server = google_server();
        server.get("/auth/google").await;

        let response = server
            .get("/auth/google/main?code=abc&state=forged")
            .await;
        assert_redirect(&response, "/");

        assert!(server.get("/").await.text().contains(GOOGLE_FAILED_MESSAGE));
        assert_redirect(&server.get("/main").await, "/");
    }

    #[tokio::test]
    async fn callback_without_pending_sign_in_is_rejected() {
        let server = google_server();

        let response = server
            .get("/auth/google/main?code=abc&state=whatever")
            .await;
        assert_redirect(&response, "/");

        assert!(server.get("/").await.text().contains(GOOGLE_FAILED_MESSAGE));
    }

    #[tokio::test]
    async fn provider_error_is_rejected() {
        let server = google_server();
        server.get("/auth/google").await;

        let response = server.get("/auth/google/main?error=access_denied").await;
        assert_redirect(&response, "/");
    }

    /// Serve token and userinfo endpoints locally that always report the
    /// given Google account.
    async fn spawn_google(google_id: &'static str, email: &'static str) -> GoogleEndpoints {
        let router = Router::new()
            .route(
                "/token",
                post(|| async {
                    Json(json!({
                        "access_token": "access-1",
                        "token_type": "bearer",
                        "expires_in": 3600
                    }))
                }),
            )
            .route(
                "/userinfo",
                get(move || async move { Json(json!({ "id": google_id, "email": email })) }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("No local address");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Provider crashed");
        });

        GoogleEndpoints {
            token_url: format!("http://{}/token", addr),
            userinfo_url: format!("http://{}/userinfo", addr),
            ..GoogleEndpoints::default()
        }
    }

    fn google_client(db: &Database, endpoints: GoogleEndpoints) -> TestServer {
        let oauth = GoogleOAuth::with_endpoints(&google_config(), endpoints)
            .expect("Failed to build Google client");
        let state = AppState::new(db.clone(), Config::default())
            .expect("Failed to build state")
            .with_quotes(quotes())
            .with_google(oauth);
        server_for(state)
    }

    /// Start a sign-in and come back through the callback with the state
    /// Google would echo.
    async fn complete_sign_in(server: &TestServer) -> TestResponse {
        let start = server.get("/auth/google").await;
        let location = start.header("location");
        let url = reqwest::Url::parse(location.to_str().unwrap()).unwrap();
        let state = url
            .query_pairs()
            .find(|(key, _)| key == "state")
            .map(|(_, value)| value.into_owned())
            .expect("No state in authorization URL");

        server
            .get(&format!("/auth/google/main?code=code-1&state={}", state))
            .await
    }

    #[tokio::test]
    async fn first_sign_in_creates_the_user_once() {
        let db = test_db();
        let server = google_client(&db, spawn_google("g-1", "alice@example.com").await);

        assert_redirect(&complete_sign_in(&server).await, "/main");
        let dashboard = server.get("/main").await;
        dashboard.assert_status_ok();
        assert!(dashboard.text().contains("Hello, alice@example.com!"));

        server.get("/logout").await;
        assert_redirect(&complete_sign_in(&server).await, "/main");

        assert_eq!(db.count_users().unwrap(), 1);
        let user = db.find_user_by_username("alice@example.com").unwrap().unwrap();
        assert_eq!(user.google_id.as_deref(), Some("g-1"));
    }

    #[tokio::test]
    async fn email_of_a_local_account_is_refused() {
        let db = test_db();
        register(&client(&db), "alice@example.com", "wonderland").await;
        let server = google_client(&db, spawn_google("g-1", "alice@example.com").await);

        let response = complete_sign_in(&server).await;
        assert_redirect(&response, "/");

        assert!(server
            .get("/")
            .await
            .text()
            .contains(GOOGLE_EMAIL_TAKEN_MESSAGE));
        assert_redirect(&server.get("/main").await, "/");

        assert_eq!(db.count_users().unwrap(), 1);
        let local = db.find_user_by_username("alice@example.com").unwrap().unwrap();
        assert!(local.google_id.is_none());
    }
}
