//! Tests against a running server with a migrated database.
//!
//! Expects the bootstrap administrator `admin` / `admin`
//! (`LOCALLIBRARY_AUTH__ADMIN_LOGIN`, `LOCALLIBRARY_AUTH__ADMIN_PASSWORD`).

use chrono::{Duration, Utc};
use reqwest::{redirect::Policy, Client, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

use locallibrary_server::{
    models::user::{AccountTypeSlug, NewUser},
    repository::Repository,
    services::users::hash_password,
    AppConfig,
};

const BASE_URL: &str = "http://localhost:8080";

/// Client that reports redirects instead of following them
fn client() -> Client {
    Client::builder()
        .redirect(Policy::none())
        .build()
        .expect("Failed to build client")
}

const READER_PASSWORD: &str = "reader-password";

/// Helper to get an authenticated client
async fn get_auth_token(client: &Client) -> String {
    login(client, "admin", "admin").await
}

async fn login(client: &Client, username: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/accounts/login/", BASE_URL))
        .json(&json!({
            "username": username,
            "password": password
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Creates a reader account straight in the server's database.
///
/// Returns the login and the user id.
async fn create_reader() -> (String, i64) {
    let config = AppConfig::load().expect("Failed to load configuration");
    let pool = sqlx::PgPool::connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    let login = format!("reader-{}", Uuid::new_v4().simple());
    let user = Repository::new(pool)
        .users
        .create(&NewUser {
            login: login.clone(),
            password: hash_password(READER_PASSWORD).expect("Failed to hash password"),
            first_name: String::new(),
            last_name: login.clone(),
            account_type: AccountTypeSlug::Reader,
        })
        .await
        .expect("Failed to create reader");
    (login, user.id as i64)
}

/// Creates an author and a book by them, returning their ids
async fn create_book(client: &Client, token: &str) -> (String, String) {
    let response = client
        .post(format!("{}/author/create/", BASE_URL))
        .bearer_auth(token)
        .form(&[("first_name", "Ursula"), ("last_name", "Le Guin")])
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let author_id = location(&response).trim_start_matches("/author/").to_string();

    let response = client
        .post(format!("{}/book/create/", BASE_URL))
        .bearer_auth(token)
        .form(&[
            ("title", "The Dispossessed"),
            ("summary", "An ambiguous utopia"),
            ("isbn", "9780061054884"),
            ("genre", "2"),
            ("language", "1"),
            ("author", author_id.as_str()),
        ])
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let book_id = location(&response).trim_start_matches("/book/").to_string();

    (author_id, book_id)
}

async fn create_copy(client: &Client, token: &str, book_id: &str) -> String {
    let response = client
        .post(format!("{}/bookinstance/create/", BASE_URL))
        .bearer_auth(token)
        .form(&[("book", book_id), ("imprint", "Harper, 1974"), ("status", "a")])
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_str().expect("No copy id").to_string()
}

async fn lend(client: &Client, token: &str, copy: &str, borrower: i64, days: i64) -> Value {
    let due_back = (Utc::now().date_naive() + Duration::days(days)).format("%Y-%m-%d").to_string();
    let response = client
        .post(format!("{}/bookinstance/{}/lend/", BASE_URL, copy))
        .bearer_auth(token)
        .form(&[("borrower", borrower.to_string()), ("due_back", due_back)])
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    response.json().await.expect("Failed to parse response")
}

/// Every row of a paginated view, walking all its pages
async fn all_pages(client: &Client, token: &str, path: &str) -> Vec<Value> {
    let mut items = Vec::new();
    let mut page = 1;
    loop {
        let response = client
            .get(format!("{}{}?page={}", BASE_URL, path, page))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.expect("Failed to parse response");
        items.extend(body["items"].as_array().cloned().unwrap_or_default());
        if page >= body["num_pages"].as_i64().expect("No page count") {
            return items;
        }
        page += 1;
    }
}

fn ids(items: &[Value]) -> Vec<&str> {
    items.iter().filter_map(|item| item["id"].as_str()).collect()
}

fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let response = client()
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_ready() {
    let response = client()
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore]
async fn test_login() {
    let response = client()
        .post(format!("{}/accounts/login/", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let response = client()
        .post(format!("{}/accounts/login/", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_my_books_redirects_to_login() {
    let response = client()
        .get(format!("{}/mybooks/", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/accounts/login/?next=%2Fmybooks%2F");
}

#[tokio::test]
#[ignore]
async fn test_index_counts_visits() {
    let client = client();
    let token = get_auth_token(&client).await;

    let mut visits = Vec::new();
    for _ in 0..2 {
        let response = client
            .get(format!("{}/", BASE_URL))
            .bearer_auth(&token)
            .send()
            .await
            .expect("Failed to send request");
        assert!(response.status().is_success());
        let body: Value = response.json().await.expect("Failed to parse response");
        visits.push(body["num_visits"].as_i64().expect("No visit count"));
    }

    assert_eq!(visits, vec![0, 1]);
}

#[tokio::test]
#[ignore]
async fn test_author_lifecycle() {
    let client = client();
    let token = get_auth_token(&client).await;

    let response = client
        .post(format!("{}/author/create/", BASE_URL))
        .bearer_auth(&token)
        .form(&[
            ("first_name", "Octavia"),
            ("last_name", "Butler"),
            ("date_of_birth", "1947-06-22"),
            ("date_of_death", "2006-02-24"),
        ])
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let author_url = location(&response);
    assert!(author_url.starts_with("/author/"));

    let response = client
        .get(format!("{}{}", BASE_URL, author_url))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["display_name"], "Butler, Octavia");

    let response = client
        .post(format!("{}{}/delete", BASE_URL, author_url))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/authors/");

    let response = client
        .get(format!("{}{}", BASE_URL, author_url))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_book_form_rejects_short_isbn() {
    let client = client();
    let token = get_auth_token(&client).await;

    let response = client
        .post(format!("{}/book/create/", BASE_URL))
        .bearer_auth(&token)
        .body("title=Dawn&summary=Xenogenesis&isbn=123&genre=1&genre=2&language=1&author=1")
        .header(reqwest::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["fields"]["isbn"].is_array());
}

#[tokio::test]
#[ignore]
async fn test_renew_unknown_copy() {
    let client = client();
    let token = get_auth_token(&client).await;

    let response = client
        .post(format!("{}/book/{}/renew/", BASE_URL, uuid::Uuid::new_v4()))
        .bearer_auth(&token)
        .form(&[("renewal_date", "2030-01-01")])
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_my_books_lists_own_loans_by_due_date() {
    let client = client();
    let token = get_auth_token(&client).await;
    let (_, book_id) = create_book(&client, &token).await;

    let (reader_login, reader_id) = create_reader().await;
    let (_, other_id) = create_reader().await;

    let later = create_copy(&client, &token, &book_id).await;
    let sooner = create_copy(&client, &token, &book_id).await;
    let other = create_copy(&client, &token, &book_id).await;
    let shelved = create_copy(&client, &token, &book_id).await;

    lend(&client, &token, &later, reader_id, 20).await;
    lend(&client, &token, &sooner, reader_id, 5).await;
    lend(&client, &token, &other, other_id, 1).await;

    let reader_token = login(&client, &reader_login, READER_PASSWORD).await;
    let mine = all_pages(&client, &reader_token, "/mybooks/").await;
    assert_eq!(ids(&mine), vec![sooner.as_str(), later.as_str()]);
    assert!(mine.iter().all(|item| item["borrower_id"] == reader_id));
    assert!(mine.iter().all(|item| item["status"] == "on_loan"));

    let all = all_pages(&client, &token, "/allbooks/").await;
    let ours: Vec<&str> = ids(&all)
        .into_iter()
        .filter(|id| [&later, &sooner, &other, &shelved].iter().any(|copy| copy.as_str() == *id))
        .collect();
    assert_eq!(ours, vec![other.as_str(), sooner.as_str(), later.as_str()]);
    assert!(all.iter().all(|item| item["due_back"].is_string()));
}

#[tokio::test]
#[ignore]
async fn test_lend_and_return_update_copy() {
    let client = client();
    let token = get_auth_token(&client).await;
    let (_, book_id) = create_book(&client, &token).await;
    let (_, reader_id) = create_reader().await;
    let copy = create_copy(&client, &token, &book_id).await;

    let lent = lend(&client, &token, &copy, reader_id, 7).await;
    assert_eq!(lent["status"], "on_loan");
    assert_eq!(lent["borrower_id"], reader_id);
    assert!(lent["due_back"].is_string());

    // Already on loan
    let response = client
        .post(format!("{}/bookinstance/{}/lend/", BASE_URL, copy))
        .bearer_auth(&token)
        .form(&[
            ("borrower", reader_id.to_string()),
            ("due_back", (Utc::now().date_naive() + Duration::days(7)).to_string()),
        ])
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = client
        .post(format!("{}/bookinstance/{}/return/", BASE_URL, copy))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let returned: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(returned["status"], "available");
    assert!(returned["borrower_id"].is_null());
    assert!(returned["due_back"].is_null());

    let all = all_pages(&client, &token, "/allbooks/").await;
    assert!(!ids(&all).contains(&copy.as_str()));

    let response = client
        .post(format!("{}/bookinstance/{}/return/", BASE_URL, copy))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
#[ignore]
async fn test_deletes_detach_books_and_copies() {
    let client = client();
    let token = get_auth_token(&client).await;
    let (author_id, book_id) = create_book(&client, &token).await;
    let copy = create_copy(&client, &token, &book_id).await;

    let response = client
        .post(format!("{}/author/{}/delete", BASE_URL, author_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = client
        .get(format!("{}/book/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let book: Value = response.json().await.expect("Failed to parse response");
    assert!(book["author"].is_null());
    assert_eq!(ids(book["copies"].as_array().expect("No copies")), vec![copy.as_str()]);

    let response = client
        .post(format!("{}/book/{}/delete", BASE_URL, book_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/books/");

    let response = client
        .get(format!("{}/book/{}/renew/", BASE_URL, copy))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let form: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(form["book_instance"]["id"], copy.as_str());
    assert!(form["book_instance"]["book_id"].is_null());
}
