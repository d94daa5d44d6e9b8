use std::path::PathBuf;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;

use lovewall::config::Config;
use lovewall::db;
use lovewall::routes;
use lovewall::state::{AppState, DbPool};

const PASSWORD: &str = "correct-horse-9";
const BOUNDARY: &str = "lovewall-test-boundary";

struct Site {
    _dir: TempDir,
    app: Router,
    pool: DbPool,
    uploads: PathBuf,
}

impl Site {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = Config::for_data_dir(dir.path());
        config.auth.bcrypt_cost = 4;
        let uploads = config.uploads_path();
        std::fs::create_dir_all(&uploads).unwrap();

        let pool = db::create_pool(&config.db_path()).expect("Failed to create test database");
        db::run_migrations(&pool).expect("Failed to run migrations");
        let app = routes::app(AppState::new(pool.clone(), config));

        Site {
            _dir: dir,
            app,
            pool,
            uploads,
        }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::get(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn post_form(&self, uri: &str, cookie: Option<&str>, pairs: &[(&str, &str)]) -> Response {
        let body = pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let mut builder = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    async fn post_multipart(
        &self,
        uri: &str,
        cookie: &str,
        fields: &[(&str, &str)],
        files: &[(&str, &str, Vec<u8>)],
    ) -> Response {
        let request = Request::post(uri)
            .header(header::COOKIE, cookie)
            .header("x-requested-with", "XMLHttpRequest")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(fields, files)))
            .unwrap();
        self.send(request).await
    }

    async fn post_json(&self, uri: &str, cookie: &str, body: &str) -> Response {
        let request = Request::post(uri)
            .header(header::COOKIE, cookie)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Sign up `username` and return the session cookie to send back.
    async fn signup(&self, username: &str) -> String {
        let email = format!("{}@example.com", username);
        let response = self
            .post_form(
                "/accounts/signup/",
                None,
                &[
                    ("username", username),
                    ("email", &email),
                    ("first_name", "Test"),
                    ("last_name", "User"),
                    ("birth_date", "1990-02-14"),
                    ("password1", PASSWORD),
                    ("password2", PASSWORD),
                ],
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "signup failed");
        session_cookie(&response)
    }

    async fn create_wall(&self, cookie: &str, title: &str, custom_url: &str) -> Response {
        self.post_form(
            "/wall/create/",
            Some(cookie),
            &[
                ("title", title),
                ("theme", ""),
                ("custom_url", custom_url),
                ("is_public", "on"),
            ],
        )
        .await
    }

    fn scalar(&self, sql: &str, params: &[&str]) -> String {
        let conn = self.pool.get().unwrap();
        conn.query_row(sql, rusqlite::params_from_iter(params.iter()), |row| {
            row.get(0)
        })
        .unwrap()
    }

    fn count(&self, sql: &str, params: &[&str]) -> i64 {
        let conn = self.pool.get().unwrap();
        conn.query_row(sql, rusqlite::params_from_iter(params.iter()), |row| {
            row.get(0)
        })
        .unwrap()
    }

    fn execute(&self, sql: &str) {
        self.pool.get().unwrap().execute_batch(sql).unwrap();
    }

    /// Files currently stored under one uploads subdirectory.
    fn stored_files(&self, subdir: &str) -> usize {
        match std::fs::read_dir(self.uploads.join(subdir)) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }

    fn wall_id(&self, custom_url: &str) -> String {
        self.scalar(
            "SELECT id FROM message_walls WHERE custom_url = ?",
            &[custom_url],
        )
    }

    fn message_id(&self, content: &str) -> String {
        self.scalar("SELECT id FROM messages WHERE content = ?", &[content])
    }

    /// Post a message from the holder of `cookie` onto `wall_id`.
    async fn post_message(&self, cookie: &str, wall_id: &str, content: &str, public: bool) {
        let mut fields = vec![
            ("content", content),
            ("theme", ""),
            ("background_color", "#ffffff"),
            ("font_style", "Arial"),
        ];
        if public {
            fields.push(("is_public", "on"));
        }
        let response = self
            .post_multipart(&format!("/message/create/{}/", wall_id), cookie, &fields, &[])
            .await;
        assert_eq!(response.status(), StatusCode::OK, "message post failed");
    }
}

fn urlencode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            b' ' => "+".to_string(),
            _ => format!("%{:02X}", b),
        })
        .collect()
}

fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str, Vec<u8>)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    for (name, file_name, data) in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, name, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn session_cookie(response: &Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("no session cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("no redirect")
        .to_str()
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn signup_logs_in_and_login_issues_a_new_session() {
    let site = Site::new();
    let cookie = site.signup("alice").await;
    assert!(cookie.starts_with("lovewall_session="));

    let dashboard = site.get("/users/dashboard/", Some(&cookie)).await;
    assert_eq!(dashboard.status(), StatusCode::OK);
    assert!(body_text(dashboard).await.contains("Dashboard"));

    let bad = site
        .post_form(
            "/accounts/login/",
            None,
            &[("username", "alice"), ("password", "wrong-password")],
        )
        .await;
    assert_eq!(bad.status(), StatusCode::OK);
    assert!(bad.headers().get(header::SET_COOKIE).is_none());

    let good = site
        .post_form(
            "/accounts/login/",
            None,
            &[("username", "alice"), ("password", PASSWORD)],
        )
        .await;
    assert_eq!(good.status(), StatusCode::SEE_OTHER);
    assert!(session_cookie(&good).starts_with("lovewall_session="));
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let site = Site::new();
    site.signup("alice").await;

    let response = site
        .post_form(
            "/accounts/signup/",
            None,
            &[
                ("username", "alice"),
                ("email", "other@example.com"),
                ("first_name", "Other"),
                ("last_name", "Person"),
                ("birth_date", "1991-03-01"),
                ("password1", PASSWORD),
                ("password2", PASSWORD),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(site.count("SELECT COUNT(*) FROM users", &[]), 1);
}

#[tokio::test]
async fn anonymous_visitors_are_sent_to_login() {
    let site = Site::new();

    for path in ["/timeline/", "/wall/create/", "/users/profile/"] {
        let response = site.get(path, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{}", path);
        assert_eq!(location(&response), format!("/accounts/login/?next={}", path));
    }

    let public = site.get("/gallery/", None).await;
    assert_eq!(public.status(), StatusCode::OK);
}

#[tokio::test]
async fn wall_addresses_are_unique() {
    let site = Site::new();
    let alice = site.signup("alice").await;
    let bob = site.signup("bob").await;

    let created = site.create_wall(&alice, "Our Story", "").await;
    assert_eq!(created.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&created), "/wall/our-story/");

    let clash = site.create_wall(&bob, "Another Story", "our-story").await;
    assert_eq!(clash.status(), StatusCode::OK);
    assert!(body_text(clash)
        .await
        .contains("Message wall with this Custom url already exists."));
    assert_eq!(site.count("SELECT COUNT(*) FROM message_walls", &[]), 1);

    let page = site.get("/wall/our-story/", None).await;
    assert_eq!(page.status(), StatusCode::OK);
    assert!(body_text(page).await.contains("Our Story"));
}

#[tokio::test]
async fn only_owners_and_authors_can_edit() {
    let site = Site::new();
    let alice = site.signup("alice").await;
    let bob = site.signup("bob").await;

    site.create_wall(&alice, "Alice's wall", "alice-wall").await;
    let wall_id = site.wall_id("alice-wall");
    site.post_message(&bob, &wall_id, "Happy birthday!", true).await;
    let message_id = site.message_id("Happy birthday!");

    let wall_edit = site.get("/wall/alice-wall/edit/", Some(&bob)).await;
    assert_eq!(wall_edit.status(), StatusCode::NOT_FOUND);
    let wall_delete = site.post_form("/wall/alice-wall/delete/", Some(&bob), &[]).await;
    assert_eq!(wall_delete.status(), StatusCode::NOT_FOUND);

    let message_edit = site
        .get(&format!("/message/{}/edit/", message_id), Some(&alice))
        .await;
    assert_eq!(message_edit.status(), StatusCode::NOT_FOUND);

    let own_edit = site
        .get(&format!("/message/{}/edit/", message_id), Some(&bob))
        .await;
    assert_eq!(own_edit.status(), StatusCode::OK);

    // Owning the wall does not make alice the author.
    let rewrite = site
        .post_multipart(
            &format!("/message/{}/edit/", message_id),
            &alice,
            &[("content", "Rewritten"), ("background_color", "#000000")],
            &[],
        )
        .await;
    assert_eq!(rewrite.status(), StatusCode::NOT_FOUND);
    let removal = site
        .post_form(&format!("/message/{}/delete/", message_id), Some(&alice), &[])
        .await;
    assert_eq!(removal.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        site.scalar("SELECT content FROM messages WHERE id = ?", &[&message_id]),
        "Happy birthday!"
    );

    // The wall owner receives the message.
    let alice_id = site.scalar("SELECT id FROM users WHERE username = 'alice'", &[]);
    let recipient = site.scalar("SELECT recipient_id FROM messages WHERE id = ?", &[&message_id]);
    assert_eq!(recipient, alice_id);
}

#[tokio::test]
async fn invalid_ajax_message_gets_json_errors() {
    let site = Site::new();
    let alice = site.signup("alice").await;
    site.create_wall(&alice, "Wall", "wall").await;
    let wall_id = site.wall_id("wall");

    let response = site
        .post_multipart(
            &format!("/message/create/{}/", wall_id),
            &alice,
            &[("content", ""), ("background_color", "#ffffff")],
            &[],
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["status"], "error");
    assert!(json["errors"]["content"].is_array());
}

#[tokio::test]
async fn position_updates_check_the_author() {
    let site = Site::new();
    let alice = site.signup("alice").await;
    let bob = site.signup("bob").await;

    site.create_wall(&alice, "Wall", "wall").await;
    let wall_id = site.wall_id("wall");
    site.post_message(&bob, &wall_id, "Drag me", true).await;
    let message_id = site.message_id("Drag me");

    let url = "/api/update-message-position/";
    let body = format!(r#"{{"message_id":"{}","position":3}}"#, message_id);

    let forbidden = site.post_json(url, &alice, &body).await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let missing = site
        .post_json(url, &bob, r#"{"message_id":"nope","position":1}"#)
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let malformed = site.post_json(url, &bob, "not json").await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);

    let ok = site.post_json(url, &bob, &body).await;
    assert_eq!(ok.status(), StatusCode::OK);
    assert_eq!(body_json(ok).await["status"], "success");
    assert_eq!(
        site.count("SELECT position FROM messages WHERE id = ?", &[&message_id]),
        3
    );

    let wrong_method = site.get(url, Some(&bob)).await;
    assert_eq!(wrong_method.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn media_uploads_are_capped_at_five_megabytes() {
    let site = Site::new();
    let alice = site.signup("alice").await;
    let url = "/api/upload-media/";

    let too_big = site
        .post_multipart(url, &alice, &[], &[("file", "big.png", vec![0u8; 6 * 1024 * 1024])])
        .await;
    assert_eq!(too_big.status(), StatusCode::BAD_REQUEST);

    let missing = site.post_multipart(url, &alice, &[], &[]).await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let ok = site
        .post_multipart(url, &alice, &[], &[("file", "small.png", vec![0u8; 4 * 1024 * 1024])])
        .await;
    assert_eq!(ok.status(), StatusCode::OK);
    let json = body_json(ok).await;
    assert_eq!(json["status"], "success");
    assert!(json["file_url"]
        .as_str()
        .unwrap()
        .starts_with("/media/attachments/"));
    assert_eq!(site.count("SELECT COUNT(*) FROM media_attachments", &[]), 1);
}

#[tokio::test]
async fn search_only_finds_public_messages() {
    let site = Site::new();
    let alice = site.signup("alice").await;
    site.create_wall(&alice, "Wall", "wall").await;
    let wall_id = site.wall_id("wall");

    site.post_message(&alice, &wall_id, "sunshine forever", true).await;
    site.post_message(&alice, &wall_id, "secret moonlight", false).await;

    let found = body_text(site.get("/search/?q=sunshine", None).await).await;
    assert!(found.contains("sunshine forever"));

    let hidden = body_text(site.get("/search/?q=moonlight", None).await).await;
    assert!(!hidden.contains("secret moonlight"));

    // A blank search lists every public message.
    let blank = body_text(site.get("/search/?q=+", None).await).await;
    assert!(blank.contains("sunshine forever"));
    assert!(!blank.contains("secret moonlight"));
}

#[tokio::test]
async fn deleting_an_account_removes_everything_it_owns() {
    let site = Site::new();
    let alice = site.signup("alice").await;
    let bob = site.signup("bob").await;

    site.create_wall(&alice, "Wall", "wall").await;
    let wall_id = site.wall_id("wall");
    site.post_message(&bob, &wall_id, "From bob", true).await;
    site.post_message(&alice, &wall_id, "From alice", true).await;
    site.post_form(
        "/special-dates/create/",
        Some(&alice),
        &[("title", "Anniversary"), ("date", "2020-06-01")],
    )
    .await;
    site.post_multipart(
        "/timeline/create/",
        &alice,
        &[("title", "First trip"), ("description", "Lisbon"), ("date", "2021-05-02")],
        &[("image", "trip.jpg", vec![0xff, 0xd8, 0xff, 0xe0])],
    )
    .await;
    site.post_multipart(
        "/api/upload-media/",
        &alice,
        &[],
        &[("file", "loose.png", vec![1u8; 8])],
    )
    .await;
    let alice_id = site.scalar("SELECT id FROM users WHERE username = 'alice'", &[]);
    assert_eq!(site.count("SELECT COUNT(*) FROM timelines", &[]), 1);
    assert_eq!(site.count("SELECT COUNT(*) FROM special_dates", &[]), 1);
    assert_eq!(site.count("SELECT COUNT(*) FROM media_attachments", &[]), 1);

    let refused = site
        .post_form("/users/delete/", Some(&alice), &[("password", PASSWORD)])
        .await;
    assert_eq!(refused.status(), StatusCode::OK);
    assert_eq!(site.count("SELECT COUNT(*) FROM users", &[]), 2);

    let deleted = site
        .post_form(
            "/users/delete/",
            Some(&alice),
            &[("confirmation", "on"), ("password", PASSWORD)],
        )
        .await;
    assert_eq!(deleted.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&deleted), "/");

    assert_eq!(site.count("SELECT COUNT(*) FROM users", &[]), 1);
    assert_eq!(site.count("SELECT COUNT(*) FROM message_walls", &[]), 0);
    assert_eq!(site.count("SELECT COUNT(*) FROM messages", &[]), 0);
    assert_eq!(site.count("SELECT COUNT(*) FROM timelines", &[]), 0);
    assert_eq!(site.count("SELECT COUNT(*) FROM special_dates", &[]), 0);
    assert_eq!(site.count("SELECT COUNT(*) FROM media_attachments", &[]), 0);
    for table in ["user_profiles", "sessions"] {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE user_id = ?", table);
        assert_eq!(site.count(&sql, &[&alice_id]), 0, "{}", table);
    }
    assert_eq!(site.count("SELECT COUNT(*) FROM sessions", &[]), 1);

    let after = site.get("/users/dashboard/", Some(&alice)).await;
    assert_eq!(after.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn timeline_and_special_dates_are_private() {
    let site = Site::new();
    let alice = site.signup("alice").await;
    let bob = site.signup("bob").await;

    let created = site
        .post_form(
            "/special-dates/create/",
            Some(&alice),
            &[("title", "Anniversary"), ("date", "2020-06-01"), ("reminder", "on")],
        )
        .await;
    assert_eq!(created.status(), StatusCode::SEE_OTHER);
    let date_id = site.scalar("SELECT id FROM special_dates", &[]);

    let mine = body_text(site.get("/special-dates/", Some(&alice)).await).await;
    assert!(mine.contains("Anniversary"));
    let theirs = body_text(site.get("/special-dates/", Some(&bob)).await).await;
    assert!(!theirs.contains("Anniversary"));

    let edit = site
        .get(&format!("/special-dates/{}/edit/", date_id), Some(&bob))
        .await;
    assert_eq!(edit.status(), StatusCode::NOT_FOUND);

    let memory = site
        .post_multipart(
            "/timeline/create/",
            &alice,
            &[("title", "First trip"), ("description", "Lisbon"), ("date", "2021-05-02")],
            &[("image", "trip.jpg", vec![0xff, 0xd8, 0xff, 0xe0])],
        )
        .await;
    assert_eq!(memory.status(), StatusCode::SEE_OTHER);
    let entry_id = site.scalar("SELECT id FROM timelines", &[]);

    let foreign = site.get(&format!("/timeline/{}/", entry_id), Some(&bob)).await;
    assert_eq!(foreign.status(), StatusCode::NOT_FOUND);
    let own = site.get(&format!("/timeline/{}/", entry_id), Some(&alice)).await;
    assert_eq!(own.status(), StatusCode::OK);
}

#[tokio::test]
async fn strangers_cannot_change_personal_records() {
    let site = Site::new();
    let alice = site.signup("alice").await;
    let bob = site.signup("bob").await;

    site.post_form(
        "/special-dates/create/",
        Some(&alice),
        &[("title", "Anniversary"), ("date", "2020-06-01")],
    )
    .await;
    let date_id = site.scalar("SELECT id FROM special_dates", &[]);
    site.post_multipart(
        "/timeline/create/",
        &alice,
        &[("title", "First trip"), ("description", "Lisbon"), ("date", "2021-05-02")],
        &[("image", "trip.jpg", vec![0xff, 0xd8, 0xff, 0xe0])],
    )
    .await;
    let entry_id = site.scalar("SELECT id FROM timelines", &[]);

    let date_edit = site
        .post_form(
            &format!("/special-dates/{}/edit/", date_id),
            Some(&bob),
            &[("title", "Hijacked"), ("date", "2020-06-02")],
        )
        .await;
    assert_eq!(date_edit.status(), StatusCode::NOT_FOUND);
    let date_delete = site
        .post_form(&format!("/special-dates/{}/delete/", date_id), Some(&bob), &[])
        .await;
    assert_eq!(date_delete.status(), StatusCode::NOT_FOUND);

    let entry_edit = site
        .post_multipart(
            &format!("/timeline/{}/edit/", entry_id),
            &bob,
            &[("title", "Hijacked"), ("description", ""), ("date", "2021-05-03")],
            &[],
        )
        .await;
    assert_eq!(entry_edit.status(), StatusCode::NOT_FOUND);
    let entry_delete = site
        .post_form(&format!("/timeline/{}/delete/", entry_id), Some(&bob), &[])
        .await;
    assert_eq!(entry_delete.status(), StatusCode::NOT_FOUND);

    assert_eq!(
        site.scalar("SELECT title FROM special_dates WHERE id = ?", &[&date_id]),
        "Anniversary"
    );
    assert_eq!(
        site.scalar("SELECT title FROM timelines WHERE id = ?", &[&entry_id]),
        "First trip"
    );
}

#[tokio::test]
async fn message_attachments_are_capped_and_tagged() {
    let site = Site::new();
    let alice = site.signup("alice").await;
    site.create_wall(&alice, "Wall", "wall").await;
    let url = format!("/message/create/{}/", site.wall_id("wall"));
    let fields = [("content", "With a photo"), ("is_public", "on")];

    let too_big = site
        .post_multipart(
            &url,
            &alice,
            &fields,
            &[("media_files", "big.JPG", vec![0u8; 6 * 1024 * 1024])],
        )
        .await;
    assert_eq!(too_big.status(), StatusCode::BAD_REQUEST);
    let json = body_json(too_big).await;
    assert_eq!(json["errors"]["media_files"][0], "Each file must be less than 5MB");
    assert_eq!(site.count("SELECT COUNT(*) FROM messages", &[]), 0);

    let ok = site
        .post_multipart(
            &url,
            &alice,
            &fields,
            &[
                ("media_files", "photo.JPG", vec![0u8; 4 * 1024 * 1024]),
                ("media_files", "song.mp3", vec![1u8; 16]),
            ],
        )
        .await;
    assert_eq!(ok.status(), StatusCode::OK);
    assert_eq!(
        site.count("SELECT COUNT(*) FROM media_attachments WHERE kind = 'image'", &[]),
        1
    );
    assert_eq!(
        site.count("SELECT COUNT(*) FROM media_attachments WHERE kind = 'audio'", &[]),
        1
    );
}

#[tokio::test]
async fn upload_endpoint_answers_unreadable_bodies_with_json() {
    let site = Site::new();
    let alice = site.signup("alice").await;
    let url = "/api/upload-media/";

    let not_multipart = site.post_json(url, &alice, "{}").await;
    assert_eq!(not_multipart.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(not_multipart).await["status"], "error");

    let truncated = Request::post(url)
        .header(header::COOKIE, &alice)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.png\"\r\n\r\nhalf a fi",
            BOUNDARY
        )))
        .unwrap();
    let truncated = site.send(truncated).await;
    assert_eq!(truncated.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(truncated).await["status"], "error");

    assert_eq!(site.count("SELECT COUNT(*) FROM media_attachments", &[]), 0);
    assert_eq!(site.stored_files("attachments"), 0);
}

#[tokio::test]
async fn failed_writes_leave_no_stray_uploads() {
    let site = Site::new();
    let alice = site.signup("alice").await;
    site.create_wall(&alice, "Wall", "wall").await;
    let wall_id = site.wall_id("wall");
    site.execute("DROP TABLE media_attachments; DROP TABLE timelines;");

    let upload = site
        .post_multipart("/api/upload-media/", &alice, &[], &[("file", "a.png", vec![1u8; 8])])
        .await;
    assert_eq!(upload.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let message = site
        .post_multipart(
            &format!("/message/create/{}/", wall_id),
            &alice,
            &[("content", "With a photo"), ("is_public", "on")],
            &[
                ("media_files", "photo.png", vec![1u8; 8]),
                ("media_files", "song.mp3", vec![2u8; 8]),
            ],
        )
        .await;
    assert_eq!(message.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(site.count("SELECT COUNT(*) FROM messages", &[]), 0);
    assert_eq!(site.stored_files("attachments"), 0);

    let memory = site
        .post_multipart(
            "/timeline/create/",
            &alice,
            &[("title", "First trip"), ("description", "Lisbon"), ("date", "2021-05-02")],
            &[("image", "trip.jpg", vec![0xff, 0xd8, 0xff, 0xe0])],
        )
        .await;
    assert_eq!(memory.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(site.stored_files("timeline"), 0);
}

#[tokio::test]
async fn category_filter_keeps_odd_names_in_one_segment() {
    let site = Site::new();
    let alice = site.signup("alice").await;
    site.create_wall(&alice, "Wall", "wall").await;
    let url = format!("/message/create/{}/", site.wall_id("wall"));

    for n in 0..13 {
        let content = format!("note {}", n);
        let response = site
            .post_multipart(
                &url,
                &alice,
                &[
                    ("content", &content),
                    ("is_public", "on"),
                    ("category", "long distance/us?"),
                ],
                &[],
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let gallery = body_text(site.get("/gallery/", None).await)
        .await
        .replace("&#x2f;", "/");
    assert!(gallery.contains("/filter/long%20distance%2Fus%3F/"));

    let page = site.get("/filter/long%20distance%2Fus%3F/", None).await;
    assert_eq!(page.status(), StatusCode::OK);
    let page = body_text(page).await.replace("&#x2f;", "/");
    assert!(page.contains("Category: long distance/us?"));
    assert!(page.contains("/filter/long%20distance%2Fus%3F/?page=2"));
}
