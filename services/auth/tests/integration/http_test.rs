//! End-to-end tests: the real router over an in-memory SQLite pool.

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use chrono::Utc;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, EntityTrait};
use serde_json::{Value, json};

use ases_auth::config::SmtpConfig;
use ases_auth::domain::repository::AccountRepository;
use ases_auth::domain::types::{Account, OtpChallenge};
use ases_auth::error::AuthServiceError;
use ases_auth::infra::db::DbAccountRepository;
use ases_auth::infra::mail::{LogNotifier, Notifier, SmtpNotifier};
use ases_auth::router::build_router;
use ases_auth::state::AppState;
use ases_auth::usecase::otp::{IssueOtpInput, IssueOtpUseCase};
use ases_auth_migration::{Migrator, MigratorTrait};
use ases_auth_schema::accounts;
use ases_auth_types::identity::SessionSecret;
use ases_domain::account::Role;
use ases_testing::auth::{TestSession, bearer_header, now_secs};
use ases_testing::fixture::{Fixture, assert_subset};

use crate::helpers::{
    ActivatedAfterLookup, MAIL_TIMEOUT, TEST_JWT_SECRET, TEST_PASSWORD, test_account,
};

// ── Harness ──────────────────────────────────────────────────────────────────

async fn test_db() -> DatabaseConnection {
    // One connection: every request queues on it, so a leak would hang the next one.
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(2))
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

fn server(db: &DatabaseConnection, notifier: Notifier) -> TestServer {
    let state = AppState {
        db: db.clone(),
        session_secret: SessionSecret::new(TEST_JWT_SECRET),
        notifier,
        mail_timeout: Duration::from_secs(5),
    };
    TestServer::new(build_router(state)).unwrap()
}

fn unreachable_relay() -> Notifier {
    let config = SmtpConfig {
        host: "127.0.0.1".to_owned(),
        port: 1,
        username: None,
        password: None,
        use_tls: false,
    };
    let smtp = SmtpNotifier::new(
        &config,
        "no-reply@ases.local",
        "ASESystem - No Reply",
        Duration::from_secs(2),
    )
    .unwrap();
    Notifier::Smtp(Arc::new(smtp))
}

async fn seed(db: &DatabaseConnection, account: &Account) {
    DbAccountRepository { db: db.clone() }
        .create(account)
        .await
        .unwrap();
}

async fn stored(db: &DatabaseConnection, email: &str) -> accounts::Model {
    use sea_orm::{ColumnTrait, QueryFilter};
    accounts::Entity::find()
        .filter(accounts::Column::Email.eq(email))
        .one(db)
        .await
        .unwrap()
        .expect("account row")
}

fn auth(token: &str) -> (HeaderName, HeaderValue) {
    bearer_header(token)
}

/// Rows every contract fixture runs against.
async fn seed_contract_accounts(db: &DatabaseConnection) {
    let mut admin = test_account("admin@co.com", true);
    admin.role = Role::Admin;
    admin.password_hash = hash("adminpass");
    seed(db, &admin).await;

    let mut bob = test_account("bob@co.com", false);
    bob.full_name = "Bob Builder".to_owned();
    bob.password_hash = hash("bobpass1");
    bob.pending_otp = Some(OtpChallenge::new("482193".to_owned(), Utc::now()));
    seed(db, &bob).await;
}

fn hash(password: &str) -> String {
    use argon2::password_hash::rand_core::OsRng;
    use argon2::password_hash::{PasswordHasher, SaltString};
    let salt = SaltString::generate(&mut OsRng);
    argon2::Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .unwrap()
        .to_string()
}

// ── Scenarios ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_walk_registration_through_dashboard_login() {
    let db = test_db().await;
    let server = server(&db, Notifier::Log(LogNotifier));

    let res = server
        .post("/register")
        .json(&json!({
            "full_name": "Alice Example",
            "position": "Engineer",
            "employee_id": "E-1001",
            "email": "alice@co.com",
            "password": TEST_PASSWORD,
        }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);

    let row = stored(&db, "alice@co.com").await;
    assert!(!row.is_active);
    assert_eq!(row.otp.as_deref().map(str::len), Some(6));

    // Pin the live code to a known value, as if read from the mail.
    let pinned = DbAccountRepository { db: db.clone() }
        .store_otp(
            row.id.into(),
            &OtpChallenge::new("482193".to_owned(), Utc::now()),
            Utc::now(),
        )
        .await
        .unwrap();
    assert!(pinned);

    let res = server
        .post("/login")
        .json(&json!({"email": "alice@co.com", "password": TEST_PASSWORD}))
        .await;
    assert_eq!(res.status_code(), StatusCode::FORBIDDEN);

    let res = server
        .post("/verify-otp")
        .json(&json!({"email": "alice@co.com", "otp": "482194"}))
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>()["kind"], "INVALID_OTP");

    let res = server
        .post("/verify-otp")
        .json(&json!({"email": "alice@co.com", "otp": "482193"}))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(
        res.json::<Value>(),
        json!({"success": true, "message": "OTP verified successfully"})
    );

    let row = stored(&db, "alice@co.com").await;
    assert!(row.is_active);
    assert!(row.otp.is_none());
    assert!(row.otp_expires_at.is_none());

    let res = server
        .post("/verify-otp")
        .json(&json!({"email": "alice@co.com", "otp": "482193"}))
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);

    let res = server
        .post("/login")
        .json(&json!({"email": "alice@co.com", "password": TEST_PASSWORD}))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let body = res.json::<Value>();
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"].get("password_hash").is_none());
    let token = body["token"].as_str().unwrap().to_owned();

    let (name, value) = auth(&token);
    let res = server.get("/me").add_header(name, value).await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(res.json::<Value>()["user"]["email"], "alice@co.com");

    let (name, value) = auth(&token);
    let res = server
        .patch("/me")
        .add_header(name, value)
        .json(&json!({"position": "Team Lead", "language": "ar"}))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let user = &res.json::<Value>()["user"];
    assert_eq!(user["position"], "Team Lead");
    assert_eq!(user["language"], "ar");
    assert_eq!(stored(&db, "alice@co.com").await.position, "Team Lead");
}

#[tokio::test]
async fn should_satisfy_auth_contracts() {
    for fixture in Fixture::load_service("auth") {
        let db = test_db().await;
        seed_contract_accounts(&db).await;
        let server = server(&db, Notifier::Log(LogNotifier));

        let path = fixture.request.path.as_str();
        let mut request = match fixture.request.method.as_str() {
            "GET" => server.get(path),
            "POST" => server.post(path),
            "PATCH" => server.patch(path),
            other => panic!("{}: unsupported method {other}", fixture.id),
        };
        for (key, value) in &fixture.request.headers {
            request = request.add_header(
                HeaderName::from_bytes(key.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        if let Some(ref body) = fixture.request.body {
            request = request.json(body);
        }

        let res = request.await;
        assert_eq!(
            res.status_code().as_u16(),
            fixture.expect.status,
            "{}: {}",
            fixture.id,
            fixture.description
        );
        if let Some(ref expected) = fixture.expect.body {
            assert_subset(expected, &res.json::<Value>());
        }
    }
}

#[tokio::test]
async fn should_not_distinguish_unknown_email_from_wrong_password() {
    let db = test_db().await;
    seed(&db, &test_account("alice@co.com", true)).await;
    let server = server(&db, Notifier::Log(LogNotifier));

    let unknown = server
        .post("/login")
        .json(&json!({"email": "nobody@co.com", "password": TEST_PASSWORD}))
        .await;
    let wrong = server
        .post("/login")
        .json(&json!({"email": "alice@co.com", "password": "wrong-password"}))
        .await;

    assert_eq!(unknown.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.json::<Value>(), wrong.json::<Value>());
}

#[tokio::test]
async fn should_release_connections_after_failed_deliveries() {
    let db = test_db().await;
    seed(&db, &test_account("alice@co.com", true)).await;
    let mut pending = test_account("bob@co.com", false);
    pending.pending_otp = Some(OtpChallenge::new("482193".to_owned(), Utc::now()));
    seed(&db, &pending).await;
    let server = server(&db, unreachable_relay());

    // Pool size is one; each of these takes the connection and then fails.
    for _ in 0..3 {
        let res = server
            .post("/resend-otp")
            .json(&json!({"email": "bob@co.com"}))
            .await;
        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.json::<Value>()["kind"], "DISPATCH_FAILED");

        let res = server
            .post("/resend-otp")
            .json(&json!({"email": "nobody@co.com"}))
            .await;
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    }

    let res = server
        .post("/login")
        .json(&json!({"email": "alice@co.com", "password": TEST_PASSWORD}))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn should_activate_once_under_concurrent_submissions() {
    let db = test_db().await;
    let mut pending = test_account("bob@co.com", false);
    pending.pending_otp = Some(OtpChallenge::new("482193".to_owned(), Utc::now()));
    seed(&db, &pending).await;
    let server = server(&db, Notifier::Log(LogNotifier));

    let body = json!({"email": "bob@co.com", "otp": "482193"});
    let (a, b) = futures::future::join(
        server.post("/verify-otp").json(&body).into_future(),
        server.post("/verify-otp").json(&body).into_future(),
    )
    .await;

    let mut statuses = [a.status_code(), b.status_code()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::BAD_REQUEST]);
    assert!(stored(&db, "bob@co.com").await.is_active);
}

#[tokio::test]
async fn should_keep_code_cleared_when_activation_lands_between_lookup_and_reissue() {
    let db = test_db().await;
    let mut pending = test_account("bob@co.com", false);
    pending.pending_otp = Some(OtpChallenge::new("482193".to_owned(), Utc::now()));
    seed(&db, &pending).await;

    let uc = IssueOtpUseCase {
        accounts: ActivatedAfterLookup {
            inner: DbAccountRepository { db: db.clone() },
        },
        notifier: Notifier::Log(LogNotifier),
        mail_timeout: MAIL_TIMEOUT,
    };
    let result = uc
        .execute(IssueOtpInput {
            email: Some("bob@co.com".to_owned()),
        })
        .await;

    assert!(
        matches!(result, Err(AuthServiceError::AccountAlreadyActive)),
        "got {result:?}"
    );
    let row = stored(&db, "bob@co.com").await;
    assert!(row.is_active);
    assert!(row.otp.is_none(), "active account holds a live code");
    assert!(row.otp_expires_at.is_none());
}

#[tokio::test]
async fn should_reject_expired_code_with_its_own_kind() {
    let db = test_db().await;
    let mut pending = test_account("bob@co.com", false);
    pending.pending_otp = Some(OtpChallenge::new(
        "482193".to_owned(),
        Utc::now() - chrono::Duration::minutes(11),
    ));
    seed(&db, &pending).await;
    let server = server(&db, Notifier::Log(LogNotifier));

    let res = server
        .post("/verify-otp")
        .json(&json!({"email": "bob@co.com", "otp": "482193"}))
        .await;

    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>()["kind"], "OTP_EXPIRED");
    assert!(!stored(&db, "bob@co.com").await.is_active);
}

#[tokio::test]
async fn should_map_malformed_json_to_validation() {
    let db = test_db().await;
    let server = server(&db, Notifier::Log(LogNotifier));

    let res = server.post("/login").text("{not json").await;

    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>();
    assert_eq!(body["success"], false);
    assert_eq!(body["kind"], "VALIDATION");
}

#[tokio::test]
async fn should_reject_expired_session_token() {
    let db = test_db().await;
    let account = test_account("alice@co.com", true);
    seed(&db, &account).await;
    let server = server(&db, Notifier::Log(LogNotifier));

    let session = TestSession::new(account.id, account.role, &account.email);
    let stale = session.token_issued_at(now_secs() - 2 * 86_400, TEST_JWT_SECRET);
    let (name, value) = auth(&stale);
    let res = server.get("/me").add_header(name, value).await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.json::<Value>()["kind"], "INVALID_TOKEN");

    let (name, value) = session.bearer(TEST_JWT_SECRET);
    let res = server.get("/me").add_header(name, value).await;
    assert_eq!(res.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn should_report_health_and_readiness() {
    let db = test_db().await;
    let server = server(&db, Notifier::Log(LogNotifier));

    let res = server.get("/healthz").await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));

    assert_eq!(server.get("/readyz").await.status_code(), StatusCode::OK);

    db.clone().close().await.unwrap();
    assert_eq!(
        server.get("/readyz").await.status_code(),
        StatusCode::SERVICE_UNAVAILABLE
    );
}
