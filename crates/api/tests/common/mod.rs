#![allow(dead_code)]

use std::sync::Arc;

use admissions_api::auth::jwt::{generate_access_token, JwtConfig};
use admissions_api::auth::password::hash_password;
use admissions_api::config::{AdmissionPolicy, ServerConfig};
use admissions_api::router::build_app_router;
use admissions_api::state::AppState;
use admissions_core::types::{Date, DbId};
use admissions_db::models::admission_period::{AdmissionPeriod, CreateAdmissionPeriod};
use admissions_db::models::course::CreateCourse;
use admissions_db::models::tracker::ApplicationTracker;
use admissions_db::models::user::{CreateUser, User};
use admissions_db::repositories::{
    AdmissionPeriodRepo, CourseRepo, InstituteRepo, StudentRepo, TrackerRepo, UserRepo,
};
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

pub const TEST_PASSWORD: &str = "test_password_123!";

pub const STATEMENT: &str = "I have wanted to study this subject since secondary school and \
    have prepared for it with extra coursework.";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        allow_header_identity: false,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 60,
        },
        admission: AdmissionPolicy::default(),
    }
}

/// Build the full application router (same middleware stack as `main.rs`).
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, test_config())
}

pub fn build_test_app_with(pool: PgPool, config: ServerConfig) -> Router {
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.expect("request should be handled")
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, empty_request("GET", uri, None)).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, empty_request("GET", uri, Some(token))).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, json_request("POST", uri, None, body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, json_request("POST", uri, Some(token), body)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, json_request("PUT", uri, Some(token), body)).await
}

pub async fn put_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, empty_request("PUT", uri, Some(token))).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, empty_request("DELETE", uri, Some(token))).await
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn today() -> Date {
    chrono::Utc::now().date_naive()
}

pub fn days_from_today(days: i64) -> Date {
    today() + chrono::Duration::days(days)
}

pub fn token_for(user: &User) -> String {
    generate_access_token(user.id, &user.user_type, &test_config().jwt)
        .expect("token generation should succeed")
}

pub async fn create_user(pool: &PgPool, email: &str, user_type: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            name: email.split('@').next().unwrap_or(email).to_string(),
            email: email.to_string(),
            password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
            user_type: user_type.to_string(),
        },
    )
    .await
    .expect("user creation should succeed")
}

pub struct TestStudent {
    pub user: User,
    pub student_id: DbId,
    pub token: String,
}

pub async fn seed_student(pool: &PgPool, handle: &str) -> TestStudent {
    let user = create_user(pool, &format!("{handle}@students.test"), "student").await;
    let student_id = StudentRepo::create(pool, user.id).await.unwrap();
    let token = token_for(&user);
    TestStudent {
        user,
        student_id,
        token,
    }
}

pub struct TestInstitute {
    pub user: User,
    pub institute_id: DbId,
    pub faculty_id: DbId,
    pub name: String,
    pub token: String,
}

pub async fn seed_institute(pool: &PgPool, name: &str) -> TestInstitute {
    let handle = name.to_lowercase().replace(' ', "-");
    let user = create_user(pool, &format!("{handle}@institutes.test"), "institute").await;
    let institute_id = InstituteRepo::create(pool, Some(user.id), name).await.unwrap();
    let faculty_id = CourseRepo::create_faculty(pool, institute_id, "Faculty of Science")
        .await
        .unwrap();
    let token = token_for(&user);
    TestInstitute {
        user,
        institute_id,
        faculty_id,
        name: name.to_string(),
        token,
    }
}

/// An active course with the given deadline.
pub async fn seed_course(
    pool: &PgPool,
    faculty_id: DbId,
    code: &str,
    deadline: Option<Date>,
) -> DbId {
    seed_course_with(pool, faculty_id, code, deadline, true).await
}

pub async fn seed_course_with(
    pool: &PgPool,
    faculty_id: DbId,
    code: &str,
    deadline: Option<Date>,
    is_active: bool,
) -> DbId {
    CourseRepo::create(
        pool,
        &CreateCourse {
            faculty_id,
            name: format!("Course {code}"),
            code: code.to_string(),
            application_deadline: deadline,
            is_active,
        },
    )
    .await
    .unwrap()
}

/// Insert a period directly, bypassing lifecycle validation.
pub async fn seed_period(
    pool: &PgPool,
    institute_id: DbId,
    start_date: Date,
    end_date: Date,
    status: &str,
) -> AdmissionPeriod {
    let mut conn = pool.acquire().await.unwrap();
    AdmissionPeriodRepo::create(
        &mut *conn,
        &CreateAdmissionPeriod {
            institute_id,
            name: format!("Intake {start_date}"),
            start_date,
            end_date,
            status: status.to_string(),
        },
    )
    .await
    .unwrap()
}

pub async fn tracker_for(
    pool: &PgPool,
    student_id: DbId,
    institute_id: DbId,
) -> Option<ApplicationTracker> {
    TrackerRepo::find(
        pool,
        student_id,
        institute_id,
        admissions_core::quota::academic_year(today()),
    )
    .await
    .unwrap()
}

pub async fn count_rows(pool: &PgPool, table: &str) -> i64 {
    let row: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap();
    row.0
}
