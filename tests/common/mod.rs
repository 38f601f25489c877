use std::net::SocketAddr;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use fieldplan::config::Config;
use fieldplan::models::AuditRecord;

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
}

/// An account bootstrapped through the register endpoint.
pub struct TestAccount {
    pub token: String,
    pub user_id: Uuid,
    pub account_id: Uuid,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Register a fresh account; the first user holds every grant.
    pub async fn register_account(&self, email: &str) -> TestAccount {
        let resp = self
            .client
            .post(self.url("/api/v1/auth/register"))
            .json(&json!({
                "email": email,
                "password": "password123",
                "username": email.split('@').next().unwrap(),
            }))
            .send()
            .await
            .expect("register request failed");
        assert_eq!(resp.status(), StatusCode::OK, "register non-200");
        let body: Value = resp.json().await.unwrap();
        TestAccount {
            token: body["access_token"].as_str().unwrap().to_string(),
            user_id: body["user_id"].as_str().unwrap().parse().unwrap(),
            account_id: body["account_id"].as_str().unwrap().parse().unwrap(),
        }
    }

    /// Add a user with the given grants to the account, return their id.
    pub async fn add_user(
        &self,
        token: &str,
        email: &str,
        permissions: &[&str],
    ) -> (Uuid, String) {
        let (body, status) = self
            .post_auth(
                "/api/v1/users",
                token,
                &json!({
                    "email": email,
                    "password": "password123",
                    "username": email.split('@').next().unwrap(),
                    "permissions": permissions,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "add user non-200: {body}");
        let user_id = body["id"].as_str().unwrap().parse().unwrap();

        let resp = self
            .client
            .post(self.url("/api/v1/auth/login"))
            .json(&json!({ "email": email, "password": "password123" }))
            .send()
            .await
            .expect("login request failed");
        assert_eq!(resp.status(), StatusCode::OK);
        let login: Value = resp.json().await.unwrap();
        (user_id, login["access_token"].as_str().unwrap().to_string())
    }

    // Projects, forms and org units are owned by collaborating services;
    // tests seed them straight into the database.

    pub async fn seed_project(&self, account_id: Uuid, name: &str) -> Uuid {
        sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO projects (account_id, name) VALUES ($1, $2) RETURNING id",
        )
        .bind(account_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .expect("seed project failed")
    }

    pub async fn seed_form(&self, project_id: Uuid, name: &str) -> Uuid {
        sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO forms (project_id, name) VALUES ($1, $2) RETURNING id",
        )
        .bind(project_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .expect("seed form failed")
    }

    pub async fn seed_org_unit(
        &self,
        account_id: Uuid,
        name: &str,
        parent: Option<Uuid>,
        org_unit_type: Option<Uuid>,
    ) -> Uuid {
        let id = Uuid::now_v7();
        let path = match parent {
            Some(parent_id) => {
                let parent_path: String =
                    sqlx::query_scalar("SELECT path FROM org_units WHERE id = $1")
                        .bind(parent_id)
                        .fetch_one(&self.pool)
                        .await
                        .expect("parent org unit missing");
                format!("{parent_path}/{id}")
            }
            None => id.to_string(),
        };
        sqlx::query(
            "INSERT INTO org_units (id, account_id, name, org_unit_type_id, parent_id, path)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(account_id)
        .bind(name)
        .bind(org_unit_type)
        .bind(parent)
        .bind(path)
        .execute(&self.pool)
        .await
        .expect("seed org unit failed");
        id
    }

    pub async fn seed_org_unit_type(
        &self,
        account_id: Uuid,
        name: &str,
        allowed_projects: &[Uuid],
    ) -> Uuid {
        let type_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO org_unit_types (account_id, name) VALUES ($1, $2) RETURNING id",
        )
        .bind(account_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .expect("seed org unit type failed");

        for project_id in allowed_projects {
            sqlx::query(
                "INSERT INTO org_unit_type_projects (org_unit_type_id, project_id) VALUES ($1, $2)",
            )
            .bind(type_id)
            .bind(project_id)
            .execute(&self.pool)
            .await
            .expect("seed org unit type project failed");
        }
        type_id
    }

    /// Make an authenticated GET request.
    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated POST request with JSON body.
    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated PATCH request with JSON body.
    pub async fn patch_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .patch(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("patch request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated DELETE request.
    pub async fn delete_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("delete request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Create a team through the API, return its JSON.
    pub async fn create_team(&self, token: &str, body: &Value) -> Value {
        let (body, status) = self.post_auth("/api/v1/teams", token, body).await;
        assert_eq!(status, StatusCode::OK, "create team non-200: {body}");
        body
    }

    /// Create a planning through the API, return its JSON.
    pub async fn create_planning(&self, token: &str, body: &Value) -> Value {
        let (body, status) = self.post_auth("/api/v1/plannings", token, body).await;
        assert_eq!(status, StatusCode::OK, "create planning non-200: {body}");
        body
    }

    /// Audit records for one resource, oldest first.
    pub async fn audit_records(&self, resource_id: Uuid) -> Vec<AuditRecord> {
        sqlx::query_as::<_, AuditRecord>(
            "SELECT * FROM audit_records WHERE resource_id = $1 ORDER BY created_at, id",
        )
        .bind(resource_id)
        .fetch_all(&self.pool)
        .await
        .expect("audit query failed")
    }
}

/// Spawn a test app with a fresh temporary database.
pub async fn spawn_app() -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    // Create a unique test database
    let db_name = format!(
        "fieldplan_test_{}",
        Uuid::now_v7().to_string().replace('-', "")
    );

    // Connect to default postgres DB to create test DB
    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    // Connect to test DB and run migrations
    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let config = Config {
        database_url: test_url,
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        log_level: "warn".to_string(),
    };

    let app = fieldplan::build_app(pool.clone(), config);

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    // Spawn server in background
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        pool,
        client,
        db_name,
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
