//! Common test utilities for E2E tests
//!
//! `TestServer` runs the real router on an ephemeral port with in-process
//! fakes for object storage, the OAuth provider and mail.

#![allow(dead_code)]

pub mod schema_validator;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use homefeed::auth::OAuthProvider;
use homefeed::data::{Database, NewComment, NewPosting, NewUser, User};
use homefeed::error::AppError;
use homefeed::mail::{MailMessage, Mailer};
use homefeed::storage::ObjectStore;
use homefeed::{AppState, config};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const TEST_TOKEN_SECRET: &str = "test-secret-key-32-bytes-long!!!";

static METRICS_INIT: std::sync::Once = std::sync::Once::new();

/// Object store that keeps uploads in memory
#[derive(Default)]
pub struct FakeObjectStore {
    pub uploads: Mutex<Vec<(String, usize)>>,
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
    async fn store(&self, data: Vec<u8>, content_type: &str) -> Result<String, AppError> {
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push((content_type.to_string(), data.len()));
        Ok(format!(
            "https://media.test.example.com/postings/{}.jpg",
            uploads.len()
        ))
    }
}

/// OAuth provider answering from a fixed token table
#[derive(Default)]
pub struct FakeOAuthProvider {
    pub profiles: Mutex<HashMap<String, serde_json::Value>>,
}

#[async_trait]
impl OAuthProvider for FakeOAuthProvider {
    async fn fetch_profile(&self, access_token: &str) -> Result<serde_json::Value, AppError> {
        self.profiles
            .lock()
            .unwrap()
            .get(access_token)
            .cloned()
            .ok_or(AppError::UpstreamRejected)
    }
}

/// Mailer that records messages and can be told to fail
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<MailMessage>>,
    pub fail: std::sync::atomic::AtomicBool,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: MailMessage) -> Result<(), AppError> {
        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(AppError::Upstream("mail relay down".to_string()));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub store: Arc<FakeObjectStore>,
    pub oauth: Arc<FakeOAuthProvider>,
    pub mailer: Arc<RecordingMailer>,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

pub fn test_config(db_path: std::path::PathBuf) -> config::AppConfig {
    config::AppConfig {
        server: config::ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Let OS assign port
            allowed_origin: None,
        },
        database: config::DatabaseConfig { path: db_path },
        storage: config::StorageConfig {
            media: config::MediaStorageConfig {
                bucket: "test-media".to_string(),
                public_url: "https://media.test.example.com".to_string(),
            },
        },
        cloudflare: config::CloudflareConfig {
            account_id: "test-account".to_string(),
            r2_access_key_id: "test-key".to_string(),
            r2_secret_access_key: "test-secret".to_string(),
        },
        auth: config::AuthConfig {
            token_secret: TEST_TOKEN_SECRET.to_string(),
        },
        oauth: config::OAuthConfig {
            kakao: config::KakaoOAuthConfig {
                user_info_url: "https://kapi.kakao.com/v2/user/me".to_string(),
                timeout_seconds: 5,
            },
        },
        mail: config::MailConfig {
            enabled: true,
            sender: "no-reply@test.example.com".to_string(),
        },
        logging: config::LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
    }
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        // The registry is process-global; register instruments once per test binary
        METRICS_INIT.call_once(|| homefeed::metrics::init_metrics().unwrap());

        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let config = test_config(db_path.clone());

        let db = Arc::new(Database::connect(&db_path).await.unwrap());
        let store = Arc::new(FakeObjectStore::default());
        let oauth = Arc::new(FakeOAuthProvider::default());
        let mailer = Arc::new(RecordingMailer::default());

        let state = AppState::with_services(
            config,
            db,
            store.clone(),
            oauth.clone(),
            mailer.clone(),
        );

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = homefeed::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr: addr_str,
            state,
            store,
            oauth,
            mailer,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Create a user directly in the database and return it with a token
    pub async fn create_user(&self, nickname: &str) -> (User, String) {
        let user = self
            .state
            .db
            .insert_user(&NewUser {
                kakao_id: format!("kakao-{nickname}"),
                email: format!("{nickname}@example.com"),
                nickname: nickname.to_string(),
                profile_image: Some(format!("https://img.example.com/{nickname}.png")),
            })
            .await
            .unwrap();
        let token = self.state.token_codec.issue(user.id).unwrap();
        (user, token)
    }

    /// Create a posting owned by `user_id` in size bucket `size_id`
    pub async fn create_posting(&self, user_id: i64, size_id: i64, text: &str) -> i64 {
        self.state
            .db
            .insert_posting(&NewPosting {
                user_id,
                housing_type_id: 1,
                size_id,
                style_id: 1,
                item_color_id: 1,
                back_color_id: 3,
                image: format!("https://media.test.example.com/postings/{text}.jpg"),
                text: text.to_string(),
            })
            .await
            .unwrap()
    }

    /// Create a comment with an explicit creation time
    pub async fn create_comment_at(
        &self,
        posting_id: i64,
        user_id: i64,
        text: &str,
        created_at: DateTime<Utc>,
    ) -> i64 {
        self.state
            .db
            .insert_comment(&NewComment {
                posting_id,
                user_id,
                parent_id: None,
                text: text.to_string(),
                created_at,
            })
            .await
            .unwrap()
    }

    /// Register a provider profile for `access_token`
    pub fn register_provider_token(&self, access_token: &str, profile: serde_json::Value) {
        self.oauth
            .profiles
            .lock()
            .unwrap()
            .insert(access_token.to_string(), profile);
    }
}
