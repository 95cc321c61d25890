//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! Services are generic over repository/hasher/token traits, but AppState
//! pins them to the concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;

use captor_core::chat::resolver::SessionResolver;
use captor_core::chat::service::ConversationService;
use captor_core::service::agent::AgentService;
use captor_core::service::auth::AuthService;
use captor_core::service::user::UserService;
use captor_infra::config::database_url;
use captor_infra::crypto::password::Argon2PasswordHasher;
use captor_infra::crypto::token::JwtTokenCodec;
use captor_infra::sqlite::agent::SqliteAgentRepository;
use captor_infra::sqlite::chat::SqliteChatRepository;
use captor_infra::sqlite::customer::SqliteCustomerRepository;
use captor_infra::sqlite::pool::DatabasePool;
use captor_infra::sqlite::schema::SqliteSchemaRepository;
use captor_infra::sqlite::user::SqliteUserRepository;
use captor_types::config::{AppConfig, DEFAULT_SECRET_KEY, ServerConfig};
use secrecy::ExposeSecret;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteAgentService =
    AgentService<SqliteAgentRepository, SqliteSchemaRepository, SqliteChatRepository>;

pub type ConcreteSessionResolver =
    SessionResolver<SqliteAgentRepository, SqliteCustomerRepository, SqliteChatRepository>;

pub type ConcreteConversationService =
    ConversationService<SqliteAgentRepository, SqliteSchemaRepository, SqliteChatRepository>;

pub type ConcreteUserService = UserService<SqliteUserRepository, Argon2PasswordHasher>;

pub type ConcreteAuthService =
    AuthService<SqliteUserRepository, Argon2PasswordHasher, JwtTokenCodec>;

/// Shared application state holding all services.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub agent_service: Arc<ConcreteAgentService>,
    pub session_resolver: Arc<ConcreteSessionResolver>,
    pub conversation_service: Arc<ConcreteConversationService>,
    pub user_service: Arc<ConcreteUserService>,
    pub auth_service: Arc<ConcreteAuthService>,
    pub app_name: String,
    pub server: ServerConfig,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: connect to DB, wire services.
    pub async fn init(data_dir: PathBuf, config: AppConfig) -> anyhow::Result<Self> {
        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let db_url = database_url(&config, &data_dir);
        let db_pool = DatabasePool::new(&db_url, config.database.max_readers).await?;

        let agent_repo = || SqliteAgentRepository::new(db_pool.clone());
        let schema_repo = || SqliteSchemaRepository::new(db_pool.clone());
        let chat_repo = || SqliteChatRepository::new(db_pool.clone());
        let user_repo = || SqliteUserRepository::new(db_pool.clone());

        let agent_service = AgentService::new(agent_repo(), schema_repo(), chat_repo());
        let session_resolver = SessionResolver::new(
            agent_repo(),
            SqliteCustomerRepository::new(db_pool.clone()),
            chat_repo(),
        );
        let conversation_service =
            ConversationService::new(agent_repo(), schema_repo(), chat_repo());
        let user_service = UserService::new(user_repo(), Argon2PasswordHasher::new());

        let AppConfig {
            app_name,
            server,
            auth,
            ..
        } = config;
        if auth.secret_key.expose_secret() == DEFAULT_SECRET_KEY {
            tracing::warn!("Using the built-in development secret key; set SECRET_KEY before deploying");
        }
        let auth_service = AuthService::new(
            user_repo(),
            Argon2PasswordHasher::new(),
            JwtTokenCodec::new(auth.secret_key, auth.access_token_expire_minutes),
        );

        tracing::debug!(data_dir = %data_dir.display(), "Application state initialized");

        Ok(Self {
            agent_service: Arc::new(agent_service),
            session_resolver: Arc::new(session_resolver),
            conversation_service: Arc::new(conversation_service),
            user_service: Arc::new(user_service),
            auth_service: Arc::new(auth_service),
            app_name,
            server,
            data_dir,
            db_pool,
        })
    }
}
