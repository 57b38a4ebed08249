//! SQLite-backed flat key/value store.
//!
//! Mirrors a browser extension's local storage: a handful of keys, each
//! holding one JSON document that is read whole and written whole.


use jiraprompt_core::{
    config::MemoryConfig,
    error::JiraPromptError,
    popup::{LastResponses, Settings, StoredState},
    prompt::Prompt,
    shellexpand,
};
use serde::{de::DeserializeOwned, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{debug, info};

/// Storage keys.
pub const KEY_API_KEY: &str = "apiKey";
pub const KEY_MODEL: &str = "model";
pub const KEY_PROMPTS: &str = "prompts";
pub const KEY_LAST_RESPONSES: &str = "lastResponses";

/// Persistent store backed by SQLite.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open the store, running migrations on first use.
    pub async fn new(config: &MemoryConfig) -> Result<Self, JiraPromptError> {
        let db_path = shellexpand(&config.db_path);

        // Ensure parent directory exists.
        if let Some(parent) = std::path::Path::new(&db_path).parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| JiraPromptError::Memory(format!("failed to create data dir: {e}")))?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
            .map_err(|e| JiraPromptError::Memory(format!("invalid db path: {e}")))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await
            .map_err(|e| JiraPromptError::Memory(format!("failed to connect to sqlite: {e}")))?;

        Self::run_migrations(&pool).await?;

        info!("Store initialized at {db_path}");

        Ok(Self { pool })
    }

    /// Open a private in-memory store.
    pub async fn in_memory() -> Result<Self, JiraPromptError> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| JiraPromptError::Memory(format!("invalid db path: {e}")))?
            .create_if_missing(true);
        // One connection: every new in-memory connection is a fresh database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await
            .map_err(|e| JiraPromptError::Memory(format!("failed to connect to sqlite: {e}")))?;

        Self::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Run SQL migrations, tracking which have already been applied.
    async fn run_migrations(pool: &SqlitePool) -> Result<(), JiraPromptError> {
        sqlx::raw_sql(
            "CREATE TABLE IF NOT EXISTS _migrations (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )
        .execute(pool)
        .await
        .map_err(|e| JiraPromptError::Memory(format!("failed to create migrations table: {e}")))?;

        let migrations: &[(&str, &str)] =
            &[("001_storage", include_str!("../migrations/001_storage.sql"))];

        for (name, sql) in migrations {
            let applied: Option<(String,)> =
                sqlx::query_as("SELECT name FROM _migrations WHERE name = ?")
                    .bind(name)
                    .fetch_optional(pool)
                    .await
                    .map_err(|e| {
                        JiraPromptError::Memory(format!("failed to check migration {name}: {e}"))
                    })?;

            if applied.is_some() {
                continue;
            }

            sqlx::raw_sql(sql)
                .execute(pool)
                .await
                .map_err(|e| JiraPromptError::Memory(format!("migration {name} failed: {e}")))?;

            sqlx::query("INSERT INTO _migrations (name) VALUES (?)")
                .bind(name)
                .execute(pool)
                .await
                .map_err(|e| {
                    JiraPromptError::Memory(format!("failed to record migration {name}: {e}"))
                })?;
        }
        Ok(())
    }

    /// Read one key, returning `T::default()` when it has never been written.
    pub async fn get<T>(&self, key: &str) -> Result<T, JiraPromptError>
    where
        T: DeserializeOwned + Default,
    {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM storage WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| JiraPromptError::Memory(format!("query failed: {e}")))?;

        match row {
            Some((raw,)) => serde_json::from_str(&raw).map_err(|e| {
                JiraPromptError::Memory(format!("stored value for {key} is malformed: {e}"))
            }),
            None => Ok(T::default()),
        }
    }

    /// Overwrite one key with a whole new value.
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), JiraPromptError>
    where
        T: Serialize + ?Sized,
    {
        let raw = serde_json::to_string(value)?;
        sqlx::query(
            "INSERT INTO storage (key, value) VALUES (?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')",
        )
        .bind(key)
        .bind(&raw)
        .execute(&self.pool)
        .await
        .map_err(|e| JiraPromptError::Memory(format!("upsert {key} failed: {e}")))?;

        debug!("store: wrote {key} ({} bytes)", raw.len());
        Ok(())
    }

    /// Load every key at once, with defaults for anything missing.
    pub async fn snapshot(&self) -> Result<StoredState, JiraPromptError> {
        Ok(StoredState {
            settings: self.settings().await?,
            prompts: self.prompts().await?,
            last_responses: self.last_responses().await?,
        })
    }

    pub async fn settings(&self) -> Result<Settings, JiraPromptError> {
        Ok(Settings {
            api_key: self.get(KEY_API_KEY).await?,
            model: self.get(KEY_MODEL).await?,
        })
    }

    pub async fn save_settings(&self, settings: &Settings) -> Result<(), JiraPromptError> {
        self.set(KEY_API_KEY, &settings.api_key).await?;
        self.set(KEY_MODEL, &settings.model).await
    }

    pub async fn prompts(&self) -> Result<Vec<Prompt>, JiraPromptError> {
        self.get(KEY_PROMPTS).await
    }

    pub async fn save_prompts(&self, prompts: &[Prompt]) -> Result<(), JiraPromptError> {
        self.set(KEY_PROMPTS, prompts).await
    }

    pub async fn last_responses(&self) -> Result<LastResponses, JiraPromptError> {
        self.get(KEY_LAST_RESPONSES).await
    }

    pub async fn save_last_responses(
        &self,
        last_responses: &LastResponses,
    ) -> Result<(), JiraPromptError> {
        self.set(KEY_LAST_RESPONSES, last_responses).await
    }
}
