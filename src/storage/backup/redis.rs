//! Redis sorted-set backup backend.
//!
//! Every backup entry is a member of one sorted set per account: the member is
//! the JSON payload and the score is the note file's modification time.
//! `ZRANGE key -1 -1 WITHSCORES` returns the latest entry.
//!
//! Adding a payload that is byte-identical to an existing member moves that
//! member to the new score instead of creating a second member. The latest
//! entry is the same either way.

#[cfg(feature = "redis")]
mod implementation {
    use crate::models::BackupEntry;
    use crate::storage::traits::BackupClient;
    use crate::{Error, Result};
    use redis::{Client, Commands, Connection};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Default timeout for Redis operations.
    const REDIS_TIMEOUT: Duration = Duration::from_secs(5);

    /// Redis sorted-set backup backend.
    pub struct RedisBackup {
        /// Redis client.
        client: Client,
        /// Sorted set holding the entries.
        key: String,
        /// Cached connection for reuse.
        connection: Mutex<Option<Connection>>,
    }

    impl RedisBackup {
        /// Connects to Redis and verifies the server answers `PING`.
        ///
        /// # Errors
        ///
        /// Returns an error if the URL is invalid or the server is unreachable.
        pub fn new(connection_url: &str, key: impl Into<String>) -> Result<Self> {
            let client = Client::open(connection_url).map_err(|e| Error::backup("redis_connect", e))?;

            let backup = Self {
                client,
                key: key.into(),
                connection: Mutex::new(None),
            };

            let mut conn = backup.get_connection()?;
            let _: String = redis::cmd("PING")
                .query(&mut conn)
                .map_err(|e| Error::backup("redis_ping", e))?;
            backup.return_connection(conn);

            Ok(backup)
        }

        /// Returns the sorted-set key.
        #[must_use]
        pub fn key(&self) -> &str {
            &self.key
        }

        /// Gets a connection, reusing the cached one if available.
        fn get_connection(&self) -> Result<Connection> {
            let mut guard = self
                .connection
                .lock()
                .map_err(|e| Error::backup("redis_lock_connection", e))?;

            if let Some(conn) = guard.take() {
                return Ok(conn);
            }

            let conn = self
                .client
                .get_connection()
                .map_err(|e| Error::backup("redis_get_connection", e))?;
            conn.set_read_timeout(Some(REDIS_TIMEOUT))
                .map_err(|e| Error::backup("redis_set_read_timeout", e))?;
            conn.set_write_timeout(Some(REDIS_TIMEOUT))
                .map_err(|e| Error::backup("redis_set_write_timeout", e))?;

            Ok(conn)
        }

        /// Returns a connection to the cache for reuse.
        fn return_connection(&self, conn: Connection) {
            if let Ok(mut guard) = self.connection.lock() {
                *guard = Some(conn);
            }
        }
    }

    impl BackupClient for RedisBackup {
        fn name(&self) -> &'static str {
            "redis"
        }

        fn size(&self) -> Result<usize> {
            let mut conn = self.get_connection()?;
            let size: usize = conn
                .zcard(&self.key)
                .map_err(|e| Error::backup("redis_zcard", e))?;
            self.return_connection(conn);
            Ok(size)
        }

        fn latest(&self) -> Result<Option<BackupEntry>> {
            let mut conn = self.get_connection()?;
            let range: Vec<(String, f64)> = conn
                .zrange_withscores(&self.key, -1, -1)
                .map_err(|e| Error::backup("redis_zrange", e))?;
            self.return_connection(conn);

            Ok(range
                .into_iter()
                .next()
                .map(|(payload, score)| BackupEntry { score, payload }))
        }

        fn add(&self, entry: &BackupEntry) -> Result<()> {
            let mut conn = self.get_connection()?;
            let _: usize = conn
                .zadd(&self.key, &entry.payload, entry.score)
                .map_err(|e| Error::backup("redis_zadd", e))?;
            self.return_connection(conn);
            Ok(())
        }
    }
}

#[cfg(feature = "redis")]
pub use implementation::RedisBackup;

#[cfg(not(feature = "redis"))]
mod stub {
    use crate::models::BackupEntry;
    use crate::storage::traits::BackupClient;
    use crate::{Error, Result};

    /// Stub Redis backup when the feature is not enabled.
    pub struct RedisBackup;

    impl RedisBackup {
        /// Creates a new Redis backup (stub).
        ///
        /// # Errors
        ///
        /// Always returns an error because the feature is not enabled.
        pub fn new(_connection_url: &str, _key: impl Into<String>) -> Result<Self> {
            Err(Error::FeatureNotEnabled("redis".to_string()))
        }
    }

    impl BackupClient for RedisBackup {
        fn name(&self) -> &'static str {
            "redis"
        }

        fn size(&self) -> Result<usize> {
            Err(Error::FeatureNotEnabled("redis".to_string()))
        }

        fn latest(&self) -> Result<Option<BackupEntry>> {
            Err(Error::FeatureNotEnabled("redis".to_string()))
        }

        fn add(&self, _entry: &BackupEntry) -> Result<()> {
            Err(Error::FeatureNotEnabled("redis".to_string()))
        }
    }
}

#[cfg(not(feature = "redis"))]
pub use stub::RedisBackup;
