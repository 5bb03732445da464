use std::path::PathBuf;
use std::time::Duration;

use kudos_core::PlatformId;

/// Bot configuration loaded from environment variables.
///
/// Everything except the admin list has a default suitable for local
/// development. The admin list has no sane default and must be set.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Directory holding the JSON store files (default: `./data`).
    pub data_dir: PathBuf,
    /// Platform ids with access to the admin panel, parsed from
    /// comma-separated `ADMIN_IDS`.
    pub admin_ids: Vec<PlatformId>,
    /// Idle wizard sessions are discarded after this many seconds
    /// (default: `1800`).
    pub session_ttl_secs: u64,
    /// Whether deleting a task also removes its submissions
    /// (default: `true`).
    pub task_delete_cascade: bool,
}

impl BotConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var               | Default  |
    /// |-----------------------|----------|
    /// | `KUDOS_DATA_DIR`      | `./data` |
    /// | `ADMIN_IDS`           | required |
    /// | `SESSION_TTL_SECS`    | `1800`   |
    /// | `TASK_DELETE_CASCADE` | `true`   |
    pub fn from_env() -> Self {
        let data_dir: PathBuf = std::env::var("KUDOS_DATA_DIR")
            .unwrap_or_else(|_| "./data".into())
            .into();

        let admin_ids: Vec<PlatformId> = std::env::var("ADMIN_IDS")
            .expect("ADMIN_IDS must be set (comma-separated platform ids)")
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse()
                    .unwrap_or_else(|_| panic!("Invalid admin id '{s}' in ADMIN_IDS"))
            })
            .collect();
        if admin_ids.is_empty() {
            panic!("ADMIN_IDS must contain at least one platform id");
        }

        let session_ttl_secs: u64 = std::env::var("SESSION_TTL_SECS")
            .unwrap_or_else(|_| "1800".into())
            .parse()
            .expect("SESSION_TTL_SECS must be a valid u64");

        let task_delete_cascade: bool = std::env::var("TASK_DELETE_CASCADE")
            .unwrap_or_else(|_| "true".into())
            .parse()
            .expect("TASK_DELETE_CASCADE must be `true` or `false`");

        Self {
            data_dir,
            admin_ids,
            session_ttl_secs,
            task_delete_cascade,
        }
    }

    pub fn is_admin(&self, id: PlatformId) -> bool {
        self.admin_ids.contains(&id)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_admin_checks_membership() {
        let config = BotConfig {
            data_dir: "./data".into(),
            admin_ids: vec![100, 200],
            session_ttl_secs: 1800,
            task_delete_cascade: true,
        };
        assert!(config.is_admin(100));
        assert!(config.is_admin(200));
        assert!(!config.is_admin(300));
    }
}
