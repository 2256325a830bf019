use std::path::PathBuf;

use directories::ProjectDirs;

const PROJECT_ROOT: &str = env!("CARGO_MANIFEST_DIR");

/// Directory holding the database, logs and other runtime data.
///
/// `MOH_ASSET_DIR` overrides the location. Debug builds default to
/// `dev_assets/` at the workspace root, release builds to the platform data
/// directory (`~/.local/share/mirror-of-heart` on Linux).
pub fn asset_dir() -> PathBuf {
    let path = if let Ok(custom) = std::env::var("MOH_ASSET_DIR") {
        crate::path::expand_tilde(&custom)
    } else if cfg!(debug_assertions) {
        PathBuf::from(PROJECT_ROOT).join("../../dev_assets")
    } else {
        ProjectDirs::from("app", "mirror-of-heart", "mirror-of-heart")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".mirror-of-heart"))
    };

    if !path.exists()
        && let Err(e) = std::fs::create_dir_all(&path)
    {
        tracing::warn!(path = %path.display(), error = %e, "Failed to create asset directory");
    }

    path
}

/// Get the database file path.
///
/// Respects the `MOH_DATABASE_PATH` environment variable for custom locations.
/// Supports tilde expansion (e.g., `~/mirror/db.sqlite`).
///
/// Default: `{asset_dir}/mirror.sqlite`
pub fn database_path() -> PathBuf {
    if let Ok(path) = std::env::var("MOH_DATABASE_PATH") {
        return crate::path::expand_tilde(&path);
    }
    asset_dir().join("mirror.sqlite")
}

/// Default directory for rotated log files.
pub fn log_dir() -> PathBuf {
    asset_dir().join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_database_path_default() {
        // SAFETY: Tests run serially via #[serial] attribute
        unsafe { env::remove_var("MOH_DATABASE_PATH") };
        let path = database_path();
        assert!(path.ends_with("mirror.sqlite"));
    }

    #[test]
    #[serial]
    fn test_database_path_env_override() {
        // SAFETY: Tests run serially via #[serial] attribute
        unsafe { env::set_var("MOH_DATABASE_PATH", "/custom/path/test.db") };
        let path = database_path();
        unsafe { env::remove_var("MOH_DATABASE_PATH") };
        assert_eq!(path, PathBuf::from("/custom/path/test.db"));
    }

    #[test]
    #[serial]
    fn test_asset_dir_env_override_is_created() {
        let temp = tempfile::tempdir().unwrap();
        let custom = temp.path().join("data");
        // SAFETY: Tests run serially via #[serial] attribute
        unsafe { env::set_var("MOH_ASSET_DIR", custom.to_str().unwrap()) };
        let dir = asset_dir();
        let logs = log_dir();
        unsafe { env::remove_var("MOH_ASSET_DIR") };

        assert_eq!(dir, custom);
        assert!(custom.exists());
        assert_eq!(logs, custom.join("logs"));
    }
}
