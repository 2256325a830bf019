use serde::Serialize;

/// Build information embedded at compile time
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_commit: &'static str,
    pub build_timestamp: &'static str,
}

macro_rules! option_env_or {
    ($name:expr, $default:expr) => {
        match option_env!($name) {
            Some(v) => v,
            None => $default,
        }
    };
}

/// Populated by build.rs; falls back to "unknown" outside a git checkout.
pub const BUILD_INFO: BuildInfo = BuildInfo {
    version: env!("CARGO_PKG_VERSION"),
    git_commit: option_env_or!("MOH_GIT_COMMIT", "unknown"),
    build_timestamp: option_env_or!("MOH_BUILD_TIMESTAMP", "unknown"),
};
