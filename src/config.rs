use crate::asset::Platform;
use crate::runtime::Runtime;
use anyhow::{Result, anyhow};
use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const TOOL_NAME: &str = "cmake";

/// Cache root provided by GitHub-hosted runners.
pub const TOOL_CACHE_VAR: &str = "RUNNER_TOOL_CACHE";
/// Per-job scratch directory provided by GitHub-hosted runners.
pub const RUNNER_TEMP_VAR: &str = "RUNNER_TEMP";

/// Everything one installation needs to know.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Requested version; empty means the latest release
    pub version_spec: String,
    pub token: Option<String>,
    pub use_32bit: bool,
    /// Overrides the platform of the running host
    pub platform: Option<Platform>,
    pub api_url: String,
    pub cache_root: PathBuf,
    pub temp_root: Option<PathBuf>,
}

impl Config {
    /// Build a config, filling unset directories from the environment.
    ///
    /// The cache root falls back to `RUNNER_TOOL_CACHE` and then to the
    /// user cache directory.
    pub fn load<R: Runtime>(
        runtime: &R,
        version_spec: String,
        token: Option<String>,
        use_32bit: bool,
        platform: Option<Platform>,
        api_url: Option<String>,
        cache_root: Option<PathBuf>,
    ) -> Result<Self> {
        let cache_root = match cache_root {
            Some(root) => root,
            None => default_cache_root(runtime)?,
        };

        let temp_root = non_empty_var(runtime, RUNNER_TEMP_VAR).map(PathBuf::from);

        Ok(Self {
            version_spec,
            token: token.filter(|t| !t.is_empty()),
            use_32bit,
            platform,
            api_url: api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            cache_root,
            temp_root,
        })
    }

    /// Directory for downloads and extraction scratch space.
    pub fn temp_dir<R: Runtime>(&self, runtime: &R) -> PathBuf {
        self.temp_root.clone().unwrap_or_else(|| runtime.temp_dir())
    }
}

fn non_empty_var<R: Runtime>(runtime: &R, key: &str) -> Option<String> {
    runtime.env_var(key).ok().filter(|v| !v.is_empty())
}

fn default_cache_root<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    if let Some(root) = non_empty_var(runtime, TOOL_CACHE_VAR) {
        return Ok(PathBuf::from(root));
    }
    runtime
        .cache_dir()
        .map(|dir| dir.join("setup-cmake"))
        .ok_or_else(|| anyhow!("Cannot determine a cache directory; pass --cache-dir"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;
    use std::env::VarError;

    fn runtime_with(tool_cache: Option<&'static str>, runner_temp: Option<&'static str>) -> MockRuntime {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_env_var()
            .with(eq(TOOL_CACHE_VAR))
            .returning(move |_| tool_cache.map(str::to_string).ok_or(VarError::NotPresent));
        runtime
            .expect_env_var()
            .with(eq(RUNNER_TEMP_VAR))
            .returning(move |_| runner_temp.map(str::to_string).ok_or(VarError::NotPresent));
        runtime
    }

    #[test]
    fn test_defaults() {
        let mut runtime = runtime_with(None, None);
        runtime
            .expect_cache_dir()
            .returning(|| Some(PathBuf::from("/home/user/.cache")));

        let config = Config::load(&runtime, String::new(), None, false, None, None, None).unwrap();

        assert_eq!(
            config,
            Config {
                version_spec: String::new(),
                token: None,
                use_32bit: false,
                platform: None,
                api_url: DEFAULT_API_URL.to_string(),
                cache_root: PathBuf::from("/home/user/.cache/setup-cmake"),
                temp_root: None,
            }
        );
    }

    #[test]
    fn test_runner_environment() {
        let runtime = runtime_with(Some("/opt/hostedtoolcache"), Some("/home/runner/work/_temp"));

        let config = Config::load(
            &runtime,
            "3.19.x".to_string(),
            Some("ghp_token".to_string()),
            true,
            Some(Platform::Win32),
            Some("http://127.0.0.1:8080".to_string()),
            None,
        )
        .unwrap();

        assert_eq!(config.cache_root, PathBuf::from("/opt/hostedtoolcache"));
        assert_eq!(config.temp_root, Some(PathBuf::from("/home/runner/work/_temp")));
        assert_eq!(config.token.as_deref(), Some("ghp_token"));
        assert_eq!(config.api_url, "http://127.0.0.1:8080");
        assert!(config.use_32bit);
        assert_eq!(config.platform, Some(Platform::Win32));
    }

    #[test]
    fn test_explicit_cache_dir_wins() {
        let runtime = runtime_with(Some("/opt/hostedtoolcache"), None);

        let config = Config::load(
            &runtime,
            String::new(),
            None,
            false,
            None,
            None,
            Some(PathBuf::from("/tmp/cache")),
        )
        .unwrap();

        assert_eq!(config.cache_root, PathBuf::from("/tmp/cache"));
    }

    #[test]
    fn test_empty_token_is_absent() {
        let runtime = runtime_with(Some("/cache"), None);

        let config =
            Config::load(&runtime, String::new(), Some(String::new()), false, None, None, None).unwrap();
        assert_eq!(config.token, None);
    }

    #[test]
    fn test_no_cache_dir_fails() {
        let mut runtime = runtime_with(Some(""), None);
        runtime.expect_cache_dir().returning(|| None);

        let result = Config::load(&runtime, String::new(), None, false, None, None, None);
        assert!(result.unwrap_err().to_string().contains("--cache-dir"));
    }

    #[test]
    fn test_temp_dir_falls_back_to_system() {
        let mut runtime = runtime_with(Some("/cache"), None);
        runtime
            .expect_temp_dir()
            .returning(|| PathBuf::from("/tmp"));

        let config = Config::load(&runtime, String::new(), None, false, None, None, None).unwrap();
        assert_eq!(config.temp_dir(&runtime), PathBuf::from("/tmp"));
    }
}
