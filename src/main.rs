use anyhow::Result;
use clap::Parser;
use setup_cmake::asset::Platform;
use setup_cmake::runtime::RealRuntime;
use setup_cmake::{Config, Installer};
use std::path::PathBuf;

/// setup-cmake - install a CMake release and put it on PATH
///
/// Resolves a version specifier against the Kitware/CMake GitHub releases,
/// downloads the matching archive for this machine, caches it by version and
/// adds its bin directory to the search path.
///
/// Inside GitHub Actions the directory is appended to $GITHUB_PATH; elsewhere
/// a shell command is printed, so use it as:
///
///   eval "$(setup-cmake --cmake-version 3.19.x)"
///
/// Examples:
///   setup-cmake                        # latest release
///   setup-cmake --cmake-version 3.15   # newest 3.15.z
///   setup-cmake --cmake-version '>=3.10, <3.20'
#[derive(Parser, Debug)]
#[command(author, version = env!("SETUP_CMAKE_VERSION"), about)]
struct Cli {
    /// Version specifier, e.g. 3.19.2, 3.19, 3.x or a range (default: latest)
    #[arg(value_name = "SPEC")]
    spec: Option<String>,

    /// Same as SPEC; ignored when SPEC is given
    #[arg(long = "cmake-version", env = "CMAKE_VERSION", value_name = "SPEC")]
    cmake_version: Option<String>,

    /// GitHub token used for API requests (also via GITHUB_TOKEN)
    #[arg(
        long = "github-api-token",
        env = "GITHUB_TOKEN",
        value_name = "TOKEN",
        hide_env_values = true
    )]
    github_api_token: Option<String>,

    /// Only consider 32-bit builds
    #[arg(long = "use-32bit")]
    use_32bit: bool,

    /// Install for this platform instead of the running one (linux, darwin, win32)
    #[arg(long, value_name = "PLATFORM")]
    platform: Option<Platform>,

    /// GitHub API URL (defaults to https://api.github.com)
    #[arg(long = "api-url", value_name = "URL")]
    api_url: Option<String>,

    /// Tool cache directory (defaults to $RUNNER_TOOL_CACHE or the user cache dir)
    #[arg(long = "cache-dir", env = "RUNNER_TOOL_CACHE", value_name = "PATH")]
    cache_dir: Option<PathBuf>,
}

impl Cli {
    fn version_spec(&self) -> String {
        self.spec
            .clone()
            .or_else(|| self.cmake_version.clone())
            .unwrap_or_default()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = RealRuntime;

    let config = Config::load(
        &runtime,
        cli.version_spec(),
        cli.github_api_token,
        cli.use_32bit,
        cli.platform,
        cli.api_url,
        cli.cache_dir,
    )?;

    Installer::new(runtime).run(&config).await?;
    Ok(())
}
