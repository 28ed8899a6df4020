use assert_cmd::Command;
use assert_cmd::cargo;
use flate2::Compression;
use flate2::write::GzEncoder;
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use std::fs;
use std::io::prelude::*;
use std::path::PathBuf;
use tar::Builder;
use tempfile::{TempDir, tempdir};

const RELEASES: &str = "/repos/Kitware/CMake/releases";

fn create_tar_gz(files: &[(&str, &str, u32)]) -> Vec<u8> {
    let mut tar_builder = Builder::new(Vec::new());
    for (name, content, mode) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_path(name).unwrap();
        header.set_mode(*mode);
        header.set_cksum();
        tar_builder.append(&header, content.as_bytes()).unwrap();
    }
    let tar = tar_builder.into_inner().unwrap();

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tar).unwrap();
    encoder.finish().unwrap()
}

fn create_zip(files: &[(&str, &str)]) -> Vec<u8> {
    use zip::write::FileOptions;

    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options: FileOptions<()> =
        FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn asset(base: &str, name: &str) -> serde_json::Value {
    json!({
        "name": name,
        "browser_download_url": format!("{}/download/{}", base, name),
    })
}

fn release(base: &str, tag: &str, prerelease: bool, assets: &[&str]) -> serde_json::Value {
    json!({
        "tag_name": tag,
        "url": format!("{}/releases/{}", base, tag),
        "draft": false,
        "prerelease": prerelease,
        "assets": assets.iter().map(|name| asset(base, name)).collect::<Vec<_>>(),
    })
}

/// Two pages of releases linked by `Link` headers.
fn mock_release_pages(server: &mut ServerGuard) -> Vec<mockito::Mock> {
    let base = server.url();

    let first = json!([
        release(&base, "v3.20.0-rc1", true, &["cmake-3.20.0-rc1-linux-x86_64.tar.gz"]),
        release(
            &base,
            "v3.19.2",
            false,
            &[
                "cmake-3.19.2-Linux-x86_64.tar.gz",
                "cmake-3.19.2-Linux-x86_64.sh",
                "cmake-3.19.2-Linux-aarch64.tar.gz",
                "cmake-3.19.2-macos-universal.tar.gz",
                "cmake-3.19.2-macos10.10-universal.tar.gz",
                "cmake-3.19.2-win64-x64.zip",
                "cmake-3.19.2-win32-x86.zip",
                "cmake-3.19.2-SHA-256.txt",
            ],
        ),
        release(&base, "not-a-version", false, &["cmake-Linux-x86_64.tar.gz"]),
    ]);
    let second = json!([release(
        &base,
        "v3.18.5",
        false,
        &["cmake-3.18.5-Linux-x86_64.tar.gz"],
    )]);

    vec![
        server
            .mock("GET", RELEASES)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_header(
                "link",
                &format!(
                    r#"<{base}{RELEASES}?page=2>; rel="next", <{base}{RELEASES}?page=2>; rel="last""#
                ),
            )
            .with_body(first.to_string())
            .create(),
        server
            .mock("GET", RELEASES)
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_header(
                "link",
                &format!(r#"<{base}{RELEASES}?page=1>; rel="first""#),
            )
            .with_body(second.to_string())
            .create(),
    ]
}

struct Workspace {
    cache: TempDir,
    temp: TempDir,
    github_path: PathBuf,
    _dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempdir().unwrap();
        let github_path = dir.path().join("github_path");
        fs::write(&github_path, "").unwrap();
        Self {
            cache: tempdir().unwrap(),
            temp: tempdir().unwrap(),
            github_path,
            _dir: dir,
        }
    }

    fn command(&self, server: &ServerGuard) -> Command {
        let mut cmd = Command::new(cargo::cargo_bin!("setup-cmake"));
        cmd.env_remove("GITHUB_TOKEN")
            .env_remove("CMAKE_VERSION")
            .env_remove("RUNNER_TOOL_CACHE")
            .env("GITHUB_PATH", &self.github_path)
            .env("RUNNER_TEMP", self.temp.path())
            .arg("--api-url")
            .arg(server.url())
            .arg("--cache-dir")
            .arg(self.cache.path());
        cmd
    }

    fn added_paths(&self) -> Vec<String> {
        fs::read_to_string(&self.github_path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn cached(&self, version: &str) -> PathBuf {
        self.cache.path().join("cmake").join(version)
    }
}

#[test]
fn test_installs_latest_linux_release() {
    let mut server = Server::new();
    let _pages = mock_release_pages(&mut server);
    let download = server
        .mock("GET", "/download/cmake-3.19.2-Linux-x86_64.tar.gz")
        .with_status(200)
        .with_body(create_tar_gz(&[
            ("cmake-3.19.2-Linux-x86_64/bin/cmake", "#!/bin/sh\necho 3.19.2", 0o755),
            ("cmake-3.19.2-Linux-x86_64/share/cmake-3.19/README", "docs", 0o644),
        ]))
        .expect(1)
        .create();

    let workspace = Workspace::new();
    workspace
        .command(&server)
        .arg("--platform")
        .arg("linux")
        .assert()
        .success();

    download.assert();
    let bin = workspace.cached("3.19.2").join("bin");
    assert!(bin.join("cmake").exists());
    assert!(workspace.cache.path().join("cmake/3.19.2.complete").exists());
    assert_eq!(workspace.added_paths(), vec![bin.display().to_string()]);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(bin.join("cmake")).unwrap().permissions().mode();
        assert!(mode & 0o111 != 0);
    }
}

#[test]
fn test_second_run_uses_cache() {
    let mut server = Server::new();
    let _pages = mock_release_pages(&mut server);
    let download = server
        .mock("GET", "/download/cmake-3.18.5-Linux-x86_64.tar.gz")
        .with_status(200)
        .with_body(create_tar_gz(&[("cmake-3.18.5/bin/cmake", "cmake", 0o755)]))
        .expect(1)
        .create();

    let workspace = Workspace::new();
    for _ in 0..2 {
        workspace
            .command(&server)
            .args(["--platform", "linux", "--cmake-version", "3.18"])
            .assert()
            .success();
    }

    download.assert();
    let bin = workspace.cached("3.18.5").join("bin").display().to_string();
    assert_eq!(workspace.added_paths(), vec![bin.clone(), bin]);
}

#[test]
fn test_installs_windows_zip() {
    let mut server = Server::new();
    let _pages = mock_release_pages(&mut server);
    let download = server
        .mock("GET", "/download/cmake-3.19.2-win64-x64.zip")
        .with_status(200)
        .with_body(create_zip(&[("cmake-3.19.2-win64-x64/bin/cmake.exe", "MZ")]))
        .expect(1)
        .create();

    let workspace = Workspace::new();
    workspace
        .command(&server)
        .args(["--platform", "win32", "3.19.x"])
        .assert()
        .success();

    download.assert();
    assert_eq!(
        fs::read_to_string(workspace.cached("3.19.2").join("bin/cmake.exe")).unwrap(),
        "MZ"
    );
}

#[test]
fn test_use_32bit_selects_x86_build() {
    let mut server = Server::new();
    let _pages = mock_release_pages(&mut server);
    let download = server
        .mock("GET", "/download/cmake-3.19.2-win32-x86.zip")
        .with_status(200)
        .with_body(create_zip(&[("cmake-3.19.2-win32-x86/bin/cmake.exe", "MZ32")]))
        .expect(1)
        .create();

    let workspace = Workspace::new();
    workspace
        .command(&server)
        .args(["--platform", "win32", "--use-32bit", "3.19.2"])
        .assert()
        .success();

    download.assert();
}

#[test]
fn test_macos_prefers_universal_without_deployment_target() {
    let mut server = Server::new();
    let _pages = mock_release_pages(&mut server);
    let download = server
        .mock("GET", "/download/cmake-3.19.2-macos-universal.tar.gz")
        .with_status(200)
        .with_body(create_tar_gz(&[(
            "cmake-3.19.2-macos-universal/CMake.app/Contents/bin/cmake",
            "cmake",
            0o755,
        )]))
        .expect(1)
        .create();

    let workspace = Workspace::new();
    workspace
        .command(&server)
        .args(["--platform", "darwin"])
        .assert()
        .success();

    download.assert();
    let bin = workspace.cached("3.19.2").join("CMake.app/Contents/bin");
    assert_eq!(workspace.added_paths(), vec![bin.display().to_string()]);
}

#[test]
fn test_unknown_version_fails() {
    let mut server = Server::new();
    let _pages = mock_release_pages(&mut server);

    let workspace = Workspace::new();
    workspace
        .command(&server)
        .args(["--platform", "linux", "100.0.x"])
        .assert()
        .failure()
        .stderr(predicates::str::contains(
            "Unable to find version matching 100.0.x",
        ));

    assert!(workspace.added_paths().is_empty());
}

#[test]
fn test_invalid_token_fails() {
    let mut server = Server::new();
    let _unauthorized = server
        .mock("GET", RELEASES)
        .match_header("authorization", "token invalid")
        .with_status(401)
        .with_body(r#"{"message":"Bad credentials"}"#)
        .create();

    let workspace = Workspace::new();
    workspace
        .command(&server)
        .args(["--platform", "linux", "--github-api-token", "invalid"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("Failed to fetch release listing"));
}

#[test]
fn test_prints_export_outside_github_actions() {
    let mut server = Server::new();
    let _pages = mock_release_pages(&mut server);
    let _download = server
        .mock("GET", "/download/cmake-3.19.2-Linux-x86_64.tar.gz")
        .with_status(200)
        .with_body(create_tar_gz(&[("cmake/bin/cmake", "cmake", 0o755)]))
        .create();

    let workspace = Workspace::new();
    let bin = workspace.cached("3.19.2").join("bin");
    let expected = if cfg!(windows) {
        format!("$env:PATH = \"{};\" + $env:PATH", bin.display())
    } else {
        format!("export PATH=\"{}:$PATH\"", bin.display())
    };

    workspace
        .command(&server)
        .env_remove("GITHUB_PATH")
        .args(["--platform", "linux"])
        .assert()
        .success()
        .stdout(predicates::str::contains(expected));

    assert!(workspace.added_paths().is_empty());
}
