//! A fake Maven installation and fixture project tree for tests.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const SUITE: &str = "com.example.BasicIT";

/// Echoes its arguments, honours marker files in the project directory and
/// drops an artifact into the local repository passed via `-Dmaven.repo.local`.
const FAKE_MVN: &str = r#"#!/bin/sh
echo "[INFO] Apache Maven 3.9.6 (fake)"
echo "[INFO] args: $*"
echo "[INFO] cwd: $(pwd)"
echo "fake maven diagnostics" >&2
if [ -f sleep.marker ]; then
  exec sleep 30
fi
if [ -f fork.marker ]; then
  (sleep 2; touch leaked.txt) &
  sleep 30
  exit 0
fi
if [ -f fail.marker ]; then
  echo "[ERROR] BUILD FAILURE"
  exit 3
fi
repo=""
for arg in "$@"; do
  case "$arg" in
    -Dmaven.repo.local=*) repo="${arg#-Dmaven.repo.local=}" ;;
  esac
done
if [ -n "$repo" ]; then
  mkdir -p "$repo/com/example/demo/1.0"
  echo "jar" > "$repo/com/example/demo/1.0/demo-1.0.jar"
fi
mkdir -p target
echo "built" > target/out.txt
echo "[INFO] BUILD SUCCESS"
"#;

const POM: &str = "<project>\n  <groupId>com.example</groupId>\n  <artifactId>demo</artifactId>\n  <version>1.0</version>\n</project>\n";

/// A project root with `target/test-classes/maven-its` fixtures and a fake
/// Maven installation next to it.
pub struct MavenProject {
    pub temp_dir: TempDir,
    pub root: PathBuf,
    pub maven_home: PathBuf,
}

impl MavenProject {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let root = temp_dir.path().join("plugin");
        let maven_home = temp_dir.path().join("maven");
        fs::create_dir_all(&root).expect("project root");
        install_fake_maven(&maven_home);
        Self {
            temp_dir,
            root,
            maven_home,
        }
    }

    /// Directory the harness looks up fixtures in.
    pub fn fixtures_dir(&self) -> PathBuf {
        self.root.join("target/test-classes/maven-its")
    }

    pub fn fixture_dir(&self, case: &str) -> PathBuf {
        self.fixtures_dir().join("com/example/BasicIT").join(case)
    }

    /// Add a fixture project with a `pom.xml` and the given marker files.
    pub fn add_case(&self, case: &str, markers: &[&str]) -> PathBuf {
        let dir = self.fixture_dir(case);
        write(&dir.join("pom.xml"), POM);
        write(&dir.join("src/main/java/Demo.java"), "class Demo {}\n");
        for marker in markers {
            write(&dir.join(marker), "");
        }
        dir
    }

    /// Provisioned directories live here.
    pub fn it_dir(&self) -> PathBuf {
        self.root.join("target/maven-it")
    }
}

pub fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().expect("parent")).expect("create parent");
    fs::write(path, contents).expect("write file");
}

#[cfg(unix)]
pub fn install_fake_maven(home: &Path) {
    use std::os::unix::fs::PermissionsExt;

    let mvn = home.join("bin/mvn");
    write(&mvn, FAKE_MVN);
    let mut perms = fs::metadata(&mvn).expect("stat mvn").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&mvn, perms).expect("chmod mvn");
}

#[cfg(not(unix))]
pub fn install_fake_maven(home: &Path) {
    write(&home.join("bin/mvn.cmd"), "@echo [INFO] BUILD SUCCESS\r\n");
}
