use std::ffi::OsStr;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

/// Scratch directory holding config, logging config, and request files.
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> Result<Self, String> {
        let dir = tempfile::tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
        Ok(Self { dir })
    }

    /// Writes `content` to `name` inside the fixture and returns its path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write(&self, name: &str, content: &str) -> Result<String, String> {
        let path = self.path(name);
        fs::write(&path, content).map_err(|err| format!("write {} failed: {}", name, err))?;
        Ok(path.to_string_lossy().into_owned())
    }

    #[must_use]
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

/// Run the `train` binary and capture output.
///
/// # Errors
///
/// Returns an error if the binary cannot be executed.
pub fn run_train<I, S>(args: I) -> Result<Output, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = train_bin()?;
    Command::new(bin)
        .args(args)
        .arg("--no-color")
        .env("TRAIN_LOG", "info")
        .env_remove("RUST_LOG")
        .env_remove("TRAIN_WORKERS")
        .output()
        .map_err(|err| format!("run train failed: {}", err))
}

#[must_use]
pub fn describe(output: &Output) -> String {
    format!(
        "status: {}\nstdout: {}\nstderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

fn train_bin() -> Result<String, String> {
    option_env!("CARGO_BIN_EXE_train").map_or_else(
        || Err("CARGO_BIN_EXE_train missing at compile time.".to_owned()),
        |path| Ok(path.to_owned()),
    )
}
