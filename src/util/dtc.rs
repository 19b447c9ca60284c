use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use anyhow::{anyhow, Context, Result};
use tracing::debug;

/// Converts a DTB into device tree source text.
pub trait Decompiler {
    fn decompile(&self, path: &Path) -> Result<String>;
}

/// Runs the external device tree compiler (`dtc -I dtb -O dts`).
#[derive(Debug, Clone, Default)]
pub struct Dtc {
    /// Directory containing the `dtc` executable. Uses `PATH` when unset.
    pub dir: Option<PathBuf>,
}

impl Dtc {
    pub fn new(dir: Option<PathBuf>) -> Self { Self { dir } }

    fn program(&self) -> PathBuf {
        match &self.dir {
            Some(dir) => dir.join("dtc"),
            None => PathBuf::from("dtc"),
        }
    }
}

impl Decompiler for Dtc {
    fn decompile(&self, path: &Path) -> Result<String> {
        let program = self.program();
        debug!("Running {} -I dtb -O dts {}", program.display(), path.display());
        let output = Command::new(&program)
            .args(["-I", "dtb", "-O", "dts"])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to run '{}'", program.display()))?;
        if !output.status.success() {
            return Err(anyhow!(
                "'{}' exited with {}: {}",
                program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        String::from_utf8(output.stdout).context("dtc output is not valid UTF-8")
    }
}
