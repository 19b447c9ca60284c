fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Builds outside of a git checkout still get a (blank) commit hash.
    let rev = std::process::Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .unwrap_or_default();
    println!("cargo:rustc-env=GIT_COMMIT_SHA={rev}");
    println!("cargo:rerun-if-changed=.git/HEAD");
    Ok(())
}
