//! Stamps the git revision into `habitloop --version`.

use std::path::Path;
use std::process::Command;

fn git_revision(repo_root: &Path) -> Option<String> {
    let out = Command::new("git")
        .arg("-C")
        .arg(repo_root)
        .args(["describe", "--always", "--dirty", "--abbrev=8"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let rev = String::from_utf8(out.stdout).ok()?.trim().to_string();
    (!rev.is_empty()).then_some(rev)
}

fn main() {
    // Packagers building from a tarball can pass the revision in.
    let rev = std::env::var("HABITLOOP_BUILD_SHA")
        .ok()
        .filter(|s| !s.is_empty())
        .or_else(|| {
            let manifest_dir = std::env::var_os("CARGO_MANIFEST_DIR")?;
            git_revision(Path::new(&manifest_dir).parent()?)
        })
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=HABITLOOP_BUILD_SHA={rev}");
}
