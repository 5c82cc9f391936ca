//! Stamps `TAPIX_BUILD_SHA` into the binary for `tapix --version`.
//!
//! Release tarballs have no `.git`, so packagers can preset the variable.

use std::path::{Path, PathBuf};
use std::process::Command;

fn git(repo: &Path, args: &[&str]) -> Option<String> {
    let out = Command::new("git").arg("-C").arg(repo).args(args).output().ok()?;
    if !out.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&out.stdout).trim().to_string())
}

fn build_id(repo: &Path) -> String {
    let Some(sha) = git(repo, &["rev-parse", "--short=10", "HEAD"]).filter(|s| !s.is_empty()) else {
        return "unknown".to_string();
    };
    let dirty = git(repo, &["status", "--porcelain", "--untracked-files=no"]).is_some_and(|s| !s.is_empty());
    if dirty { format!("{sha}-dirty") } else { sha }
}

fn main() {
    println!("cargo:rerun-if-env-changed=TAPIX_BUILD_SHA");
    if let Ok(preset) = std::env::var("TAPIX_BUILD_SHA") {
        println!("cargo:rustc-env=TAPIX_BUILD_SHA={preset}");
        return;
    }

    let manifest_dir = PathBuf::from(std::env::var_os("CARGO_MANIFEST_DIR").unwrap_or_else(|| ".".into()));
    let repo = manifest_dir.parent().map(Path::to_path_buf).unwrap_or(manifest_dir);

    println!("cargo:rustc-env=TAPIX_BUILD_SHA={}", build_id(&repo));
    for tracked in [".git/HEAD", ".git/index"] {
        let p = repo.join(tracked);
        if p.exists() {
            println!("cargo:rerun-if-changed={}", p.display());
        }
    }
}
