use std::env;
use std::process::Command;

const TAG_OVERRIDE_VAR: &str = "BARTER_BUILD_TAG";

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/tags");
    println!("cargo:rerun-if-env-changed={TAG_OVERRIDE_VAR}");

    // Packagers building from a tarball have no git metadata.
    let tag = env::var(TAG_OVERRIDE_VAR)
        .ok()
        .filter(|tag| !tag.trim().is_empty())
        .or_else(git_tag);

    if let Some(tag) = tag {
        println!("cargo:rustc-env=GIT_TAG={}", tag.trim());
    }
}

fn git_tag() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--abbrev=0"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
}
