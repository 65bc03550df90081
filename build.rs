use std::process::Command;

fn main() {
    // Embed the commit the binary was built from, for the startup banner.
    let commit = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|out| out.status.success())
        .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string());

    if let Some(commit) = commit {
        println!("cargo:rustc-env=BUILD_COMMIT={}", commit);
    }
    println!("cargo:rerun-if-changed=.git/HEAD");
}
