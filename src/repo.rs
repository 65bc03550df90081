use std::path::Path;
use std::process::Command;

use tracing::{info, warn};

/// Clone or refresh the public peers checkout.
///
/// Failures here are not fatal: the catalog scan decides whether the
/// directory is usable.
pub fn update_repo(data_dir: &Path, repo_url: Option<&str>, update: bool) {
    if !data_dir.exists() {
        let Some(url) = repo_url else {
            warn!(
                "{} does not exist and no repo_url is configured",
                data_dir.display()
            );
            return;
        };
        info!("Cloning peers repository into {}", data_dir.display());
        run_git(&["clone", "--depth=1", url, &data_dir.to_string_lossy()]);
    } else if update && data_dir.join(".git").exists() {
        info!("Updating peers repository in {}", data_dir.display());
        run_git(&["-C", &data_dir.to_string_lossy(), "pull"]);
    }
}

fn run_git(args: &[&str]) {
    match Command::new("git").args(args).status() {
        Ok(status) if status.success() => {}
        Ok(status) => warn!("git {} exited with {}", args.join(" "), status),
        Err(e) => warn!("Failed to run git: {}", e),
    }
}
