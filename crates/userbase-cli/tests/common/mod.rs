use std::path::Path;
use std::process::{Command, Output};

use url::Url;

/// A `file://` store URL for a directory.
pub fn store_url(path: &Path) -> String {
    Url::from_directory_path(path)
        .expect("Failed to convert path to file URL")
        .to_string()
}

/// Run the CLI binary against a store, isolated from the caller's environment.
pub fn run_cli(store: &str, args: &[&str]) -> Output {
    run_cli_with_env(store, &[], args)
}

/// Run the CLI with extra environment variables set on the child process.
pub fn run_cli_with_env(store: &str, envs: &[(&str, &str)], args: &[&str]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_userbase"));
    cmd.arg("--store").arg(store);
    cmd.args(args);
    cmd.env_remove("USERBASE_STORE");
    cmd.env_remove("USERBASE_KEYSPACE");
    cmd.env_remove("USERBASE_DATACENTER");
    cmd.env_remove("RUST_LOG");
    cmd.envs(envs.iter().copied());
    cmd.output().expect("Failed to execute CLI")
}

/// Run the CLI and expect success, returning stdout.
pub fn run_cli_success(store: &str, args: &[&str]) -> String {
    let output = run_cli(store, args);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Run the CLI and expect failure, returning stderr.
pub fn run_cli_failure(store: &str, args: &[&str]) -> String {
    let output = run_cli(store, args);
    assert!(
        !output.status.success(),
        "CLI command unexpectedly succeeded: {:?}\nstdout: {}",
        args,
        String::from_utf8_lossy(&output.stdout)
    );
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Parse one line of JSON output.
pub fn json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout.trim()).expect("Output is not JSON")
}
