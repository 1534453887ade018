use std::process::Command;

/// Trimmed stdout of a command, or `None` if it failed to run.
fn command_stdout(program: &str, args: &[&str]) -> Option<String> {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn main() {
    let commit_sha = std::env::var("CALLMAP_COMMIT_SHA")
        .ok()
        .or_else(|| command_stdout("git", &["rev-parse", "--short", "HEAD"]))
        .unwrap_or_else(|| "unknown".to_string());

    let build_date =
        command_stdout("date", &["+%Y-%m-%d"]).unwrap_or_else(|| "unknown".to_string());

    // "rustc 1.80.0 (051478957 2024-07-21)" -> "1.80.0"
    let rustc = std::env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    let rustc_version = command_stdout(&rustc, &["--version"])
        .and_then(|s| {
            s.strip_prefix("rustc ")
                .and_then(|v| v.split_whitespace().next())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=CALLMAP_COMMIT_SHA={}", commit_sha);
    println!("cargo:rustc-env=CALLMAP_BUILD_DATE={}", build_date);
    println!("cargo:rustc-env=CALLMAP_RUSTC_VERSION={}", rustc_version);

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-env-changed=CALLMAP_COMMIT_SHA");
}
