//! Version and build information.
//!
//! Build metadata is embedded by `build.rs`; anything it could not determine
//! reads as "unknown".

/// "callmap {version} ({commit} {date}) rustc {rustc_version}"
pub fn version() -> String {
    format!(
        "callmap {} ({} {}) rustc {}",
        package_version(),
        build_commit(),
        build_date(),
        rustc_version()
    )
}

pub fn package_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub fn build_commit() -> &'static str {
    option_env!("CALLMAP_COMMIT_SHA").unwrap_or("unknown")
}

pub fn build_date() -> &'static str {
    option_env!("CALLMAP_BUILD_DATE").unwrap_or("unknown")
}

pub fn rustc_version() -> &'static str {
    option_env!("CALLMAP_RUSTC_VERSION").unwrap_or("unknown")
}
