/// Get the version string for dockyard and libdockyard
pub fn get_version_string() -> String {
    format!(
        "dockyard {}\nlibdockyard {}",
        env!("CARGO_PKG_VERSION"),
        libdockyard::version()
    )
}

/// Print version information to stdout
pub fn print_version() {
    println!("{}", get_version_string());
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
