fn main() {
    // Stamp the binary with its build time for the startup log line
    let built_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    println!("cargo:rustc-env=BUILD_DATE={}", built_at);
    println!("cargo:rerun-if-changed=build.rs");
}
