fn main() {
    // Release builds pass the commit in; local builds report "devel".
    let revision = std::env::var("BLKINFO_REVISION").unwrap_or_else(|_| "devel".to_string());
    println!("cargo:rustc-env=BLKINFO_REVISION={revision}");
    println!("cargo:rerun-if-env-changed=BLKINFO_REVISION");
}
