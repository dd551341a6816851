use std::env;
use std::path::PathBuf;

fn main() {
    // Settings text compiled into the firmware image as lowest-priority
    // defaults. Override with an absolute or crate-relative path.
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap_or_default());

    let defaults = if let Ok(path) = env::var("PICO_SETTINGS_DEFAULTS") {
        println!("cargo:warning=Using PICO_SETTINGS_DEFAULTS from environment: {}", path);
        manifest_dir.join(path)
    } else {
        manifest_dir.join("resources").join("config.default")
    };

    println!("cargo:rustc-env=PICO_SETTINGS_DEFAULTS={}", defaults.display());

    // Rebuild when the defaults or their location change
    println!("cargo:rerun-if-env-changed=PICO_SETTINGS_DEFAULTS");
    println!("cargo:rerun-if-changed={}", defaults.display());
}
