use std::env;
use std::path::{Path, PathBuf};

fn main() {
    println!("cargo:rerun-if-env-changed=NLU_EMBED_LIB_DIR");

    // Only the `native` feature pulls in the engine library.
    if env::var_os("CARGO_FEATURE_NATIVE").is_none() {
        return;
    }
    setup_native_engine_integration();
}

fn setup_native_engine_integration() {
    match find_engine_installation() {
        Some(dir) => {
            println!("cargo:rustc-link-search=native={}", dir.display());
        }
        None => {
            // Fall back to the system linker search path.
            println!("cargo:warning=libsnips_queries not found - set NLU_EMBED_LIB_DIR");
        }
    }

    link_system_dependencies();
}

fn find_engine_installation() -> Option<PathBuf> {
    // Check environment variable first
    if let Ok(path) = env::var("NLU_EMBED_LIB_DIR") {
        let path = PathBuf::from(path);
        if validate_engine_installation(&path) {
            return Some(path);
        }
    }

    let common_paths = [
        "./deps/snips-queries/target/release",
        "../deps/snips-queries/target/release",
        "/usr/local/lib",
        "/opt/snips/lib",
    ];

    common_paths
        .iter()
        .map(PathBuf::from)
        .find(|path| validate_engine_installation(path))
}

fn validate_engine_installation(path: &Path) -> bool {
    ["libsnips_queries.so", "libsnips_queries.dylib", "libsnips_queries.a", "snips_queries.dll"]
        .iter()
        .any(|name| path.join(name).exists())
}

fn link_system_dependencies() {
    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();

    match target_os.as_str() {
        "linux" => {
            println!("cargo:rustc-link-lib=pthread");
            println!("cargo:rustc-link-lib=dl");
            println!("cargo:rustc-link-lib=m");
        }
        "macos" => {
            println!("cargo:rustc-link-lib=framework=Foundation");
        }
        "windows" => {
            println!("cargo:rustc-link-lib=ws2_32");
            println!("cargo:rustc-link-lib=advapi32");
        }
        _ => {}
    }
}
