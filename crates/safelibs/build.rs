fn main() {
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_default();

    match target_os.as_str() {
        "linux" | "android" | "freebsd" => {
            // Export only the safe_* surface from the cdylib.
            let script = format!("{}/linker/version_script.lds", manifest_dir);
            println!(
                "cargo:rustc-cdylib-link-arg=-Wl,--version-script={}",
                script
            );
            println!("cargo:rerun-if-changed=linker/version_script.lds");
        }
        "macos" => {
            let list = format!("{}/linker/exported_symbols.txt", manifest_dir);
            println!(
                "cargo:rustc-cdylib-link-arg=-Wl,-exported_symbols_list,{}",
                list
            );
            println!("cargo:rerun-if-changed=linker/exported_symbols.txt");
        }
        _ => {}
    }
}
