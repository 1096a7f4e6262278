fn main() {
    // The data layer has nothing to generate; only the desktop shell needs the
    // Tauri context (config, capabilities, icons) prepared at build time.
    #[cfg(feature = "desktop")]
    {
        // Tauri resolves `bundle.resources` globs relative to the current
        // directory, so make sure we're inside the crate root before
        // delegating to `tauri_build`.
        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            let _ = std::env::set_current_dir(manifest_dir);
        }

        tauri_build::build()
    }
}
