/// Returns the system-wide configuration file path for this platform.
pub fn system_config_path() -> String {
    #[cfg(windows)]
    {
        let programdata = std::env::var("PROGRAMDATA")
            .unwrap_or_else(|_| r"C:\ProgramData".to_string());
        format!(r"{}\apidump\apidump.toml", programdata)
    }
    #[cfg(not(windows))]
    {
        "/etc/apidump/apidump.toml".to_string()
    }
}

/// Returns the file name of the layer shared library on this platform.
pub fn layer_library_name() -> &'static str {
    #[cfg(target_os = "windows")]
    { "apidump_vk_layer.dll" }
    #[cfg(target_os = "macos")]
    { "libapidump_vk_layer.dylib" }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    { "libapidump_vk_layer.so" }
}

