//! Vulkan loader layer manifest.

use serde_json::{json, Value};

pub const LAYER_NAME: &str = "VK_LAYER_APIDUMP_trace";

/// Build the JSON manifest the loader reads to find the layer library.
///
/// Implicit layers are loaded for every application, so they also carry the
/// environment switches the loader requires to turn them off.
pub fn layer_manifest(library_path: &str, implicit: bool) -> Value {
    let mut layer = json!({
        "name": LAYER_NAME,
        "type": "GLOBAL",
        "library_path": library_path,
        "api_version": "1.3.0",
        "implementation_version": "1",
        "description": "Writes every intercepted Vulkan call and its result",
        "functions": {
            "vkNegotiateLoaderLayerInterfaceVersion": "vkNegotiateLoaderLayerInterfaceVersion",
        },
    });
    if implicit {
        layer["enable_environment"] = json!({ "APIDUMP_ENABLE": "1" });
        layer["disable_environment"] = json!({ "APIDUMP_DISABLE": "1" });
    }
    json!({
        "file_format_version": "1.2.0",
        "layer": layer,
    })
}
