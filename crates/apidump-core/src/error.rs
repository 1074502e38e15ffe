use crate::entry_point::TableCategory;
use crate::registry::DispatchKey;

#[derive(Debug, thiserror::Error)]
pub enum LayerError {
    #[error("no {category} dispatch table registered for key {key}")]
    UnknownDispatchKey { category: TableCategory, key: DispatchKey },

    #[error("{category} dispatch table already registered for key {key}")]
    DuplicateDispatchKey { category: TableCategory, key: DispatchKey },

    #[error("physical device {0:#x} was never enumerated from a live instance")]
    UnknownPhysicalDevice(u64),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LayerError {
    /// Registry violations indicate a bug in the layer or a misuse of object
    /// lifetimes by the application. They are never silently ignored.
    pub fn is_registry_violation(&self) -> bool {
        matches!(
            self,
            LayerError::UnknownDispatchKey { .. }
                | LayerError::DuplicateDispatchKey { .. }
                | LayerError::UnknownPhysicalDevice(_)
        )
    }
}
