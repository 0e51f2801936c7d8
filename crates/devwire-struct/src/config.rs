/// Controls how a [`CommandRegistry`](crate::CommandRegistry) accepts metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// When false, registering an intent twice returns `StructError::DuplicateIntent`.
    pub replace_existing: bool,
    /// Maximum number of metadata files loaded from a directory.
    pub max_files_from_directory: usize,
    /// Maximum bytes allowed per metadata file loaded from a directory.
    pub max_file_size: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            replace_existing: true,
            max_files_from_directory: 256,
            max_file_size: 256 * 1024,
        }
    }
}
