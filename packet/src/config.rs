/// Configuration for a [crate::Registry].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// `zstd` level used by [crate::Registry::write_compressed].
    pub compression_level: i32,

    /// Largest compressed frame accepted or produced.
    pub max_compressed_size: usize,

    /// Largest frame a compressed frame may expand to.
    pub max_decompressed_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            compression_level: zstd::DEFAULT_COMPRESSION_LEVEL,
            max_compressed_size: 1024 * 1024,
            max_decompressed_size: 16 * 1024 * 1024,
        }
    }
}
