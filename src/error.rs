/// Errors raised while constructing an [`ArrayMap`](crate::ArrayMap)
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Capacity or capacity factor cannot produce a usable bucket array.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),
}

/// Result alias for map construction.
pub type Result<T> = core::result::Result<T, Error>;
