use core::fmt;

/// Errors surfaced by the checked accessors of [`HashMap`].
///
/// Every other operation treats a missing key as an ordinary outcome (a
/// `None`, a no-op removal, or a default insertion), so this is only
/// returned from [`HashMap::at`] and [`HashMap::at_mut`].
///
/// [`HashMap`]: crate::HashMap
/// [`HashMap::at`]: crate::HashMap::at
/// [`HashMap::at_mut`]: crate::HashMap::at_mut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error {
    /// The requested key is not present in the map.
    KeyNotFound,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::KeyNotFound => f.write_str("key not found"),
        }
    }
}

impl core::error::Error for Error {}

/// Result alias for the checked accessors.
pub type Result<T, E = Error> = core::result::Result<T, E>;
