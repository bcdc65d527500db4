/// The allocator's only detectable failure mode.
///
/// Everything else misuse can trigger — freeing a foreign pointer, a double
/// free, calling in from an unserialized second thread — is undefined
/// behavior by design (see the crate's top-level safety notes) and is not
/// represented here. Exhaustion during `allocate` is likewise not an
/// `Error`: it is reported as `None`, not a failure that needs a reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The region handed to `Allocator::init` cannot even hold the control
    /// block and one 64 KiB buddy page.
    RegionTooSmall { available: usize, required: usize },
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::RegionTooSmall {
                available,
                required,
            } => write!(
                f,
                "region too small to initialize allocator: have {available} bytes, need at least {required}"
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;
