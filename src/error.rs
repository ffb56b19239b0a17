use thiserror::Error;

/// Errors raised by the allocators and the checked container operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("allocation of {bytes} bytes failed")]
    OutOfMemory { bytes: usize },

    #[error("capacity overflow")]
    CapacityOverflow,

    #[error("index {index} out of range for length {len}")]
    OutOfRange { index: usize, len: usize },

    #[error("{op} called on stray pointer {addr:#x}")]
    StrayPointer { op: &'static str, addr: usize },

    #[error("{op} size mismatch at {addr:#x}: recorded {recorded} elements, passed {passed}")]
    SizeMismatch {
        op: &'static str,
        addr: usize,
        recorded: usize,
        passed: usize,
    },

    #[error("{count} allocations still live ({bytes} bytes)")]
    Leak { count: usize, bytes: usize },

    #[error("cannot parse {kind} from {text:?}")]
    Parse { kind: &'static str, text: String },

    #[error("formatting failed")]
    Format(#[from] std::fmt::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = Error::OutOfRange { index: 5, len: 3 };
        assert_eq!(e.to_string(), "index 5 out of range for length 3");

        let e = Error::StrayPointer {
            op: "free",
            addr: 0x10,
        };
        assert_eq!(e.to_string(), "free called on stray pointer 0x10");
    }

    #[test]
    fn test_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let e: Error = io.into();
        assert!(matches!(e, Error::Io(_)));
        assert_eq!(e.to_string(), "gone");
    }
}
