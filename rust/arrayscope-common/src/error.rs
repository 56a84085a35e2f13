use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn allocation(requested_capacity: usize, element_size: usize) -> Error {
        Error(
            ErrorKind::Allocation {
                requested_capacity,
                element_size,
            }
            .into(),
        )
    }

    pub fn index_out_of_range(index: usize, count: usize) -> Error {
        Error(ErrorKind::IndexOutOfRange { index, count }.into())
    }

    pub fn use_after_free(operation: &'static str) -> Error {
        Error(ErrorKind::UseAfterFree { operation }.into())
    }

    pub fn is_allocation(&self) -> bool {
        matches!(self.kind(), ErrorKind::Allocation { .. })
    }

    pub fn is_index_out_of_range(&self) -> bool {
        matches!(self.kind(), ErrorKind::IndexOutOfRange { .. })
    }

    pub fn is_use_after_free(&self) -> bool {
        matches!(self.kind(), ErrorKind::UseAfterFree { .. })
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error(
        "cannot allocate {requested_capacity} elements of {element_size} bytes: \
         size exceeds addressable limits or the allocator is exhausted"
    )]
    Allocation {
        requested_capacity: usize,
        element_size: usize,
    },

    #[error("index {index} is out of range for count {count}")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("{operation} on a buffer handle that was already released")]
    UseAfterFree { operation: &'static str },

    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_round_trip() {
        let e = Error::index_out_of_range(3, 3);
        assert!(e.is_index_out_of_range());
        assert!(!e.is_use_after_free());
        match e.into_kind() {
            ErrorKind::IndexOutOfRange { index, count } => {
                assert_eq!(index, 3);
                assert_eq!(count, 3);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            Error::index_out_of_range(5, 2).to_string(),
            "index 5 is out of range for count 2"
        );
        assert_eq!(
            Error::use_after_free("append").to_string(),
            "append on a buffer handle that was already released"
        );
        assert!(Error::allocation(usize::MAX, 8)
            .to_string()
            .starts_with("cannot allocate"));
    }
}
