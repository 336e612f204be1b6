use nom::error::{ErrorKind, ParseError};
use nom::{Err, IResult, Needed, Offset};
use std::fmt;

/// The error type returned by the wire decoders
///
/// Every variant that describes a structural problem keeps the input at the point of
/// failure, so that the dissector can bind its annotation to the exact byte range.
#[derive(Debug, PartialEq)]
pub enum DissectError<I: Sized> {
    /// The buffer ended before the structure did (at least this many more bytes needed)
    Incomplete(usize),
    /// A declared length is below the structure minimum or past the end of the buffer
    InvalidLength {
        input: I,
        declared: usize,
        minimum: usize,
        remaining: usize,
    },
    /// A header declared a length of zero, which would never advance
    ZeroLength(I),

    NomError(I, ErrorKind),
    OwnedNomError(Vec<u8>, ErrorKind),
}

/// Result type of all wire decoders of this crate
pub type DResult<'a, O> = IResult<&'a [u8], O, DissectError<&'a [u8]>>;

impl<I> DissectError<I> {
    /// Creates a `DissectError<Vec<u8>>` by cloning the failing input, if any
    pub fn to_owned_vec(&self) -> DissectError<Vec<u8>>
    where
        I: AsRef<[u8]>,
    {
        match self {
            DissectError::Incomplete(n) => DissectError::Incomplete(*n),
            DissectError::InvalidLength {
                input,
                declared,
                minimum,
                remaining,
            } => DissectError::InvalidLength {
                input: input.as_ref().to_vec(),
                declared: *declared,
                minimum: *minimum,
                remaining: *remaining,
            },
            DissectError::ZeroLength(i) => DissectError::ZeroLength(i.as_ref().to_vec()),
            DissectError::NomError(i, e) => DissectError::OwnedNomError(i.as_ref().to_vec(), *e),
            DissectError::OwnedNomError(i, e) => DissectError::OwnedNomError(i.clone(), *e),
        }
    }

    /// Returns true if this error describes a length field inconsistent with the data
    pub fn is_length_error(&self) -> bool {
        matches!(
            self,
            DissectError::InvalidLength { .. } | DissectError::ZeroLength(_)
        )
    }
}

impl<'a> DissectError<&'a [u8]> {
    /// Byte offset of the failure, relative to `base`
    ///
    /// `base` must be the buffer the failing parser was (directly or indirectly) fed with.
    /// Truncation is reported at the end of `base`.
    pub fn offset_in(&self, base: &[u8]) -> usize {
        match self {
            DissectError::InvalidLength { input, .. }
            | DissectError::ZeroLength(input)
            | DissectError::NomError(input, _) => base.offset(input),
            DissectError::Incomplete(_) | DissectError::OwnedNomError(..) => base.len(),
        }
    }
}

impl<I> ParseError<I> for DissectError<I> {
    fn from_error_kind(input: I, kind: ErrorKind) -> Self {
        DissectError::NomError(input, kind)
    }
    fn append(input: I, kind: ErrorKind, _other: Self) -> Self {
        DissectError::NomError(input, kind)
    }
}

impl<I> fmt::Display for DissectError<I>
where
    I: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DissectError::Incomplete(n) => write!(f, "Truncated data (needed {} more bytes)", n),
            DissectError::InvalidLength {
                declared,
                minimum,
                remaining,
                ..
            } => {
                if declared < minimum {
                    write!(
                        f,
                        "Invalid length {} (minimum is {} bytes)",
                        declared, minimum
                    )
                } else {
                    write!(
                        f,
                        "Invalid length {} (only {} bytes remaining)",
                        declared, remaining
                    )
                }
            }
            DissectError::ZeroLength(_) => write!(f, "Zero-length header"),
            DissectError::NomError(_, e) => write!(f, "Internal parser error {:?}", e),
            DissectError::OwnedNomError(_, e) => write!(f, "Internal parser error {:?}", e),
        }
    }
}

impl<I> std::error::Error for DissectError<I> where I: fmt::Debug {}

/// Check `minimum <= declared <= input.len()`, returning a recoverable error otherwise
pub(crate) fn check_length<I: AsRef<[u8]>>(
    input: I,
    declared: usize,
    minimum: usize,
) -> Result<(), Err<DissectError<I>>> {
    let remaining = input.as_ref().len();
    if declared < minimum || declared > remaining {
        return Err(Err::Error(DissectError::InvalidLength {
            input,
            declared,
            minimum,
            remaining,
        }));
    }
    Ok(())
}

/// Flatten a nom error into a `DissectError`
///
/// Streaming parsers report missing data as `Incomplete`; for a captured packet this means
/// the structure is truncated.
pub(crate) fn flatten<I>(e: Err<DissectError<I>>) -> DissectError<I> {
    match e {
        Err::Incomplete(Needed::Size(n)) => DissectError::Incomplete(n.get()),
        Err::Incomplete(Needed::Unknown) => DissectError::Incomplete(0),
        Err::Error(e) | Err::Failure(e) => e,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_length_bounds() {
        let data = [0u8; 8];
        assert!(check_length(&data[..], 4, 4).is_ok());
        assert!(check_length(&data[..], 8, 4).is_ok());
        match check_length(&data[..], 3, 4) {
            Err(Err::Error(DissectError::InvalidLength {
                declared, minimum, ..
            })) => {
                assert_eq!(declared, 3);
                assert_eq!(minimum, 4);
            }
            _ => panic!("short length accepted"),
        }
        match check_length(&data[..], 9, 4) {
            Err(Err::Error(e)) => {
                assert!(e.is_length_error());
                assert!(e.to_string().contains("only 8 bytes remaining"));
            }
            _ => panic!("long length accepted"),
        }
    }

    #[test]
    fn offset_of_failure() {
        let data = [1u8, 2, 3, 4, 5, 6];
        let e = DissectError::ZeroLength(&data[4..]);
        assert_eq!(e.offset_in(&data), 4);
        let e: DissectError<&[u8]> = DissectError::Incomplete(2);
        assert_eq!(e.offset_in(&data), 6);
        let owned = DissectError::NomError(&data[2..], ErrorKind::Eof).to_owned_vec();
        assert_eq!(owned, DissectError::OwnedNomError(vec![3, 4, 5, 6], ErrorKind::Eof));
    }
}
