use thiserror::Error;

use crate::constants::MAX_CONTENT_CHARS;

/// Local validation failures for outgoing message content.
///
/// These never reach the network: the composer rejects the draft before
/// any request is built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Message content must not be empty")]
    Empty,

    #[error("Message content is {len} characters (max {max})")]
    TooLong { len: usize, max: usize },
}

/// Check that `content` is between 1 and [`MAX_CONTENT_CHARS`] characters.
///
/// Length is counted in Unicode scalar values, so an accented letter or an
/// emoji counts once. Whitespace is content.
pub fn validate_content(content: &str) -> Result<(), ValidationError> {
    let len = content.chars().count();
    if len == 0 {
        return Err(ValidationError::Empty);
    }
    if len > MAX_CONTENT_CHARS {
        return Err(ValidationError::TooLong {
            len,
            max: MAX_CONTENT_CHARS,
        });
    }
    Ok(())
}
