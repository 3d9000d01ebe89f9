//! Base-64 sequence ids.
//!
//! # Overview
//!
//! Ids are positional numerals over a fixed 64-symbol alphabet, most
//! significant digit first. This is *not* byte-oriented base64: the alphabet
//! is laid out in ASCII order so that two ids padded to the same width
//! compare lexicographically exactly like the integers they encode.
//!
//! ```text
//! digit  0    1..=10  11..=36  37   38..=63
//! symbol '-'  '0'-'9' 'A'-'Z'  '_'  'a'-'z'
//! ```
//!
//! [`encode_padded`] always yields [`PADDED_WIDTH`] symbols. A
//! [`Base64Generator`] trims the padded form to a caller-chosen width and
//! puts a fixed prefix in front of it, which keeps ids short and sortable
//! within one prefix.

use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

use crate::error::ErrorCode;

/// Digit alphabet. The symbol at index `n` has digit value `n`.
pub const ALPHABET: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

/// Width of [`encode_padded`] output.
pub const PADDED_WIDTH: usize = 16;

/// Symbol for digit value zero, also the padding symbol.
pub const ZERO_SYMBOL: char = '-';

/// Errors raised while decoding or generating ids.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("empty id")]
    Empty,

    #[error("symbol {symbol:?} at position {position} is not in the id alphabet")]
    InvalidSymbol { symbol: char, position: usize },

    #[error("id {input:?} does not fit in 64 bits")]
    Overflow { input: String },

    #[error("id width must be between 1 and 16, got {width}")]
    InvalidWidth { width: usize },

    #[error("value {value} needs more than {width} id symbols")]
    WidthExceeded { value: u64, width: usize },

    #[error("id sequence exhausted")]
    Exhausted,
}

impl IdError {
    /// Machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Empty | Self::InvalidSymbol { .. } | Self::Overflow { .. } => {
                ErrorCode::InvalidSymbol
            }
            Self::InvalidWidth { .. } => ErrorCode::InvalidConfig,
            Self::WidthExceeded { .. } => ErrorCode::IdWidthExceeded,
            Self::Exhausted => ErrorCode::SequenceExhausted,
        }
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode `value` as exactly [`PADDED_WIDTH`] symbols, left-padded with
/// [`ZERO_SYMBOL`].
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn encode_padded(value: u64) -> String {
    let mut digits = [ALPHABET[0]; PADDED_WIDTH];
    let mut rest = value;
    let mut cursor = PADDED_WIDTH;
    while rest > 0 {
        cursor -= 1;
        digits[cursor] = ALPHABET[(rest & 0x3f) as usize];
        rest >>= 6;
    }
    digits.iter().copied().map(char::from).collect()
}

/// Encode `value` with the fewest symbols. Zero encodes to `"-"`.
#[must_use]
pub fn encode(value: u64) -> String {
    let padded = encode_padded(value);
    let trimmed = padded.trim_start_matches(ZERO_SYMBOL);
    if trimmed.is_empty() {
        ZERO_SYMBOL.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Encode a signed counter.
///
/// # Panics
///
/// Panics if `value` is negative. A negative sequence number is a caller
/// bug, not a recoverable condition.
#[must_use]
pub fn encode_signed(value: i64) -> String {
    assert!(value >= 0, "cannot encode negative sequence value {value}");
    encode(value.unsigned_abs())
}

/// Decode an id produced by [`encode`] or [`encode_padded`].
///
/// # Errors
///
/// Returns [`IdError::Empty`] for an empty string,
/// [`IdError::InvalidSymbol`] for a symbol outside [`ALPHABET`], and
/// [`IdError::Overflow`] when the value does not fit in a `u64`.
pub fn decode(input: &str) -> Result<u64, IdError> {
    if input.is_empty() {
        return Err(IdError::Empty);
    }

    input
        .chars()
        .enumerate()
        .try_fold(0u64, |acc, (position, symbol)| {
            let digit =
                symbol_value(symbol).ok_or(IdError::InvalidSymbol { symbol, position })?;
            acc.checked_mul(64)
                .and_then(|shifted| shifted.checked_add(digit))
                .ok_or_else(|| IdError::Overflow {
                    input: input.to_string(),
                })
        })
}

fn symbol_value(symbol: char) -> Option<u64> {
    let code = u64::from(symbol);
    match symbol {
        '-' => Some(0),
        '_' => Some(37),
        '0'..='9' => Some(code - u64::from('0') + 1),
        'A'..='Z' => Some(code - u64::from('A') + 11),
        'a'..='z' => Some(code - u64::from('a') + 38),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Base64Generator
// ---------------------------------------------------------------------------

/// Thread-safe generator of prefixed, fixed-width sequence ids.
///
/// Each call to [`next_id`](Self::next_id) takes the next sequence value,
/// encodes it with [`encode_padded`], keeps the last `width` symbols and
/// prepends `prefix`.
#[derive(Debug)]
pub struct Base64Generator {
    prefix: String,
    width: usize,
    next: AtomicU64,
}

impl Base64Generator {
    /// Create a generator starting at sequence value zero.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::InvalidWidth`] unless `1 <= width <= 16`.
    pub fn new(prefix: impl Into<String>, width: usize) -> Result<Self, IdError> {
        if width == 0 || width > PADDED_WIDTH {
            return Err(IdError::InvalidWidth { width });
        }
        Ok(Self {
            prefix: prefix.into(),
            width,
            next: AtomicU64::new(0),
        })
    }

    /// Resume the sequence at `value`.
    #[must_use]
    pub fn starting_at(self, value: u64) -> Self {
        self.next.store(value, Ordering::Relaxed);
        self
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Produce the next id in the sequence.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::Exhausted`] once the `u64` sequence is used up and
    /// [`IdError::WidthExceeded`] when the value needs more than `width`
    /// symbols.
    ///
    /// A failed call leaves the sequence where it was.
    pub fn next_id(&self) -> Result<String, IdError> {
        let limit = self.max_value();
        let value = self
            .next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                if current > limit {
                    None
                } else {
                    current.checked_add(1)
                }
            })
            .map_err(|current| {
                if current > limit {
                    IdError::WidthExceeded {
                        value: current,
                        width: self.width,
                    }
                } else {
                    IdError::Exhausted
                }
            })?;
        self.format(value)
    }

    /// Largest value that fits in `width` symbols.
    fn max_value(&self) -> u64 {
        let bits = u32::try_from(self.width * 6).unwrap_or(u32::MAX);
        1u64.checked_shl(bits).map_or(u64::MAX, |power| power - 1)
    }

    /// Format `value` the way [`next_id`](Self::next_id) would.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::WidthExceeded`] when `value` needs more than
    /// `width` symbols.
    pub fn format(&self, value: u64) -> Result<String, IdError> {
        let padded = encode_padded(value);
        let (head, tail) = padded.split_at(PADDED_WIDTH - self.width);
        if head.chars().any(|symbol| symbol != ZERO_SYMBOL) {
            return Err(IdError::WidthExceeded {
                value,
                width: self.width,
            });
        }
        Ok(format!("{}{tail}", self.prefix))
    }
}
