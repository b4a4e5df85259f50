//! Outcome token identity.
//!
//! Superseded the source's string-keyed `token_id`/`Token` pair; this is the
//! "latest coherent" variant per the source's own divergent-copies history.

use serde::{Deserialize, Serialize};

/// One of the two complementary outcome tokens of a binary market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Token {
    A,
    B,
}

impl Token {
    pub fn complement(self) -> Token {
        match self {
            Token::A => Token::B,
            Token::B => Token::A,
        }
    }
}

/// Sentinel identifying the collateral (funding) asset. Not itself a `Token`
/// variant: a balance snapshot always carries exactly one `Collateral` entry
/// plus one entry per `Token`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Collateral;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complement_is_an_involution() {
        assert_eq!(Token::A.complement(), Token::B);
        assert_eq!(Token::B.complement(), Token::A);
        assert_eq!(Token::A.complement().complement(), Token::A);
    }
}
