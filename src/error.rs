use thiserror::Error;

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Proof construction requires the plaintext to be one of the candidates.
    #[error("plaintext is not a member of the candidate set")]
    PlaintextNotInCandidates,
    /// Modular inverse of a value that shares a factor with the modulus.
    /// Indicates a malformed key or statement, never a transient condition.
    #[error("value is not invertible modulo the given modulus")]
    NotInvertible,
    #[error("malformed commitment encoding: {0}")]
    Parse(#[from] ParseError),
}

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected 3 groups, found {0}")]
    GroupCount(usize),
    #[error("token {0:?} is not a decimal integer")]
    InvalidInteger(String),
    #[error("group does not end with an element delimiter")]
    UnterminatedGroup,
    #[error("groups differ in length")]
    LengthMismatch,
}

pub type Result<T> = std::result::Result<T, Error>;
