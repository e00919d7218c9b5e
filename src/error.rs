use thiserror::Error;

/// A password policy that cannot produce a password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidPolicy {
    #[error("invalid policy: password length must be a positive number")]
    NonPositiveLength,

    #[error("invalid policy: password length must be at most {max}")]
    TooLong { max: usize },

    #[error("invalid policy: select at least one character class")]
    NoCharacterClass,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LengthInputError {
    #[error("'{0}' is not a valid integer")]
    NotAnInteger(String),

    #[error(transparent)]
    Invalid(#[from] InvalidPolicy),
}
