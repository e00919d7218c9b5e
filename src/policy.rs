use crate::charset::{self, CharClass};
use crate::error::{InvalidPolicy, LengthInputError};
use clap::ValueEnum;
use std::num::IntErrorKind;

pub const DEFAULT_LENGTH: usize = 12;
pub const QUICK_LENGTH: usize = 16;
pub const MAX_LENGTH: usize = 4096;

/// Named complexity presets.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Strong,
    Letters,
    Digits,
    Mixed,
}

impl Mode {
    pub const NAMES: [&'static str; 4] = ["strong", "letters", "digits", "mixed"];

    /// Parses free-form user input. Unknown names fall back to `Strong`.
    pub fn from_input(input: &str) -> Self {
        match input.trim().to_lowercase().as_str() {
            "letters" => Mode::Letters,
            "digits" => Mode::Digits,
            "mixed" => Mode::Mixed,
            _ => Mode::Strong,
        }
    }

    pub fn classes(self) -> &'static [CharClass] {
        match self {
            Mode::Strong | Mode::Mixed => &CharClass::ALL,
            Mode::Letters => &[CharClass::Lowercase, CharClass::Uppercase],
            Mode::Digits => &[CharClass::Digits],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub length: usize,
    pub include_lowercase: bool,
    pub include_uppercase: bool,
    pub include_digits: bool,
    pub include_symbols: bool,
    /// Guarantee at least one character from every enabled class.
    pub require_each_class: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self::from_mode(Mode::Strong, DEFAULT_LENGTH)
    }
}

impl PasswordPolicy {
    pub fn from_mode(mode: Mode, length: usize) -> Self {
        Self::with_classes(length, mode.classes())
    }

    pub fn with_classes(length: usize, classes: &[CharClass]) -> Self {
        Self {
            length,
            include_lowercase: classes.contains(&CharClass::Lowercase),
            include_uppercase: classes.contains(&CharClass::Uppercase),
            include_digits: classes.contains(&CharClass::Digits),
            include_symbols: classes.contains(&CharClass::Symbols),
            require_each_class: false,
        }
    }

    pub fn require_each_class(mut self, require: bool) -> Self {
        self.require_each_class = require;
        self
    }

    pub fn includes(&self, class: CharClass) -> bool {
        match class {
            CharClass::Lowercase => self.include_lowercase,
            CharClass::Uppercase => self.include_uppercase,
            CharClass::Digits => self.include_digits,
            CharClass::Symbols => self.include_symbols,
        }
    }

    /// Enabled classes in the fixed order lowercase, uppercase, digits, symbols.
    pub fn enabled_classes(&self) -> Vec<CharClass> {
        CharClass::ALL
            .into_iter()
            .filter(|class| self.includes(*class))
            .collect()
    }

    pub fn pool(&self) -> Vec<u8> {
        charset::build_pool(&self.enabled_classes())
    }

    pub fn validate(&self) -> Result<(), InvalidPolicy> {
        if self.length == 0 {
            return Err(InvalidPolicy::NonPositiveLength);
        }
        if self.length > MAX_LENGTH {
            return Err(InvalidPolicy::TooLong { max: MAX_LENGTH });
        }
        if !CharClass::ALL.iter().any(|class| self.includes(*class)) {
            return Err(InvalidPolicy::NoCharacterClass);
        }
        Ok(())
    }
}

/// Parses a password length typed by a user. Integers outside
/// `1..=MAX_LENGTH` are reported as an invalid policy, anything else that is
/// not an integer as a parse failure.
pub fn parse_length(input: &str) -> Result<usize, LengthInputError> {
    let trimmed = input.trim();
    let value: i128 = match trimmed.parse() {
        Ok(value) => value,
        Err(e) => {
            return Err(match e.kind() {
                IntErrorKind::PosOverflow => InvalidPolicy::TooLong { max: MAX_LENGTH }.into(),
                IntErrorKind::NegOverflow => InvalidPolicy::NonPositiveLength.into(),
                _ => LengthInputError::NotAnInteger(trimmed.to_string()),
            });
        }
    };

    if value <= 0 {
        return Err(InvalidPolicy::NonPositiveLength.into());
    }
    if value > MAX_LENGTH as i128 {
        return Err(InvalidPolicy::TooLong { max: MAX_LENGTH }.into());
    }

    Ok(value as usize)
}
