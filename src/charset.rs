use clap::ValueEnum;

const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum CharClass {
    Lowercase,
    Uppercase,
    Digits,
    Symbols,
}

impl CharClass {
    /// Every class, in pool order.
    pub const ALL: [CharClass; 4] = [
        CharClass::Lowercase,
        CharClass::Uppercase,
        CharClass::Digits,
        CharClass::Symbols,
    ];

    pub fn alphabet(self) -> &'static [u8] {
        match self {
            CharClass::Lowercase => LOWERCASE,
            CharClass::Uppercase => UPPERCASE,
            CharClass::Digits => DIGITS,
            CharClass::Symbols => SYMBOLS,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CharClass::Lowercase => "lowercase",
            CharClass::Uppercase => "uppercase",
            CharClass::Digits => "digits",
            CharClass::Symbols => "symbols",
        }
    }

    pub fn contains(self, byte: u8) -> bool {
        self.alphabet().contains(&byte)
    }
}

/// Concatenates the alphabets of `classes`. The classes are disjoint, so a
/// uniform pick from the pool is a uniform pick from their union.
pub fn build_pool(classes: &[CharClass]) -> Vec<u8> {
    let mut pool = Vec::with_capacity(classes.iter().map(|c| c.alphabet().len()).sum());
    for class in classes {
        pool.extend_from_slice(class.alphabet());
    }
    pool
}
