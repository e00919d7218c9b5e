use crate::error::InvalidPolicy;
use crate::policy::PasswordPolicy;
use chacha20::ChaCha20;
use chacha20::cipher::{KeyIvInit, StreamCipher};
use log::debug;
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

const KEY_LEN: usize = 32;
const BUFFER_LEN: usize = 1024;

/// Generates a password for `policy`.
///
/// Every call keys a fresh ChaCha20 keystream with 256 bits from the
/// operating system CSPRNG and samples characters from it, so output is
/// neither predictable nor reproducible. The policy is checked before any
/// entropy is drawn.
pub fn generate_password(policy: &PasswordPolicy) -> Result<Zeroizing<String>, InvalidPolicy> {
    policy.validate()?;

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    OsRng.fill_bytes(&mut key[..]);

    Ok(sample(policy, &key))
}

/// Draws a password for an already validated `policy` from the keystream
/// of `key`.
fn sample(policy: &PasswordPolicy, key: &[u8; KEY_LEN]) -> Zeroizing<String> {
    let pool = policy.pool();
    let mut stream = Keystream::new(key);
    let mut password_bytes = Zeroizing::new(Vec::with_capacity(policy.length));

    if policy.require_each_class {
        for class in policy.enabled_classes().into_iter().take(policy.length) {
            password_bytes.push(stream.pick(class.alphabet()));
        }
    }

    while password_bytes.len() < policy.length {
        password_bytes.push(stream.pick(&pool));
    }

    if policy.require_each_class {
        stream.shuffle(&mut password_bytes);
    }

    debug!(
        "generated {} chars from a pool of {} ({} classes, require each: {})",
        policy.length,
        pool.len(),
        policy.enabled_classes().len(),
        policy.require_each_class
    );

    // Every alphabet is ASCII.
    let password: String = password_bytes.iter().map(|&b| b as char).collect();

    Zeroizing::new(password)
}

struct Keystream {
    cipher: ChaCha20,
    buffer: Zeroizing<Vec<u8>>,
    pos: usize,
}

impl Keystream {
    fn new(key: &[u8; KEY_LEN]) -> Self {
        let cipher = ChaCha20::new(key.into(), &[0u8; 12].into());
        let mut stream = Self {
            cipher,
            buffer: Zeroizing::new(vec![0u8; BUFFER_LEN]),
            pos: 0,
        };
        stream.refill();
        stream
    }

    fn refill(&mut self) {
        self.buffer.fill(0);
        self.cipher.apply_keystream(&mut self.buffer);
        self.pos = 0;
    }

    fn next_byte(&mut self) -> u8 {
        if self.pos >= self.buffer.len() {
            self.refill();
        }
        let byte = self.buffer[self.pos];
        self.pos += 1;
        byte
    }

    fn next_u32(&mut self) -> u32 {
        u32::from_le_bytes([
            self.next_byte(),
            self.next_byte(),
            self.next_byte(),
            self.next_byte(),
        ])
    }

    /// Uniform pick from an alphabet of at most 256 symbols.
    fn pick(&mut self, alphabet: &[u8]) -> u8 {
        let alphabet_size = alphabet.len();
        debug_assert!(alphabet_size > 0 && alphabet_size <= 256);
        let rejection_threshold = byte_rejection_threshold(alphabet_size);

        loop {
            let random_byte = self.next_byte() as usize;
            if random_byte < rejection_threshold {
                return alphabet[random_byte % alphabet_size];
            }
        }
    }

    /// Uniform index in `0..bound`.
    fn below(&mut self, bound: usize) -> usize {
        debug_assert!(bound > 0 && (bound as u64) <= (1 << 32));
        let rejection_threshold = word_rejection_threshold(bound);

        loop {
            let random_word = self.next_u32() as u64;
            if random_word < rejection_threshold {
                return (random_word % bound as u64) as usize;
            }
        }
    }

    fn shuffle(&mut self, items: &mut [u8]) {
        for i in (1..items.len()).rev() {
            let j = self.below(i + 1);
            items.swap(i, j);
        }
    }
}

fn byte_rejection_threshold(alphabet_size: usize) -> usize {
    256 - (256 % alphabet_size)
}

fn word_rejection_threshold(bound: usize) -> u64 {
    const SPACE: u64 = 1 << 32;
    SPACE - (SPACE % bound as u64)
}
