//! Code Generator Module
//!
//! Produces short, pronounceable codes such as `bakodu42`.

const CONSONANTS: &[u8] = b"bcdfghjklmnpqrstvwxyz";
const VOWELS: &[u8] = b"aeiou";

/// Total length of a generated code.
pub const CODE_LENGTH: usize = 8;

// == Generate ==
/// Generates a new random code.
///
/// Six letters alternating consonant/vowel followed by a zero-padded number
/// in `00..=99`. Every draw comes from the thread-local CSPRNG.
pub fn generate_code() -> String {
    let mut code = String::with_capacity(CODE_LENGTH);
    for i in 0..6 {
        let alphabet = if i % 2 == 0 { CONSONANTS } else { VOWELS };
        code.push(alphabet[rand::random_range(0..alphabet.len())] as char);
    }
    code.push_str(&format!("{:02}", rand::random_range(0..100u32)));
    code
}

// == Validate ==
/// Checks that `code` has the shape produced by [`generate_code`].
pub fn is_valid_code(code: &str) -> bool {
    let bytes = code.as_bytes();
    if bytes.len() != CODE_LENGTH {
        return false;
    }
    bytes.iter().enumerate().all(|(i, b)| match i {
        0 | 2 | 4 => CONSONANTS.contains(b),
        1 | 3 | 5 => VOWELS.contains(b),
        _ => b.is_ascii_digit(),
    })
}
