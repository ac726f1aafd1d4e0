use rand::rngs::OsRng;
use rand::Rng;

/// 64 characters, so sampling an index never introduces modulo bias.
const TOKEN_ALPHABET: &[u8; 64] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_+";

/// Returns a string of `n` characters drawn independently and uniformly from
/// a 64-character alphabet (`a-z`, `A-Z`, `0-9`, `_`, `+`).
///
/// Randomness comes from the operating system CSPRNG, since these tokens are
/// used as unguessable file names. `n = 0` yields an empty string; a
/// negative length is unrepresentable as the parameter is unsigned.
pub fn secure_token(n: usize) -> String {
    let mut rng = OsRng;
    (0..n)
        .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_has_requested_length() {
        for n in [0, 1, 10, 25, 64, 200] {
            assert_eq!(secure_token(n).len(), n);
        }
    }

    #[test]
    fn token_only_uses_alphabet_characters() {
        let token = secure_token(512);
        for c in token.bytes() {
            assert!(
                TOKEN_ALPHABET.contains(&c),
                "unexpected character {:?} in token",
                c as char
            );
        }
    }

    #[test]
    fn tokens_differ_between_calls() {
        // 25 chars over a 64-char alphabet; a collision here means the
        // generator is broken, not unlucky.
        assert_ne!(secure_token(25), secure_token(25));
    }
}
