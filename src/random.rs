//! Random strings.

use rand::Rng;

const ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789~!@#$";

/// Returns `n` characters drawn uniformly from `a-z`, `A-Z`, `0-9` and `~!@#$`.
///
/// Uses the thread-local generator, which is cryptographically secure.
pub fn random_string(n: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..n)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}
