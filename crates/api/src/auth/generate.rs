//! Server-side credential generation for anonymous registration

use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

use crate::config::SecretPolicy;

const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const SPECIAL: &[u8] = b"!@#$%&*";

/// Generate a fresh anonymous username.
pub fn generate_username() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a random secret satisfying `policy`: the required digit and
/// special counts are placed first, the rest is drawn from the full
/// alphabet, and the result is shuffled so the composition reveals no
/// positional structure.
pub fn generate_secret(policy: &SecretPolicy) -> String {
    let mut rng = rand::thread_rng();
    let mut chars = Vec::with_capacity(policy.length);

    for _ in 0..policy.min_digits {
        chars.push(pick(&mut rng, DIGITS));
    }
    for _ in 0..policy.min_special {
        chars.push(pick(&mut rng, SPECIAL));
    }

    let all: Vec<u8> = [LOWER, UPPER, DIGITS, SPECIAL].concat();
    while chars.len() < policy.length {
        chars.push(pick(&mut rng, &all));
    }

    chars.shuffle(&mut rng);
    chars.into_iter().map(char::from).collect()
}

fn pick(rng: &mut impl Rng, set: &[u8]) -> u8 {
    set[rng.gen_range(0..set.len())]
}
