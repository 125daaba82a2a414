#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

use rand::Rng;

/// Number of Miller–Rabin rounds behind [`next_prime`].
///
/// The false-positive probability of a single call is at most 4⁻¹⁰⁰.
pub const NEXT_PRIME_ROUNDS: u64 = 100;

/// Computes `(a * b) mod c` without overflowing 64 bits.
///
/// The multiplier is decomposed bitwise and the addend doubled modulo
/// `c`, so intermediate values stay below `2 * c`. Requires `c > 0` and
/// `c < 2^63`.
pub fn mul_mod(a: u64, mut b: u64, c: u64) -> u64 {
    let mut result = 0;
    let mut add = a % c;

    while b > 0 {
        if b % 2 == 1 {
            result = (result + add) % c;
        }

        add = add * 2 % c;
        b /= 2;
    }

    result
}

/// Computes `(a ^ b) mod c` by binary exponentiation atop [`mul_mod`].
pub fn pow_mod(a: u64, mut b: u64, c: u64) -> u64 {
    let mut result = 1;
    let mut mul = a;

    while b > 0 {
        if b % 2 == 1 {
            result = mul_mod(result, mul, c);
        }

        mul = mul_mod(mul, mul, c);
        b /= 2;
    }

    result
}

/// Searches for a Fermat witness of compositeness.
///
/// Performs up to `repeats` rounds of the Fermat test with random bases
/// in `[1, number - 1]`. Returns a witness if one is found, otherwise 0
/// (probably prime).
pub fn fermat_test<R: Rng + ?Sized>(number: u64, repeats: u64, rng: &mut R) -> u64 {
    if number < 3 {
        return u64::from(number < 2);
    }

    let nd1 = number - 1;

    for _ in 0..repeats {
        let witness = rng.random_range(1..number);

        if pow_mod(witness, nd1, number) != 1 {
            return witness;
        }
    }

    0
}

/// Miller–Rabin witness search.
///
/// Performs up to `repeats` rounds, each drawing a random base in
/// `[1, number - 1]` and looking for either a Fermat witness or a
/// strong (Riemann) witness. Returns the witness found, or 0 when the
/// number is probably prime. Composites are never reported as such
/// incorrectly; the false-positive probability for primality is
/// `(1/4) ^ repeats`.
pub fn mr_test<R: Rng + ?Sized>(number: u64, repeats: u64, rng: &mut R) -> u64 {
    if number < 3 {
        return u64::from(number < 2);
    }

    let nd1 = number - 1;

    for _ in 0..repeats {
        let witness = rng.random_range(1..number);

        if pow_mod(witness, nd1, number) != 1 {
            // a Fermat witness
            return witness;
        }

        let mut rex = nd1;

        while rex % 2 == 0 {
            rex /= 2;

            let m = pow_mod(witness, rex, number);

            if m == nd1 {
                break;
            } else if m != 1 {
                // a Riemann witness
                return witness;
            }
        }
    }

    0
}

/// Returns the smallest probable prime strictly greater than `number`.
pub fn next_prime<R: Rng + ?Sized>(number: u64, rng: &mut R) -> u64 {
    let mut candidate = number;

    loop {
        candidate += 1;

        if mr_test(candidate, NEXT_PRIME_ROUNDS, rng) == 0 {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use super::*;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(0x5eed)
    }

    fn sieve(limit: usize) -> Vec<bool> {
        let mut is_prime = vec![true; limit + 1];

        is_prime[0] = false;
        is_prime[1] = false;

        let mut i = 2;
        while i * i <= limit {
            if is_prime[i] {
                let mut j = i * i;
                while j <= limit {
                    is_prime[j] = false;
                    j += i;
                }
            }
            i += 1;
        }

        is_prime
    }

    #[test]
    fn mul_mod_matches_wide_arithmetic() {
        let cases = [
            (0, 0, 1),
            (17, 19, 23),
            (u64::from(u32::MAX), u64::from(u32::MAX), 4294967291),
            (1 << 40, (1 << 40) + 3, (1 << 45) - 1),
        ];

        for (a, b, c) in cases {
            let expect = ((a as u128 * b as u128) % c as u128) as u64;
            assert_eq!(mul_mod(a, b, c), expect, "({a} * {b}) mod {c}");
        }
    }

    #[test]
    fn pow_mod_matches_reference() {
        assert_eq!(pow_mod(2, 10, 1000), 24);
        assert_eq!(pow_mod(3, 0, 7), 1);
        assert_eq!(pow_mod(7, 560, 561), 1); // Carmichael number passes Fermat
    }

    #[test]
    fn mr_agrees_with_sieve() {
        let mut rng = rng();
        let is_prime = sieve(10_000);

        for n in 2..=10_000u64 {
            let witness = mr_test(n, 40, &mut rng);

            if is_prime[n as usize] {
                assert_eq!(witness, 0, "{n} is prime but a witness was reported");
            } else {
                assert_ne!(witness, 0, "{n} is composite but no witness was found");
            }
        }
    }

    #[test]
    fn mr_rejects_carmichael_numbers() {
        let mut rng = rng();

        // Composites that fool the plain Fermat test for most bases.
        for n in [561, 1105, 1729, 2465, 2821, 6601, 8911] {
            assert_ne!(mr_test(n, 40, &mut rng), 0, "{n} slipped through");
        }
    }

    #[test]
    fn next_prime_is_minimal() {
        let mut rng = rng();
        let is_prime = sieve(10_000);

        for n in 0..2_000u64 {
            let p = next_prime(n, &mut rng);
            let expect = (n as usize + 1..).find(|&m| is_prime[m]).unwrap() as u64;

            assert_eq!(p, expect, "next prime after {n}");
        }
    }

    #[test]
    fn next_prime_handles_large_inputs() {
        let mut rng = rng();

        assert_eq!(next_prime(999_982, &mut rng), 999_983);
        assert_eq!(next_prime(1_000_000, &mut rng), 1_000_003);
        assert_eq!(next_prime(4_294_967_290, &mut rng), 4_294_967_291);
    }

    #[test]
    fn tiny_inputs_are_classified() {
        let mut rng = rng();

        assert_ne!(mr_test(0, 10, &mut rng), 0);
        assert_ne!(mr_test(1, 10, &mut rng), 0);
        assert_eq!(mr_test(2, 10, &mut rng), 0);
        assert_eq!(next_prime(0, &mut rng), 2);
    }
}
