//! Content hashing for cache keys

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Mix the hash of `value` into `seed`
///
/// Order matters: combining `a` then `b` differs from `b` then `a`. Floats do
/// not implement [`Hash`]; pass `f32::to_bits` so keys are bit-exact.
pub fn combine_hash<T: Hash + ?Sized>(seed: &mut u64, value: &T) {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    let hash = hasher.finish();

    *seed ^= hash
        .wrapping_add(0x9e37_79b9_7f4a_7c15)
        .wrapping_add(*seed << 6)
        .wrapping_add(*seed >> 2);
}

/// Combine any number of [`Hash`] values into one `u64`
///
/// ```rust
/// let a = lumos::hash_combine!(1u32, "depth", 0.5f32.to_bits());
/// let b = lumos::hash_combine!(1u32, "depth", 0.5f32.to_bits());
/// assert_eq!(a, b);
/// ```
#[macro_export]
macro_rules! hash_combine {
    ($($value:expr),+ $(,)?) => {{
        let mut seed = 0u64;
        $( $crate::render::resources::combine_hash(&mut seed, &$value); )+
        seed
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_hash_combine_is_order_sensitive() {
        assert_ne!(hash_combine!(1u32, 2u32), hash_combine!(2u32, 1u32));
    }

    #[test]
    fn test_float_bits_distinguish_close_values() {
        let a = hash_combine!(1.0f32.to_bits());
        let b = hash_combine!((1.0f32 + f32::EPSILON).to_bits());
        assert_ne!(a, b);
        assert_eq!(a, hash_combine!(1.0f32.to_bits()));
    }
}
