//! Key derivation for the disable entry and the null-sentinel constant.
//!
//! `DISABLE(K)` must co-locate with `K` under any sharding scheme the cache
//! store uses. For a Redis-family store that means wrapping `K` in a
//! hash-tag (`{...}`) substring, so a cluster client routes both keys to
//! the same shard. Other cache stores would need an equivalent mechanism;
//! this module only implements the Redis-style hash-tag form since that's
//! the only backend this crate ships.

/// Reserved string marking "confirmed absent in the record store".
///
/// Any legitimate JSON-serialized record can never equal this literal, so
/// it's safe to install as a cache value in place of the record itself.
pub const NULL_SENTINEL: &str = "Err_Syntax_Null_Data";

/// Derives the disable-entry key for a given value-entry key.
///
/// The `{}` hash-tag wrapping ensures a Redis Cluster client hashes both
/// `key` and `disable_key(key)` onto the same slot, which is required for
/// the atomic script in [`crate::store::redis::SCRIPT_PUT_IF_ENABLED`] to
/// operate on both keys in a single shard-local execution.
#[must_use]
pub fn disable_key(key: &str) -> String {
    format!("Enable_Lock_Key_{{{key}}}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disable_key_embeds_original_key_in_hash_tag() {
        assert_eq!(disable_key("user:123"), "Enable_Lock_Key_{user:123}");
    }

    #[test]
    fn null_sentinel_is_stable() {
        assert_eq!(NULL_SENTINEL, "Err_Syntax_Null_Data");
    }
}
