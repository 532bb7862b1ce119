//! Ring identity hashing.
//!
//! The ring hash is the digest of the concatenated order hashes, in ring
//! order. Rotating or reversing the orders changes the hash.

use alloy_primitives::B256;

use crate::context::DigestHasher;
use crate::types::OrderRecord;

/// Compute and store each order's hash from its canonical bytes
pub fn hash_orders(orders: &mut [OrderRecord], hasher: &dyn DigestHasher) {
    for order in orders.iter_mut() {
        order.hash = hasher.digest(&order.canonical_bytes());
    }
}

/// Digest of all order hashes concatenated in ring order
pub fn ring_hash(orders: &[OrderRecord], hasher: &dyn DigestHasher) -> B256 {
    let mut buf = Vec::with_capacity(orders.len() * 32);
    for order in orders {
        buf.extend_from_slice(order.hash.as_slice());
    }
    hasher.digest(&buf)
}
