use rand::Rng;

use crate::node::NodeId;

/// Length of generated node ids
pub const ID_LENGTH: usize = 9;

const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a random base-36 node id.
///
/// Ids are not checked against the document; 36^9 possible tokens keep
/// collisions out of reach for a single editing session.
pub fn generate_id() -> NodeId {
    let mut rng = rand::thread_rng();
    (0..ID_LENGTH)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}
