pub mod tracing;

use rand::{distributions::Alphanumeric, Rng};

/// Opaque bearer secret for sessions and upload targets.
pub fn random_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}
