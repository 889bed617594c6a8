//! Identifier generation for files, folders, and anonymous users.

use rand::distr::{Alphanumeric, SampleString};

/// Length of each random segment.
const SEGMENT_LENGTH: usize = 12;

/// Generate a new opaque, URL-safe identifier.
///
/// Identifiers are 24 alphanumeric characters produced as two independent
/// random segments, which keeps collision probability negligible for the
/// expected volume. Infallible and non-blocking.
pub fn new_id() -> String {
    let mut rng = rand::rng();
    let mut id = Alphanumeric.sample_string(&mut rng, SEGMENT_LENGTH);
    id.push_str(&Alphanumeric.sample_string(&mut rng, SEGMENT_LENGTH));
    id
}
