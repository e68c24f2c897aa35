use rand::Rng;

/// Length in hex characters of generated ids (128 random bits)
pub const ID_LENGTH: usize = 32;

/// Draw a random id.
pub fn random_id() -> String {
    let bits: u128 = rand::thread_rng().gen();
    format!("{:032x}", bits)
}

/// Draw ids until one is not already taken.
///
/// `taken` is asked about every candidate, so it should check every store that shares the id
/// space.
pub fn next_id<F>(mut taken: F) -> String
where
    F: FnMut(&str) -> bool,
{
    loop {
        let candidate = random_id();
        if !taken(&candidate) {
            return candidate;
        }
        tracing::debug!(%candidate, "Generated id already in use, drawing again");
    }
}
