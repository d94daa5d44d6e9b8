/// Hash a password with bcrypt at the configured cost.
pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

/// Constant-time check of `password` against a stored bcrypt hash.
/// Malformed hashes never verify.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}
