use argon2::Config;

/// Hash a password into an argon2 encoded string with a fresh random salt.
pub fn hash(password: &str) -> Result<String, argon2::Error> {
    let salt: [u8; 32] = rand::random();
    argon2::hash_encoded(password.as_bytes(), &salt, &Config::default())
}

/// Check a password against an encoded hash produced by [`hash`].
#[cfg(test)]
pub(crate) fn verify(encoded: &str, password: &str) -> Result<bool, argon2::Error> {
    argon2::verify_encoded(encoded, password.as_bytes())
}
