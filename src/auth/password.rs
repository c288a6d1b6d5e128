use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

/// Well-formed PHC string with default argon2id parameters that no password matches.
const ABSENT_ACCOUNT_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$bG9naW4tdGltaW5nLXBhZA$AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8";

fn salt() -> Result<SaltString, argon2::password_hash::Error> {
    use rand::Rng;
    let mut bytes = [0u8; 16];
    rand::rng().fill(&mut bytes);
    SaltString::encode_b64(&bytes)
}

/// Hash a password into a PHC string; salt and cost parameters are embedded in the output.
pub fn hash(password: &str) -> Result<String, argon2::password_hash::Error> {
    Argon2::default()
        .hash_password(password.as_bytes(), &salt()?)
        .map(|h| h.to_string())
}

/// `false` on mismatch and on a malformed stored hash alike.
pub fn verify(password: &str, hashword: &str) -> bool {
    PasswordHash::new(hashword)
        .ok()
        .as_ref()
        .map(|hash| {
            Argon2::default()
                .verify_password(password.as_bytes(), hash)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Full-cost verification for a username with no account. Always `false`;
/// keeps unknown-user logins as slow as wrong-password ones.
pub fn verify_absent(password: &str) -> bool {
    verify(password, ABSENT_ACCOUNT_HASH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_own_hash() {
        let hashed = hash("admin123").unwrap();
        assert!(hashed.starts_with("$argon2"));
        assert!(verify("admin123", &hashed));
        assert!(!verify("admin124", &hashed));
    }

    #[test]
    fn same_password_gets_fresh_salt() {
        assert_ne!(hash("secret").unwrap(), hash("secret").unwrap());
    }

    #[test]
    fn absent_account_hash_costs_a_real_verification() {
        let parsed = PasswordHash::new(ABSENT_ACCOUNT_HASH).unwrap();
        let params = argon2::Params::try_from(&parsed).unwrap();
        let defaults = argon2::Params::default();
        assert_eq!(params.m_cost(), defaults.m_cost());
        assert_eq!(params.t_cost(), defaults.t_cost());
        assert_eq!(params.p_cost(), defaults.p_cost());

        assert!(!verify_absent("admin123"));
        assert!(!verify_absent(""));
    }

    #[test]
    fn malformed_hash_is_a_mismatch() {
        assert!(!verify("anything", ""));
        assert!(!verify("anything", "not-a-phc-string"));
        assert!(!verify("anything", "$2a$10$abcdefghijklmnopqrstuv"));
    }
}
