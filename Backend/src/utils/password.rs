use hmac::Hmac;
use pbkdf2::pbkdf2;
use sha2::Sha256;
use rand::Rng;
use base64::{Engine, engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD}};

use crate::errors::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

// Itérations réduites en test, le nombre réel est relu depuis le hash stocké
const ITERATIONS: u32 = if cfg!(test) { 1_000 } else { 260_000 };
const KEY_LENGTH: usize = 32;

/// Hash un mot de passe au format Werkzeug
/// Utilise PBKDF2-HMAC-SHA256 et un salt de 16 bytes
pub fn hash_password(password: &str) -> AppResult<String> {
    // Générer un salt aléatoire de 16 bytes
    let mut salt = [0u8; 16];
    rand::thread_rng().fill(&mut salt);

    // Calculer le hash PBKDF2
    let mut key = [0u8; KEY_LENGTH];
    pbkdf2::<HmacSha256>(password.as_bytes(), &salt, ITERATIONS, &mut key)
        .map_err(|e| AppError::Internal(format!("PBKDF2 hash generation failed: {}", e)))?;

    // Encoder en base64 URL-safe sans padding (format Werkzeug moderne)
    let salt_b64 = URL_SAFE_NO_PAD.encode(salt);
    let hash_b64 = URL_SAFE_NO_PAD.encode(key);

    // Format: pbkdf2:sha256:iterations$salt$hash
    Ok(format!("pbkdf2:sha256:{}${}${}", ITERATIONS, salt_b64, hash_b64))
}

/// Vérifie un mot de passe contre un hash Werkzeug
/// Supporte les formats: base64 (nouveau) et hex (ancien)
pub fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    // Parser le format: pbkdf2:sha256:iterations$salt$hash
    let parts: Vec<&str> = stored_hash.split('$').collect();
    let [header_and_iterations, salt_str, hash_str] = parts.as_slice() else {
        return Err(AppError::Internal("Invalid hash format".to_string()));
    };

    // Extraire les itérations du header
    let header_parts: Vec<&str> = header_and_iterations.split(':').collect();
    let [_, _, iterations] = header_parts.as_slice() else {
        return Err(AppError::Internal("Invalid hash header".to_string()));
    };

    let iterations = iterations
        .parse::<u32>()
        .map_err(|_| AppError::Internal("Invalid iterations".to_string()))?;

    // Décoder salt et hash (supporte plusieurs formats pour compatibilité)
    let salt = decode_flexible(salt_str)?;
    let expected_hash = decode_flexible(hash_str)?;

    // Calculer le hash avec le même salt et iterations
    let mut computed = vec![0u8; expected_hash.len()];
    pbkdf2::<HmacSha256>(password.as_bytes(), &salt, iterations, &mut computed)
        .map_err(|e| AppError::Internal(format!("PBKDF2 hash verification failed: {}", e)))?;

    Ok(constant_time_eq(&computed, &expected_hash))
}

// Comparaison sans sortie anticipée (timing attacks)
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Salt et hash stockés en base64 (URL-safe ou standard, paddés ou non) ou en hex
fn decode_flexible(input: &str) -> AppResult<Vec<u8>> {
    if input.len() == 64 && input.chars().all(|c| c.is_ascii_hexdigit()) {
        return hex::decode(input).map_err(|e| AppError::Internal(format!("Hex decode failed: {}", e)));
    }

    let padded = format!("{}{}", input, "=".repeat((4 - input.len() % 4) % 4));
    [URL_SAFE.decode(&padded), STANDARD.decode(&padded)]
        .into_iter()
        .find_map(Result::ok)
        .or_else(|| hex::decode(input).ok())
        .ok_or_else(|| AppError::Internal("Failed to decode stored hash".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("s3cret-pass").unwrap();

        assert!(hash.starts_with("pbkdf2:sha256:"));
        assert!(verify_password("s3cret-pass", &hash).unwrap());
        assert!(!verify_password("wrong-pass", &hash).unwrap());
    }

    #[test]
    fn test_same_password_gets_different_salts() {
        let first = hash_password("repeat").unwrap();
        let second = hash_password("repeat").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(verify_password("x", "not-a-hash").is_err());
        assert!(verify_password("x", "pbkdf2:sha256$abc$def").is_err());
    }

    #[test]
    fn test_hex_encoded_hash_is_accepted() {
        let salt = b"legacy-salt";
        let mut key = [0u8; KEY_LENGTH];
        pbkdf2::<HmacSha256>(b"legacy", salt, 1_000, &mut key).unwrap();
        let stored = format!("pbkdf2:sha256:1000${}${}", URL_SAFE_NO_PAD.encode(salt), hex::encode(key));

        assert!(verify_password("legacy", &stored).unwrap());
    }
}
