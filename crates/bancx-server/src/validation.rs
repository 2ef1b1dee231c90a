//! Password strength policy.

/// Symbols accepted by the password policy.
const PASSWORD_SYMBOLS: &str = "!@#$%^&*(),.?\":{}|<>_-+=[]\\/~`";

/// Minimum password length in characters.
const MIN_PASSWORD_LEN: usize = 12;

/// Check the password strength policy, returning the first failing rule as
/// its user-visible message.
pub fn validate_password_strength(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err("La contraseña debe tener al menos 12 caracteres");
    }
    // checked before the character classes: an all-whitespace password fails
    // every class rule and would otherwise be reported as a missing class
    if password.trim().is_empty() {
        return Err("La contraseña no puede estar compuesta solo de espacios");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("La contraseña debe contener al menos una mayúscula");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("La contraseña debe contener al menos una minúscula");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("La contraseña debe contener al menos un número");
    }
    if !password.chars().any(|c| PASSWORD_SYMBOLS.contains(c)) {
        return Err("La contraseña debe contener al menos un símbolo");
    }
    Ok(())
}
