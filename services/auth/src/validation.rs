//! Input validation utilities

const MAX_FIELD_LEN: usize = 128;

/// Validate username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.trim().is_empty() {
        return Err("Username is required".to_string());
    }

    if username.len() > MAX_FIELD_LEN {
        return Err(format!(
            "Username must be at most {MAX_FIELD_LEN} characters long"
        ));
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.trim().is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() > MAX_FIELD_LEN {
        return Err(format!(
            "Password must be at most {MAX_FIELD_LEN} characters long"
        ));
    }

    Ok(())
}
