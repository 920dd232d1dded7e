use crate::server::response::ApiError;

const MAX_NAME_LEN: usize = 100;
const MAX_URL_LEN: usize = 2048;

fn validate_name(value: &str, field: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} cannot be empty"));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(format!("{field} cannot exceed {MAX_NAME_LEN} characters"));
    }
    if value.chars().any(char::is_control) {
        return Err(format!("{field} cannot contain control characters"));
    }
    Ok(())
}

fn validate_url(value: &str, field: &str) -> Result<(), String> {
    if value.len() > MAX_URL_LEN {
        return Err(format!("{field} cannot exceed {MAX_URL_LEN} bytes"));
    }
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        return Err(format!("{field} must be an http or https URL"));
    }
    Ok(())
}

/// Checks the natural key and the README URL of a submission.
pub fn validate_submission(
    organization: &str,
    project: &str,
    readme: &str,
) -> Result<(), ApiError> {
    validate_name(organization, "organization")
        .and_then(|()| validate_name(project, "project"))
        .and_then(|()| validate_url(readme, "readme"))
        .map_err(ApiError::bad_request)
}
