use serde::Serialize;

/// Success envelope returned by every catalog endpoint.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ApiResponse<T> {
    /// Always `true`.
    pub success: bool,
    #[schema(example = "Tobacco saved")]
    pub message: String,
    pub body: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, body: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            body,
        }
    }
}

/// Validate a trimmed display name (1-256 Unicode characters).
pub fn validate_name(name: &str) -> Result<String, String> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > 256 {
        return Err("Name must be 1-256 characters".into());
    }
    Ok(name.to_string())
}
