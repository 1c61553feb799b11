use crate::utils::error::{PredictError, Result};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(PredictError::InvalidConfigValue {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(PredictError::InvalidConfigValue {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(PredictError::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PredictError::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(PredictError::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

pub fn validate_file_extension(field_name: &str, path: &str, allowed: &[&str]) -> Result<()> {
    let allowed_set: HashSet<&str> = allowed.iter().copied().collect();

    match std::path::Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
    {
        Some(extension) if allowed_set.contains(extension) => Ok(()),
        Some(extension) => Err(PredictError::InvalidConfigValue {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: format!(
                "Unsupported file extension: {}. Allowed extensions: {}",
                extension,
                allowed.join(", ")
            ),
        }),
        None => Err(PredictError::InvalidConfigValue {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "File has no extension or invalid filename".to_string(),
        }),
    }
}

/// Checks that a template string carries a literal placeholder such as `$version`.
pub fn validate_placeholder(field_name: &str, template: &str, placeholder: &str) -> Result<()> {
    if !template.contains(placeholder) {
        return Err(PredictError::InvalidConfigValue {
            field: field_name.to_string(),
            value: template.to_string(),
            reason: format!("Template must contain the {} placeholder", placeholder),
        });
    }
    Ok(())
}

pub fn validate_channel_stats(field_name: &str, values: &[f32], require_positive: bool) -> Result<()> {
    if values.len() != 3 {
        return Err(PredictError::InvalidConfigValue {
            field: field_name.to_string(),
            value: format!("{:?}", values),
            reason: "Expected exactly 3 channel values".to_string(),
        });
    }

    for v in values {
        if !v.is_finite() || (require_positive && *v <= 0.0) {
            return Err(PredictError::InvalidConfigValue {
                field: field_name.to_string(),
                value: v.to_string(),
                reason: if require_positive {
                    "Channel values must be finite and positive".to_string()
                } else {
                    "Channel values must be finite".to_string()
                },
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("output.dir", "./inputs").is_ok());
        assert!(validate_path("output.dir", "").is_err());
        assert!(validate_path("output.dir", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("inference.workers", 4, 1).is_ok());
        assert!(validate_positive_number("inference.workers", 0, 1).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("tool.format.line-length", 88, 40, 200).is_ok());
        assert!(validate_range("tool.format.line-length", 20, 40, 200).is_err());
        assert!(validate_range("tool.format.line-length", 300, 40, 200).is_err());
    }

    #[test]
    fn test_validate_file_extension() {
        assert!(validate_file_extension("model.weights", "net.onnx", &["onnx"]).is_ok());
        assert!(validate_file_extension("model.weights", "net.pth", &["onnx"]).is_err());
        assert!(validate_file_extension("model.weights", "net", &["onnx"]).is_err());
    }

    #[test]
    fn test_validate_placeholder() {
        assert!(validate_placeholder("tag-format", "v$version", "$version").is_ok());
        assert!(validate_placeholder("tag-format", "v1.0", "$version").is_err());
    }

    #[test]
    fn test_validate_channel_stats() {
        assert!(validate_channel_stats("dataset.std", &[0.2, 0.2, 0.2], true).is_ok());
        assert!(validate_channel_stats("dataset.std", &[0.2, 0.0, 0.2], true).is_err());
        assert!(validate_channel_stats("dataset.mean", &[0.5, 0.5], false).is_err());
        assert!(validate_channel_stats("dataset.mean", &[0.5, f32::NAN, 0.5], false).is_err());
    }
}
