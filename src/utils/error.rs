use thiserror::Error;

#[derive(Error, Debug)]
pub enum PredictError {
    #[error("Zip operation failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Image operation failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("Model inference failed: {0}")]
    Inference(#[from] ort::Error),

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidation { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfig { field: String },

    #[error("Data processing error: {message}")]
    Processing { message: String },
}

pub type Result<T> = std::result::Result<T, PredictError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Data,
    Model,
    Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PredictError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PredictError::ConfigValidation { .. }
            | PredictError::InvalidConfigValue { .. }
            | PredictError::MissingConfig { .. } => ErrorCategory::Configuration,
            PredictError::Inference(_) => ErrorCategory::Model,
            PredictError::Io(_) | PredictError::Zip(_) => ErrorCategory::Io,
            PredictError::Image(_)
            | PredictError::Csv(_)
            | PredictError::Serialization(_)
            | PredictError::Processing { .. } => ErrorCategory::Data,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Model => ErrorSeverity::Critical,
            ErrorCategory::Data => ErrorSeverity::Medium,
            ErrorCategory::Io => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the experiment configuration file and CLI overrides".to_string()
            }
            ErrorCategory::Model => {
                "Verify the ONNX model file and its input/output tensor names".to_string()
            }
            ErrorCategory::Data => {
                "Inspect the dataset images, labels and sample index file".to_string()
            }
            ErrorCategory::Io => "Check file permissions and free disk space".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            PredictError::ConfigValidation { field, message } => {
                format!("Configuration problem ({}): {}", field, message)
            }
            PredictError::InvalidConfigValue { field, reason, .. } => {
                format!("Configuration problem ({}): {}", field, reason)
            }
            PredictError::MissingConfig { field } => {
                format!("Missing configuration field: {}", field)
            }
            PredictError::Inference(e) => format!("Model inference failed: {}", e),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors_are_high_severity() {
        let err = PredictError::MissingConfig {
            field: "dataset.root".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
    }

    #[test]
    fn test_processing_errors_are_data_category() {
        let err = PredictError::Processing {
            message: "label size mismatch".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Data);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn test_user_friendly_message_names_field() {
        let err = PredictError::InvalidConfigValue {
            field: "inference.workers".to_string(),
            value: "0".to_string(),
            reason: "Value must be at least 1".to_string(),
        };
        let msg = err.user_friendly_message();
        assert!(msg.contains("inference.workers"));
        assert!(msg.contains("at least 1"));
    }
}
