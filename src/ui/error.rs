use thiserror::Error;

/// Client-side validation failures; these block the request entirely.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormError {
    #[error("{0} is required.")]
    MissingField(&'static str),

    #[error("{field} must be a number (got '{value}').")]
    InvalidNumber { field: String, value: String },

    #[error("'{value}' is not a valid choice for {field}.")]
    InvalidChoice { field: &'static str, value: String },
}
