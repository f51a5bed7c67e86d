#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProfileValidationError {
    #[error("Full name cannot be empty")]
    EmptyFullName,
}
