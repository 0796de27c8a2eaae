//! Collected validation outcome.

use amazon_error::{AmazonError, AmazonResult, FieldViolation};

/// Outcome of a validation pass.
///
/// Validation never throws: violations are collected so that all of them can
/// be reported in one error. Warnings never fail a request.
///
/// # Examples
///
/// ```
/// use amazon_validation::ValidationResult;
///
/// let mut result = ValidationResult::default();
/// result.push_warning("range", "DATE_RANGE_TOO_LARGE", "longer than 90 days");
/// assert!(result.is_valid());
/// assert_eq!(result.into_result().unwrap().len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    errors: Vec<FieldViolation>,
    warnings: Vec<FieldViolation>,
}

impl ValidationResult {
    /// An empty, valid result.
    pub fn valid() -> Self {
        Self::default()
    }

    /// True when no errors were collected.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Collected errors in discovery order.
    pub fn errors(&self) -> &[FieldViolation] {
        &self.errors
    }

    /// Collected warnings in discovery order.
    pub fn warnings(&self) -> &[FieldViolation] {
        &self.warnings
    }

    /// Record an error.
    pub fn push_error(
        &mut self,
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.errors.push(FieldViolation::new(field, code, message));
    }

    /// Record an error together with the value that caused it.
    pub fn push_invalid(
        &mut self,
        field: impl Into<String>,
        value: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.errors
            .push(FieldViolation::new(field, code, message).with_value(value));
    }

    /// Record a warning.
    pub fn push_warning(
        &mut self,
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.warnings.push(FieldViolation::new(field, code, message));
    }

    /// Append everything from `other`.
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Chainable [`merge`](Self::merge).
    pub fn and(mut self, other: ValidationResult) -> Self {
        self.merge(other);
        self
    }

    /// Raise the collected errors, or hand back the warnings.
    ///
    /// One error becomes a validation error carrying that violation's code
    /// and value; several become a multiple-validation error.
    #[track_caller]
    pub fn into_result(self) -> AmazonResult<Vec<FieldViolation>> {
        let mut errors = self.errors;
        match errors.len() {
            0 => Ok(self.warnings),
            1 => {
                let violation = errors.remove(0);
                let message = format!("{}: {}", violation.field, violation.message);
                Err(
                    AmazonError::validation(
                        violation.field,
                        violation.value,
                        violation.message,
                        message,
                    )
                        .with_code(violation.code),
                )
            }
            _ => Err(AmazonError::multiple_validation(errors)),
        }
    }
}
