//! Answer checking for the subnetting exercise

use serde::{Deserialize, Deserializer, Serialize};

/// A submitted answer. Never persisted.
///
/// A missing, null or non-string mask reads as empty, which never matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabAnswer {
    /// Submitted subnet mask, compared verbatim
    #[serde(
        default,
        alias = "subnet",
        alias = "subnetMask",
        deserialize_with = "string_or_empty"
    )]
    pub subnet_mask: String,
}

fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(mask) => Ok(mask),
        _ => Ok(String::new()),
    }
}

impl LabAnswer {
    /// Answer carrying `subnet_mask`
    pub fn new(subnet_mask: impl Into<String>) -> Self {
        LabAnswer {
            subnet_mask: subnet_mask.into(),
        }
    }
}

/// Checks answers against the exercise's single expected mask
#[derive(Debug, Clone)]
pub struct AnswerValidator {
    expected_subnet_mask: String,
}

impl AnswerValidator {
    /// Validator accepting exactly `expected_subnet_mask`
    pub fn new(expected_subnet_mask: impl Into<String>) -> Self {
        AnswerValidator {
            expected_subnet_mask: expected_subnet_mask.into(),
        }
    }

    /// Exact string equality; no trimming or normalisation
    pub fn validate(&self, answer: &LabAnswer) -> bool {
        answer.subnet_mask == self.expected_subnet_mask
    }
}

impl Default for AnswerValidator {
    fn default() -> Self {
        AnswerValidator::new("255.255.255.0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_mask_passes() {
        assert!(AnswerValidator::default().validate(&LabAnswer::new("255.255.255.0")));
    }

    #[test]
    fn test_everything_else_fails() {
        let validator = AnswerValidator::default();
        for wrong in ["", "255.255.0.0", " 255.255.255.0", "255.255.255.0 ", "/24", "255.255.255.00"] {
            assert!(!validator.validate(&LabAnswer::new(wrong)), "accepted {:?}", wrong);
        }
    }

    #[test]
    fn test_wire_aliases() {
        for body in [
            r#"{"subnet":"255.255.255.0"}"#,
            r#"{"subnet_mask":"255.255.255.0"}"#,
            r#"{"subnetMask":"255.255.255.0"}"#,
        ] {
            let answer: LabAnswer = serde_json::from_str(body).unwrap();
            assert_eq!(answer.subnet_mask, "255.255.255.0");
        }
    }

    #[test]
    fn test_malformed_answers_read_as_empty() {
        for body in [
            r#"{}"#,
            r#"{"subnet":null}"#,
            r#"{"subnet":24}"#,
            r#"{"subnet":["255.255.255.0"]}"#,
        ] {
            let answer: LabAnswer = serde_json::from_str(body).unwrap();
            assert_eq!(answer.subnet_mask, "", "body {}", body);
            assert!(!AnswerValidator::default().validate(&answer));
        }
    }
}
