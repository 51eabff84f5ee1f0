//! Form validation rules.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::Regex;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));

/// A single validation rule.
#[derive(Debug, Clone)]
pub enum Rule {
    Required,
    Email,
    MinLength(usize),
    MaxLength(usize),
    Pattern(Regex),
}

impl Rule {
    /// Whether `value` satisfies this rule. Lengths count characters.
    pub fn check(&self, value: &str) -> bool {
        match self {
            Self::Required => !value.trim().is_empty(),
            Self::Email => EMAIL_RE.is_match(value),
            Self::MinLength(min) => value.chars().count() >= *min,
            Self::MaxLength(max) => value.chars().count() <= *max,
            Self::Pattern(re) => re.is_match(value),
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Required => "This field is required.".to_string(),
            Self::Email => "Please enter a valid email address.".to_string(),
            Self::MinLength(min) => format!("Please enter at least {min} characters."),
            Self::MaxLength(max) => format!("Please enter no more than {max} characters."),
            Self::Pattern(_) => "The format is not valid.".to_string(),
        }
    }
}

/// Message of the first rule `value` fails, if any.
pub fn validate(value: &str, rules: &[Rule]) -> Option<String> {
    rules.iter().find(|r| !r.check(value)).map(Rule::message)
}

/// Outcome of validating a whole form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValidation {
    pub is_valid: bool,
    /// Field name → first error message.
    pub errors: BTreeMap<String, String>,
}

/// Validate submitted `fields` against per-field `rules`.
///
/// Fields named in `rules` but absent from the form are skipped.
pub fn validate_form(fields: &HashMap<String, String>, rules: &[(&str, Vec<Rule>)]) -> FormValidation {
    let errors: BTreeMap<String, String> = rules
        .iter()
        .filter_map(|(name, field_rules)| {
            let value = fields.get(*name)?;
            validate(value, field_rules).map(|msg| (name.to_string(), msg))
        })
        .collect();

    FormValidation {
        is_valid: errors.is_empty(),
        errors,
    }
}
