use super::account::{AccountHolder, Administrator};
use rust_decimal::prelude::*;
use std::fmt;
use thiserror::Error;

pub(crate) const PIN_LENGTH: usize = 5;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub(crate) enum ValidationError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("PIN code must be exactly {} digits", PIN_LENGTH)]
    MalformedPin,

    #[error("{0:?} is not a number")]
    NotANumber(String),

    #[error("amount must be greater than zero, got {0}")]
    NonPositiveAmount(Decimal),

    #[error("menu option {0} is out of range")]
    MenuOutOfRange(String),
}

type ValidationResult<T> = Result<T, ValidationError>;

fn non_empty(field: &'static str, raw: &str) -> ValidationResult<String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(value.to_string())
}

/// Unique key of an account holder or administrator
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Login(String);

impl Login {
    pub(crate) fn parse(raw: &str) -> ValidationResult<Self> {
        non_empty("login", raw).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Login {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Five digit credential, compared by exact match.
///
/// Has no `Display`, and `Debug` is redacted: a PIN must never reach the logs.
#[derive(Clone, PartialEq, Eq)]
pub struct PinCode(String);

impl PinCode {
    pub(crate) fn parse(raw: &str) -> ValidationResult<Self> {
        let pin = raw.trim();
        if pin.len() != PIN_LENGTH || !pin.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::MalformedPin);
        }
        Ok(Self(pin.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PinCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PinCode(*****)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolderName(String);

impl HolderName {
    pub(crate) fn parse(raw: &str) -> ValidationResult<Self> {
        non_empty("holder name", raw).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub login: Login,
    pub pin: PinCode,
}

impl Credentials {
    pub(crate) fn parse(login: &str, pin: &str) -> ValidationResult<Self> {
        Ok(Self {
            login: Login::parse(login)?,
            pin: PinCode::parse(pin)?,
        })
    }
}

/// A resolved user. Both roles share login and PIN but behave differently,
/// so the session dispatches on the variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Identity {
    Holder(AccountHolder),
    Admin(Administrator),
}

impl Identity {
    pub fn login(&self) -> &Login {
        match self {
            Identity::Holder(holder) => &holder.login,
            Identity::Admin(admin) => &admin.login,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("12345" ; "five digits")]
    #[test_case(" 00000 " ; "surrounding whitespace")]
    fn accepts_well_formed_pin(raw: &str) {
        assert_eq!(PinCode::parse(raw).unwrap().as_str(), raw.trim());
    }

    #[test_case("" ; "empty")]
    #[test_case("1111" ; "too short")]
    #[test_case("123456" ; "too long")]
    #[test_case("12a45" ; "not a digit")]
    fn rejects_malformed_pin(raw: &str) {
        assert_eq!(PinCode::parse(raw), Err(ValidationError::MalformedPin));
    }

    #[test]
    fn login_is_trimmed_and_non_empty() {
        assert_eq!(Login::parse("  alice ").unwrap().as_str(), "alice");
        assert_eq!(
            Login::parse("   "),
            Err(ValidationError::EmptyField("login"))
        );
    }

    #[test]
    fn pin_debug_is_redacted() {
        let credentials = Credentials::parse("alice", "12345").unwrap();
        let rendered = format!("{credentials:?}");
        assert!(!rendered.contains("12345"));
        assert!(rendered.contains("alice"));
    }
}
