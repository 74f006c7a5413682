use super::account::NewAccount;
use super::identity::{Credentials, Login, PinCode, ValidationError};
use super::terminal::Terminal;
use super::transaction::Amount;
use std::io;
use std::num::NonZeroUsize;
use std::ops::RangeInclusive;
use thiserror::Error;

pub(crate) const INVALID_INPUT: &str = "Invalid input. Please try again.";
pub(crate) const INVALID_AMOUNT: &str = "Invalid amount. Please try again.";
pub(crate) const INVALID_OPTION: &str = "Invalid option. Please try again.";

#[derive(Error, Debug)]
pub(crate) enum InputError {
    #[error("input closed")]
    Closed,

    #[error("gave up after {0} invalid attempts")]
    AttemptsExhausted(usize),

    #[error("terminal error - {0}")]
    Io(#[from] io::Error),
}

pub(crate) type InputResult<T> = Result<T, InputError>;

/// How many consecutive invalid answers a prompt accepts before giving up.
/// `None` keeps asking forever.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: Option<NonZeroUsize>,
}

impl RetryPolicy {
    pub(crate) fn unbounded() -> Self {
        Self { max_attempts: None }
    }

    pub(crate) fn bounded(max_attempts: NonZeroUsize) -> Self {
        Self {
            max_attempts: Some(max_attempts),
        }
    }

    fn exhausted(&self, attempts: usize) -> bool {
        self.max_attempts.map_or(false, |max| attempts >= max.get())
    }
}

/// Asks for values until they validate, emitting `invalid_message` after
/// every rejected answer.
pub(crate) struct Prompter<T> {
    terminal: T,
    policy: RetryPolicy,
}

impl<T: Terminal> Prompter<T> {
    pub(crate) fn new(terminal: T, policy: RetryPolicy) -> Self {
        Self { terminal, policy }
    }

    pub(crate) fn emit(&mut self, message: &str) -> InputResult<()> {
        Ok(self.terminal.emit_line(message)?)
    }

    fn ask(&mut self, message: &str) -> InputResult<String> {
        self.terminal.prompt_line(message)?.ok_or(InputError::Closed)
    }

    fn retry<V>(
        &mut self,
        invalid_message: &str,
        mut attempt: impl FnMut(&mut Self) -> InputResult<Result<V, ValidationError>>,
    ) -> InputResult<V> {
        let mut attempts = 0;
        loop {
            match attempt(self)? {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempts += 1;
                    debug!("rejected input ({err}), attempt {attempts}");
                    self.emit(invalid_message)?;
                    if self.policy.exhausted(attempts) {
                        return Err(InputError::AttemptsExhausted(attempts));
                    }
                }
            }
        }
    }

    pub(crate) fn credentials(&mut self) -> InputResult<Credentials> {
        self.retry(INVALID_INPUT, |p| {
            let login = p.ask("Please enter your login: ")?;
            let pin = p.ask("Please enter your 5-digit PIN code: ")?;
            Ok(Credentials::parse(&login, &pin))
        })
    }

    pub(crate) fn login(&mut self, message: &str) -> InputResult<Login> {
        self.retry(INVALID_INPUT, |p| Ok(Login::parse(&p.ask(message)?)))
    }

    pub(crate) fn pin(&mut self, message: &str) -> InputResult<PinCode> {
        self.retry(INVALID_INPUT, |p| Ok(PinCode::parse(&p.ask(message)?)))
    }

    pub(crate) fn new_account(&mut self) -> InputResult<NewAccount> {
        self.retry(INVALID_INPUT, |p| {
            let login = p.ask("Enter new customer login: ")?;
            let pin = p.ask("Enter new PIN code (5 digits): ")?;
            let holder_name = p.ask("Enter new holder name: ")?;
            Ok(NewAccount::parse(&login, &pin, &holder_name))
        })
    }

    pub(crate) fn amount(&mut self, message: &str) -> InputResult<Amount> {
        self.retry(INVALID_AMOUNT, |p| Ok(Amount::parse(&p.ask(message)?)))
    }

    /// Prints `menu` and reads a selection within `range`.
    pub(crate) fn menu_choice(
        &mut self,
        menu: &[&str],
        range: RangeInclusive<u8>,
    ) -> InputResult<u8> {
        self.retry(INVALID_OPTION, |p| {
            for line in menu {
                p.emit(line)?;
            }
            let raw = p.ask("")?;
            Ok(parse_choice(&raw, &range))
        })
    }
}

fn parse_choice(raw: &str, range: &RangeInclusive<u8>) -> Result<u8, ValidationError> {
    let raw = raw.trim();
    match raw.parse::<u8>() {
        Ok(choice) if range.contains(&choice) => Ok(choice),
        Ok(_) => Err(ValidationError::MenuOutOfRange(raw.to_string())),
        Err(_) => Err(ValidationError::NotANumber(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::terminal::ConsoleTerminal;
    use std::io::Cursor;
    use test_case::test_case;

    type Scripted = ConsoleTerminal<Cursor<&'static str>, Vec<u8>>;

    fn prompter(input: &'static str, policy: RetryPolicy) -> Prompter<Scripted> {
        Prompter::new(ConsoleTerminal::new(Cursor::new(input), Vec::new()), policy)
    }

    fn transcript(prompter: &Prompter<Scripted>) -> String {
        String::from_utf8(prompter.terminal.output().clone()).unwrap()
    }

    #[test]
    fn credentials_retry_until_pin_is_well_formed() {
        let mut p = prompter("admin\n1111\nadmin1\n11111\n", RetryPolicy::unbounded());
        let credentials = p.credentials().unwrap();
        assert_eq!(credentials.login.as_str(), "admin1");
        assert_eq!(credentials.pin.as_str(), "11111");
        assert_eq!(
            transcript(&p),
            "Please enter your login: Please enter your 5-digit PIN code: \
             Invalid input. Please try again.\n\
             Please enter your login: Please enter your 5-digit PIN code: "
        );
    }

    #[test]
    fn amount_rejects_non_positive_values() {
        let mut p = prompter("-1\nabc\n0\n100\n", RetryPolicy::unbounded());
        assert_eq!(p.amount("Enter amount to withdraw: ").unwrap().to_string(), "100");
        assert_eq!(transcript(&p).matches(INVALID_AMOUNT).count(), 3);
    }

    #[test]
    fn new_account_requires_every_field() {
        let mut p = prompter(
            "alice\n12345\n\nalice\n12345\nAlice A\n",
            RetryPolicy::unbounded(),
        );
        let account = p.new_account().unwrap();
        assert_eq!(account.login.as_str(), "alice");
        assert_eq!(account.holder_name.as_str(), "Alice A");
        assert_eq!(transcript(&p).matches(INVALID_INPUT).count(), 1);
    }

    #[test_case("3", Ok(3) ; "in range")]
    #[test_case(" 1 ", Ok(1) ; "padded")]
    #[test_case("0", Err(ValidationError::MenuOutOfRange("0".into())) ; "below range")]
    #[test_case("5", Err(ValidationError::MenuOutOfRange("5".into())) ; "above range")]
    #[test_case("x", Err(ValidationError::NotANumber("x".into())) ; "not a number")]
    #[test_case("", Err(ValidationError::NotANumber("".into())) ; "empty")]
    fn menu_choice_parsing(raw: &str, expected: Result<u8, ValidationError>) {
        assert_eq!(parse_choice(raw, &(1..=4)), expected);
    }

    #[test]
    fn menu_is_shown_again_after_invalid_option() {
        let mut p = prompter("9\n2\n", RetryPolicy::unbounded());
        assert_eq!(p.menu_choice(&["menu"], 1..=4).unwrap(), 2);
        assert_eq!(
            transcript(&p),
            "menu\nInvalid option. Please try again.\nmenu\n"
        );
    }

    #[test]
    fn bounded_policy_gives_up() {
        let policy = RetryPolicy::bounded(NonZeroUsize::new(2).unwrap());
        let mut p = prompter("\n\n\nalice\n", policy);
        assert!(matches!(
            p.login("login: "),
            Err(InputError::AttemptsExhausted(2))
        ));
    }

    #[test]
    fn closed_input_stops_an_unbounded_prompt() {
        let mut p = prompter("\n\n", RetryPolicy::unbounded());
        assert!(matches!(p.pin("pin: "), Err(InputError::Closed)));
    }
}
