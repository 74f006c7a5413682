use super::account::{AccountError, AccountHolder, AccountResult, Administrator};
use super::auth::authenticate;
use super::identity::Identity;
use super::input::{InputError, InputResult, Prompter, RetryPolicy};
use super::store::{RecordStore, StoreError};
use super::terminal::Terminal;
use super::transaction::Transaction;
use std::io;

pub(crate) const STORE_FAULT: &str =
    "An error occurred while accessing the account store. Please try again.";
const INVALID_CREDENTIALS: &str = "Invalid login or PIN code.";
const TOO_MANY_ATTEMPTS: &str = "Too many invalid attempts.";

const CUSTOMER_MENU: [&str; 5] = [
    "Please select an option:",
    "1 - Withdraw",
    "2 - Deposit",
    "3 - Show Balance",
    "4 - Exit",
];

const ADMIN_MENU: [&str; 6] = [
    "Please select an option:",
    "1 - Create New Account",
    "2 - Delete Existing Account",
    "3 - Update Account Information",
    "4 - Search Account",
    "5 - Exit",
];

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The user picked the exit option.
    Exited,
    AuthenticationFailed,
    InputClosed,
    AttemptsExhausted,
    StoreUnavailable,
}

#[derive(Debug)]
pub(crate) enum SessionState {
    AwaitingCredentials,
    CustomerMenu(AccountHolder),
    AdminMenu(Administrator),
    Terminated(Termination),
}

/// One authenticate-then-menu lifecycle.
///
/// The session owns the store handle for its whole lifetime and closes it
/// when dropped, whichever way the session ends.
pub(crate) struct Session<S: RecordStore, T: Terminal> {
    store: S,
    prompter: Prompter<T>,
}

impl<S: RecordStore, T: Terminal> Session<S, T> {
    pub(crate) fn new(store: S, terminal: T, policy: RetryPolicy) -> Self {
        Self {
            store,
            prompter: Prompter::new(terminal, policy),
        }
    }

    /// Drives the session until it terminates. Only terminal I/O failures
    /// escape as errors; store faults are reported to the user.
    pub(crate) fn run(mut self) -> io::Result<Termination> {
        let mut state = SessionState::AwaitingCredentials;
        loop {
            let next = match state {
                SessionState::Terminated(termination) => {
                    info!("session terminated: {termination:?}");
                    return Ok(termination);
                }
                SessionState::AwaitingCredentials => self.log_in(),
                SessionState::CustomerMenu(holder) => self.customer_menu(holder),
                SessionState::AdminMenu(admin) => self.admin_menu(admin),
            };
            state = match next {
                Ok(state) => state,
                Err(err) => self.input_failed(err)?,
            };
        }
    }

    fn input_failed(&mut self, err: InputError) -> io::Result<SessionState> {
        let termination = match err {
            InputError::Closed => Termination::InputClosed,
            InputError::AttemptsExhausted(attempts) => {
                warn!("giving up after {attempts} invalid answers");
                match self.prompter.emit(TOO_MANY_ATTEMPTS) {
                    Err(InputError::Io(err)) => return Err(err),
                    _ => Termination::AttemptsExhausted,
                }
            }
            InputError::Io(err) => return Err(err),
        };
        Ok(SessionState::Terminated(termination))
    }

    fn log_in(&mut self) -> InputResult<SessionState> {
        let credentials = self.prompter.credentials()?;

        let next = match authenticate(&mut self.store, &credentials) {
            Ok(Some(identity)) => {
                info!("{} logged in", identity.login());
                match identity {
                    Identity::Holder(holder) => {
                        debug!("account holder name: {}", holder.holder_name);
                        SessionState::CustomerMenu(holder)
                    }
                    Identity::Admin(admin) => SessionState::AdminMenu(admin),
                }
            }
            Ok(None) => {
                info!("failed login attempt for {}", credentials.login);
                self.prompter.emit(INVALID_CREDENTIALS)?;
                SessionState::Terminated(Termination::AuthenticationFailed)
            }
            Err(err) => {
                error!("authentication lookup failed - {err}");
                self.prompter.emit(STORE_FAULT)?;
                SessionState::Terminated(Termination::StoreUnavailable)
            }
        };
        Ok(next)
    }

    fn customer_menu(&mut self, mut holder: AccountHolder) -> InputResult<SessionState> {
        let outcome = match self.prompter.menu_choice(&CUSTOMER_MENU, 1..=4)? {
            1 => {
                let amount = self.prompter.amount("Enter amount to withdraw: ")?;
                Transaction::withdrawal(amount)
                    .apply(&mut holder, &mut self.store)
                    .map(|receipt| receipt.to_string())
            }
            2 => {
                let amount = self.prompter.amount("Enter amount to deposit: ")?;
                Transaction::deposit(amount)
                    .apply(&mut holder, &mut self.store)
                    .map(|receipt| receipt.to_string())
            }
            3 => holder
                .current_balance(&mut self.store)
                .map(|balance| format!("Your current balance is: {balance}")),
            _ => return Ok(SessionState::Terminated(Termination::Exited)),
        };

        self.report(outcome)?;
        Ok(SessionState::CustomerMenu(holder))
    }

    fn admin_menu(&mut self, admin: Administrator) -> InputResult<SessionState> {
        let outcome = match self.prompter.menu_choice(&ADMIN_MENU, 1..=5)? {
            1 => {
                let account = self.prompter.new_account()?;
                admin
                    .create_account(&account, &mut self.store)
                    .map(|()| "Account created successfully.".to_string())
            }
            2 => {
                let login = self.prompter.login("Enter customer login to delete: ")?;
                admin
                    .delete_account(&login, &mut self.store)
                    .map(|()| "Account deleted successfully.".to_string())
            }
            3 => {
                let login = self.prompter.login("Enter customer login to update: ")?;
                let pin = self.prompter.pin("Enter new PIN code (5 digits): ")?;
                admin
                    .update_account(&login, &pin, &mut self.store)
                    .map(|()| "Account updated successfully.".to_string())
            }
            4 => {
                let login = self.prompter.login("Enter customer login to search: ")?;
                admin
                    .search_account(&login, &mut self.store)
                    .map(|account| account.to_string())
            }
            _ => return Ok(SessionState::Terminated(Termination::Exited)),
        };

        self.report(outcome)?;
        Ok(SessionState::AdminMenu(admin))
    }

    /// Prints the outcome of an operation. Failures never end the session.
    fn report(&mut self, outcome: AccountResult<String>) -> InputResult<()> {
        let message = match outcome {
            Ok(message) => message,
            Err(AccountError::Store(err)) => {
                error!("account operation failed - {err}");
                STORE_FAULT.to_string()
            }
            Err(err) => {
                match &err {
                    AccountError::InsufficientFund {
                        requested,
                        available,
                    } => info!("refused withdrawal of {requested}, {available} available"),
                    AccountError::BalanceLimit { requested } => {
                        warn!("refused deposit of {requested}, balance would overflow")
                    }
                    _ => {}
                }
                err.to_string()
            }
        };
        self.prompter.emit(&message)
    }
}

impl<S: RecordStore, T: Terminal> Drop for Session<S, T> {
    fn drop(&mut self) {
        match self.store.close() {
            Ok(()) => debug!("store connection released"),
            Err(StoreError::Closed) => {}
            Err(err) => warn!("failed to release store connection - {err}"),
        }
    }
}
