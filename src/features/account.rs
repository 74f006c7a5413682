use super::identity::{Credentials, HolderName, Login, PinCode, ValidationError};
use super::store::{CustomerRecord, RecordStore, StoreError};
use rust_decimal::prelude::*;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum AccountError {
    #[error("Insufficient funds. Please try again.")]
    InsufficientFund {
        requested: Decimal,
        available: Decimal,
    },

    #[error("Amount exceeds the maximum balance. Please try again.")]
    BalanceLimit { requested: Decimal },

    #[error("Account with this login already exists.")]
    AlreadyExists(Login),

    #[error("Account not found.")]
    NotFound(Login),

    #[error("store unavailable - {0}")]
    Store(#[from] StoreError),
}

pub(crate) type AccountResult<T> = Result<T, AccountError>;

/// Customer who is logged in.
///
/// `balance` is only the last value seen by this session. Every read goes back
/// to the store and every mutation writes through immediately.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountHolder {
    pub login: Login,
    pub pin: PinCode,
    pub holder_name: String,
    pub balance: Decimal,
}

impl AccountHolder {
    pub(crate) fn new(credentials: Credentials, record: CustomerRecord) -> Self {
        Self {
            login: credentials.login,
            pin: credentials.pin,
            holder_name: record.holder_name,
            balance: record.balance,
        }
    }

    /// Re-reads the balance from the store.
    pub(crate) fn current_balance<S: RecordStore>(
        &mut self,
        store: &mut S,
    ) -> AccountResult<Decimal> {
        let balance = store
            .get_customer_balance(self.login.as_str())?
            .ok_or_else(|| AccountError::NotFound(self.login.clone()))?;
        self.balance = balance;
        Ok(balance)
    }
}

/// Administrator who is logged in. Operates on customer accounts, never on
/// itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Administrator {
    pub login: Login,
    pub pin: PinCode,
}

/// Fields collected for a new customer account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub login: Login,
    pub pin: PinCode,
    pub holder_name: HolderName,
}

impl NewAccount {
    pub(crate) fn parse(
        login: &str,
        pin: &str,
        holder_name: &str,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            login: Login::parse(login)?,
            pin: PinCode::parse(pin)?,
            holder_name: HolderName::parse(holder_name)?,
        })
    }
}

/// Customer account as the administrator sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedAccount {
    pub login: String,
    pub pin_code: String,
    pub balance: Decimal,
}

impl From<CustomerRecord> for ManagedAccount {
    fn from(record: CustomerRecord) -> Self {
        Self {
            login: record.login,
            pin_code: record.pin_code,
            balance: record.balance,
        }
    }
}

// Shows the PIN in plaintext. Known weakness of the search screen.
impl fmt::Display for ManagedAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Login: {}, PIN: {}, Balance: {}",
            self.login, self.pin_code, self.balance
        )
    }
}

impl Administrator {
    pub(crate) fn create_account<S: RecordStore>(
        &self,
        account: &NewAccount,
        store: &mut S,
    ) -> AccountResult<()> {
        let login = account.login.as_str();
        if store.customer_exists(login)? {
            return Err(AccountError::AlreadyExists(account.login.clone()));
        }

        store
            .insert_customer(login, account.pin.as_str(), account.holder_name.as_str())
            .map_err(|err| match err {
                StoreError::Duplicate(_) => AccountError::AlreadyExists(account.login.clone()),
                other => other.into(),
            })?;
        info!("{} created account {}", self.login, account.login);
        Ok(())
    }

    pub(crate) fn delete_account<S: RecordStore>(
        &self,
        login: &Login,
        store: &mut S,
    ) -> AccountResult<()> {
        if store.delete_customer(login.as_str())? == 0 {
            return Err(AccountError::NotFound(login.clone()));
        }
        info!("{} deleted account {login}", self.login);
        Ok(())
    }

    pub(crate) fn update_account<S: RecordStore>(
        &self,
        login: &Login,
        new_pin: &PinCode,
        store: &mut S,
    ) -> AccountResult<()> {
        if store.update_customer_pin(login.as_str(), new_pin.as_str())? == 0 {
            return Err(AccountError::NotFound(login.clone()));
        }
        info!("{} changed the PIN of account {login}", self.login);
        Ok(())
    }

    pub(crate) fn search_account<S: RecordStore>(
        &self,
        login: &Login,
        store: &mut S,
    ) -> AccountResult<ManagedAccount> {
        store
            .find_customer_by_login(login.as_str())?
            .map(ManagedAccount::from)
            .ok_or_else(|| AccountError::NotFound(login.clone()))
    }
}
