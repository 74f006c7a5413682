use rust_decimal::prelude::*;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum StoreError {
    #[error("Connection is not open.")]
    Closed,

    #[error("account {0} already exists")]
    Duplicate(String),

    #[error("stored balance {value:?} of account {login} is not a decimal")]
    CorruptBalance { login: String, value: String },

    #[error("balance of account {login} cannot grow by {delta}")]
    BalanceOverflow { login: String, delta: Decimal },

    #[error("database error - {0}")]
    Database(#[from] rusqlite::Error),
}

pub(crate) type StoreResult<T> = Result<T, StoreError>;

/// Row of the `customer` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerRecord {
    pub login: String,
    pub pin_code: String,
    pub holder_name: String,
    pub balance: Decimal,
}

/// Result of a conditional debit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DebitOutcome {
    Debited { balance: Decimal },
    Insufficient { available: Decimal },
    NotFound,
}

/// Point lookups and point updates by login against the `customer` and
/// `administrator` tables.
pub(crate) trait RecordStore {
    fn find_customer_by_credentials(
        &mut self,
        login: &str,
        pin_code: &str,
    ) -> StoreResult<Option<CustomerRecord>>;

    fn find_administrator_by_credentials(
        &mut self,
        login: &str,
        pin_code: &str,
    ) -> StoreResult<bool>;

    fn customer_exists(&mut self, login: &str) -> StoreResult<bool>;

    /// Inserts a customer with a zero balance.
    fn insert_customer(
        &mut self,
        login: &str,
        pin_code: &str,
        holder_name: &str,
    ) -> StoreResult<()> {
        self.insert_customer_with_balance(login, pin_code, holder_name, Decimal::ZERO)
    }

    /// Inserts a customer and its opening balance as a single write.
    fn insert_customer_with_balance(
        &mut self,
        login: &str,
        pin_code: &str,
        holder_name: &str,
        balance: Decimal,
    ) -> StoreResult<()>;

    fn insert_administrator(&mut self, login: &str, pin_code: &str) -> StoreResult<()>;

    /// Returns the number of rows removed.
    fn delete_customer(&mut self, login: &str) -> StoreResult<usize>;

    /// Returns the number of rows changed.
    fn update_customer_pin(&mut self, login: &str, pin_code: &str) -> StoreResult<usize>;

    /// Adds `delta` (which may be negative) to the balance and returns the new
    /// balance, or `None` when no such customer exists. A sum that does not fit
    /// a `Decimal` fails with [`StoreError::BalanceOverflow`] and changes
    /// nothing.
    fn adjust_customer_balance(&mut self, login: &str, delta: Decimal)
        -> StoreResult<Option<Decimal>>;

    /// Subtracts `amount` only if the current balance covers it. The check and
    /// the write happen as one step.
    fn debit_customer_if_covered(&mut self, login: &str, amount: Decimal)
        -> StoreResult<DebitOutcome>;

    fn get_customer_balance(&mut self, login: &str) -> StoreResult<Option<Decimal>>;

    fn find_customer_by_login(&mut self, login: &str) -> StoreResult<Option<CustomerRecord>>;

    /// Releases the connection. Every call after this fails with
    /// [`StoreError::Closed`].
    fn close(&mut self) -> StoreResult<()>;
}

impl<S: RecordStore + ?Sized> RecordStore for &mut S {
    fn find_customer_by_credentials(
        &mut self,
        login: &str,
        pin_code: &str,
    ) -> StoreResult<Option<CustomerRecord>> {
        (**self).find_customer_by_credentials(login, pin_code)
    }

    fn find_administrator_by_credentials(
        &mut self,
        login: &str,
        pin_code: &str,
    ) -> StoreResult<bool> {
        (**self).find_administrator_by_credentials(login, pin_code)
    }

    fn customer_exists(&mut self, login: &str) -> StoreResult<bool> {
        (**self).customer_exists(login)
    }

    fn insert_customer_with_balance(
        &mut self,
        login: &str,
        pin_code: &str,
        holder_name: &str,
        balance: Decimal,
    ) -> StoreResult<()> {
        (**self).insert_customer_with_balance(login, pin_code, holder_name, balance)
    }

    fn insert_administrator(&mut self, login: &str, pin_code: &str) -> StoreResult<()> {
        (**self).insert_administrator(login, pin_code)
    }

    fn delete_customer(&mut self, login: &str) -> StoreResult<usize> {
        (**self).delete_customer(login)
    }

    fn update_customer_pin(&mut self, login: &str, pin_code: &str) -> StoreResult<usize> {
        (**self).update_customer_pin(login, pin_code)
    }

    fn adjust_customer_balance(
        &mut self,
        login: &str,
        delta: Decimal,
    ) -> StoreResult<Option<Decimal>> {
        (**self).adjust_customer_balance(login, delta)
    }

    fn debit_customer_if_covered(
        &mut self,
        login: &str,
        amount: Decimal,
    ) -> StoreResult<DebitOutcome> {
        (**self).debit_customer_if_covered(login, amount)
    }

    fn get_customer_balance(&mut self, login: &str) -> StoreResult<Option<Decimal>> {
        (**self).get_customer_balance(login)
    }

    fn find_customer_by_login(&mut self, login: &str) -> StoreResult<Option<CustomerRecord>> {
        (**self).find_customer_by_login(login)
    }

    fn close(&mut self) -> StoreResult<()> {
        (**self).close()
    }
}

/// Keeps both tables in memory. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub(crate) customers: BTreeMap<String, CustomerRecord>,
    pub(crate) administrators: BTreeMap<String, String>,
    closed: bool,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    fn open(&mut self) -> StoreResult<&mut Self> {
        if self.closed {
            return Err(StoreError::Closed);
        }
        Ok(self)
    }

    fn customer_mut(&mut self, login: &str) -> StoreResult<Option<&mut CustomerRecord>> {
        Ok(self.open()?.customers.get_mut(login))
    }
}

impl RecordStore for MemoryStore {
    fn find_customer_by_credentials(
        &mut self,
        login: &str,
        pin_code: &str,
    ) -> StoreResult<Option<CustomerRecord>> {
        Ok(self
            .open()?
            .customers
            .get(login)
            .filter(|customer| customer.pin_code == pin_code)
            .cloned())
    }

    fn find_administrator_by_credentials(
        &mut self,
        login: &str,
        pin_code: &str,
    ) -> StoreResult<bool> {
        Ok(self.open()?.administrators.get(login).map(String::as_str) == Some(pin_code))
    }

    fn customer_exists(&mut self, login: &str) -> StoreResult<bool> {
        Ok(self.open()?.customers.contains_key(login))
    }

    fn insert_customer_with_balance(
        &mut self,
        login: &str,
        pin_code: &str,
        holder_name: &str,
        balance: Decimal,
    ) -> StoreResult<()> {
        let store = self.open()?;
        if store.customers.contains_key(login) {
            return Err(StoreError::Duplicate(login.to_string()));
        }
        store.customers.insert(
            login.to_string(),
            CustomerRecord {
                login: login.to_string(),
                pin_code: pin_code.to_string(),
                holder_name: holder_name.to_string(),
                balance,
            },
        );
        debug!("inserted customer {login}");
        Ok(())
    }

    fn insert_administrator(&mut self, login: &str, pin_code: &str) -> StoreResult<()> {
        let store = self.open()?;
        if store.administrators.contains_key(login) {
            return Err(StoreError::Duplicate(login.to_string()));
        }
        store
            .administrators
            .insert(login.to_string(), pin_code.to_string());
        debug!("inserted administrator {login}");
        Ok(())
    }

    fn delete_customer(&mut self, login: &str) -> StoreResult<usize> {
        Ok(self.open()?.customers.remove(login).map_or(0, |_| 1))
    }

    fn update_customer_pin(&mut self, login: &str, pin_code: &str) -> StoreResult<usize> {
        Ok(match self.customer_mut(login)? {
            Some(customer) => {
                customer.pin_code = pin_code.to_string();
                1
            }
            None => 0,
        })
    }

    fn adjust_customer_balance(
        &mut self,
        login: &str,
        delta: Decimal,
    ) -> StoreResult<Option<Decimal>> {
        let Some(customer) = self.customer_mut(login)? else {
            return Ok(None);
        };
        customer.balance = customer
            .balance
            .checked_add(delta)
            .ok_or_else(|| StoreError::BalanceOverflow {
                login: login.to_string(),
                delta,
            })?;
        debug!("balance of {login} adjusted by {delta}");
        Ok(Some(customer.balance))
    }

    fn debit_customer_if_covered(
        &mut self,
        login: &str,
        amount: Decimal,
    ) -> StoreResult<DebitOutcome> {
        Ok(match self.customer_mut(login)? {
            Some(customer) if customer.balance < amount => DebitOutcome::Insufficient {
                available: customer.balance,
            },
            Some(customer) => {
                customer.balance -= amount;
                debug!("debited {amount} from {login}");
                DebitOutcome::Debited {
                    balance: customer.balance,
                }
            }
            None => DebitOutcome::NotFound,
        })
    }

    fn get_customer_balance(&mut self, login: &str) -> StoreResult<Option<Decimal>> {
        Ok(self.open()?.customers.get(login).map(|customer| customer.balance))
    }

    fn find_customer_by_login(&mut self, login: &str) -> StoreResult<Option<CustomerRecord>> {
        Ok(self.open()?.customers.get(login).cloned())
    }

    fn close(&mut self) -> StoreResult<()> {
        self.open()?.closed = true;
        Ok(())
    }
}
