use super::account::{AccountError, AccountHolder, AccountResult};
use super::identity::ValidationError;
use super::store::{DebitOutcome, RecordStore, StoreError};
use rust_decimal::prelude::*;
use std::fmt;

/// Strictly positive monetary amount. Currency-less.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(Decimal);

impl Amount {
    pub(crate) fn new(value: Decimal) -> Result<Self, ValidationError> {
        if value <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount(value));
        }
        Ok(Self(value))
    }

    pub(crate) fn parse(raw: &str) -> Result<Self, ValidationError> {
        let raw = raw.trim();
        let value =
            Decimal::from_str(raw).map_err(|_| ValidationError::NotANumber(raw.to_string()))?;
        Self::new(value)
    }

    pub fn value(self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransactionType {
    /// Credits the holder's account. There is no upper bound.
    Deposit,

    /// Debits the holder's account. Fails without touching the store if the
    /// balance does not cover the amount, so a withdrawal can never drive the
    /// balance below zero.
    Withdrawal,
}

/// A money movement requested by a logged-in account holder
#[derive(Debug, Clone, Copy)]
pub(crate) struct Transaction {
    transaction_type: TransactionType,
    amount: Amount,
}

/// Confirmation printed after a successful transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Receipt {
    pub(crate) transaction_type: TransactionType,
    pub(crate) amount: Amount,
    pub(crate) balance: Decimal,
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.transaction_type {
            TransactionType::Deposit => "Deposited",
            TransactionType::Withdrawal => "Withdrew",
        };
        write!(f, "{verb} {}. New balance: {}", self.amount, self.balance)
    }
}

impl Transaction {
    pub(crate) fn deposit(amount: Amount) -> Self {
        Self {
            transaction_type: TransactionType::Deposit,
            amount,
        }
    }

    pub(crate) fn withdrawal(amount: Amount) -> Self {
        Self {
            transaction_type: TransactionType::Withdrawal,
            amount,
        }
    }

    /// Writes the transaction through to the store and refreshes the holder's
    /// cached balance with the value the store reports.
    pub(crate) fn apply<S: RecordStore>(
        self,
        holder: &mut AccountHolder,
        store: &mut S,
    ) -> AccountResult<Receipt> {
        use TransactionType::*;

        let login = holder.login.as_str();
        let amount = self.amount.value();

        let balance = match self.transaction_type {
            Deposit => store
                .adjust_customer_balance(login, amount)
                .map_err(|err| match err {
                    StoreError::BalanceOverflow { .. } => {
                        AccountError::BalanceLimit { requested: amount }
                    }
                    other => other.into(),
                })?
                .ok_or_else(|| AccountError::NotFound(holder.login.clone()))?,
            Withdrawal => match store.debit_customer_if_covered(login, amount)? {
                DebitOutcome::Debited { balance } => balance,
                DebitOutcome::Insufficient { available } => {
                    holder.balance = available;
                    return Err(AccountError::InsufficientFund {
                        requested: amount,
                        available,
                    });
                }
                DebitOutcome::NotFound => return Err(AccountError::NotFound(holder.login.clone())),
            },
        };

        debug!(
            "{:?} of {} on account {} settled at {}",
            self.transaction_type, self.amount, holder.login, balance
        );
        holder.balance = balance;
        Ok(Receipt {
            transaction_type: self.transaction_type,
            amount: self.amount,
            balance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::identity::Credentials;
    use crate::features::store::MemoryStore;
    use rust_decimal_macros::dec;
    use test_case::test_case;

    fn holder_with(balance: Decimal) -> (AccountHolder, MemoryStore) {
        let mut store = MemoryStore::new();
        store.insert_customer("john_doe", "12345", "John Doe").unwrap();
        store.adjust_customer_balance("john_doe", balance).unwrap();
        let record = store.find_customer_by_login("john_doe").unwrap().unwrap();
        let credentials = Credentials::parse("john_doe", "12345").unwrap();
        (AccountHolder::new(credentials, record), store)
    }

    fn amount(value: Decimal) -> Amount {
        Amount::new(value).unwrap()
    }

    #[test_case("20", dec!(20) ; "integer")]
    #[test_case(" 12.50 ", dec!(12.50) ; "fraction with whitespace")]
    #[test_case("0.0001", dec!(0.0001) ; "tiny")]
    fn parses_positive_amounts(raw: &str, expected: Decimal) {
        assert_eq!(Amount::parse(raw).unwrap().value(), expected);
    }

    #[test_case("0" ; "zero")]
    #[test_case("-1" ; "negative")]
    #[test_case("abc" ; "not a number")]
    #[test_case("" ; "empty")]
    fn rejects_invalid_amounts(raw: &str) {
        assert!(Amount::parse(raw).is_err());
    }

    #[test]
    fn withdrawal_within_balance() {
        let (mut holder, mut store) = holder_with(dec!(50));
        let receipt = Transaction::withdrawal(amount(dec!(20)))
            .apply(&mut holder, &mut store)
            .unwrap();
        assert_eq!(receipt.to_string(), "Withdrew 20. New balance: 30");
        assert_eq!(holder.balance, dec!(30));
        assert_eq!(store.customers["john_doe"].balance, dec!(30));
    }

    #[test_case(dec!(100) ; "double the balance")]
    #[test_case(dec!(50.01) ; "one cent over")]
    fn withdrawal_over_balance_changes_nothing(requested: Decimal) {
        let (mut holder, mut store) = holder_with(dec!(50));
        let err = Transaction::withdrawal(amount(requested))
            .apply(&mut holder, &mut store)
            .unwrap_err();
        assert!(matches!(
            err,
            AccountError::InsufficientFund { available, .. } if available == dec!(50)
        ));
        assert_eq!(err.to_string(), "Insufficient funds. Please try again.");
        assert_eq!(store.customers["john_doe"].balance, dec!(50));
    }

    #[test]
    fn withdrawal_sees_balance_changed_elsewhere() {
        let (mut holder, mut store) = holder_with(dec!(50));
        store.adjust_customer_balance("john_doe", dec!(-45)).unwrap();
        assert!(Transaction::withdrawal(amount(dec!(20)))
            .apply(&mut holder, &mut store)
            .is_err());
        assert_eq!(holder.balance, dec!(5));
        assert_eq!(store.customers["john_doe"].balance, dec!(5));
    }

    #[test]
    fn deposit_has_no_upper_bound() {
        let (mut holder, mut store) = holder_with(dec!(0));
        let receipt = Transaction::deposit(amount(dec!(1000000000)))
            .apply(&mut holder, &mut store)
            .unwrap();
        assert_eq!(
            receipt.to_string(),
            "Deposited 1000000000. New balance: 1000000000"
        );
    }

    #[test]
    fn deposit_past_the_decimal_range_is_refused() {
        let (mut holder, mut store) = holder_with(dec!(1));
        let err = Transaction::deposit(amount(Decimal::MAX))
            .apply(&mut holder, &mut store)
            .unwrap_err();
        assert!(matches!(err, AccountError::BalanceLimit { requested } if requested == Decimal::MAX));
        assert_eq!(
            err.to_string(),
            "Amount exceeds the maximum balance. Please try again."
        );
        assert_eq!(holder.balance, dec!(1));
        assert_eq!(store.customers["john_doe"].balance, dec!(1));
    }

    #[test]
    fn balance_is_conserved_across_a_sequence() {
        let (mut holder, mut store) = holder_with(dec!(100));
        let steps = [
            Transaction::deposit(amount(dec!(25.5))),
            Transaction::withdrawal(amount(dec!(40))),
            Transaction::withdrawal(amount(dec!(500))),
            Transaction::deposit(amount(dec!(0.25))),
            Transaction::withdrawal(amount(dec!(85.75))),
        ];
        let settled: Vec<_> = steps
            .into_iter()
            .filter_map(|tx| tx.apply(&mut holder, &mut store).ok())
            .collect();

        assert_eq!(settled.len(), 4);
        assert_eq!(store.customers["john_doe"].balance, dec!(0));
        assert_eq!(holder.balance, dec!(0));
    }

    #[test]
    fn deleted_account_is_not_found() {
        let (mut holder, mut store) = holder_with(dec!(10));
        store.delete_customer("john_doe").unwrap();
        for tx in [
            Transaction::deposit(amount(dec!(1))),
            Transaction::withdrawal(amount(dec!(1))),
        ] {
            let err = tx.apply(&mut holder, &mut store).unwrap_err();
            assert_eq!(err.to_string(), "Account not found.");
        }
    }
}
