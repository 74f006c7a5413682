use super::identity::{HolderName, Login, PinCode, ValidationError};
use super::store::{RecordStore, StoreError};
use rust_decimal::prelude::*;
use serde::Deserialize;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum SeedError {
    #[error("Invalid row - {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid record {login:?} - {source}")]
    InvalidRecord {
        login: String,
        source: ValidationError,
    },

    #[error("Negative opening balance {balance} for {login}")]
    NegativeBalance { login: String, balance: Decimal },

    #[error(transparent)]
    Store(#[from] StoreError),
}

type SeedResult<T> = Result<T, SeedError>;

/// Customer row of a seed file: `login,pin_code,holder_name,balance`
#[derive(Deserialize, Debug)]
struct CustomerRow {
    login: String,
    pin_code: String,
    holder_name: String,
    #[serde(with = "rust_decimal::serde::str")]
    balance: Decimal,
}

/// Administrator row of a seed file: `login,pin_code`
#[derive(Deserialize, Debug)]
struct AdministratorRow {
    login: String,
    pin_code: String,
}

fn reader<R: io::Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b',')
        .trim(csv::Trim::All)
        .from_reader(source)
}

fn validate<T>(login: &str, result: Result<T, ValidationError>) -> SeedResult<T> {
    result.map_err(|source| SeedError::InvalidRecord {
        login: login.to_string(),
        source,
    })
}

/// Inserts customers from CSV. Logins already in the store are skipped.
/// Returns how many rows were inserted.
pub(crate) fn seed_customers<R: io::Read, S: RecordStore>(
    source: R,
    store: &mut S,
) -> SeedResult<usize> {
    let mut inserted = 0;
    for result in reader(source).deserialize() {
        let row: CustomerRow = result?;
        let login = validate(&row.login, Login::parse(&row.login))?;
        let pin = validate(&row.login, PinCode::parse(&row.pin_code))?;
        let holder_name = validate(&row.login, HolderName::parse(&row.holder_name))?;
        if row.balance.is_sign_negative() {
            return Err(SeedError::NegativeBalance {
                login: row.login,
                balance: row.balance,
            });
        }

        match store.insert_customer_with_balance(
            login.as_str(),
            pin.as_str(),
            holder_name.as_str(),
            row.balance,
        ) {
            Ok(()) => inserted += 1,
            Err(StoreError::Duplicate(_)) => {
                warn!("customer {login} already exists, skipping seed row")
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(inserted)
}

/// Inserts administrators from CSV. Logins already in the store are skipped.
/// Returns how many rows were inserted.
pub(crate) fn seed_administrators<R: io::Read, S: RecordStore>(
    source: R,
    store: &mut S,
) -> SeedResult<usize> {
    let mut inserted = 0;
    for result in reader(source).deserialize() {
        let row: AdministratorRow = result?;
        let login = validate(&row.login, Login::parse(&row.login))?;
        let pin = validate(&row.login, PinCode::parse(&row.pin_code))?;

        match store.insert_administrator(login.as_str(), pin.as_str()) {
            Ok(()) => inserted += 1,
            Err(StoreError::Duplicate(_)) => {
                warn!("administrator {login} already exists, skipping seed row")
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::sqlite::SqliteStore;
    use crate::features::store::MemoryStore;
    use rust_decimal_macros::dec;

    #[test]
    fn customers_are_loaded_with_exact_balances() {
        let data = "\
login, pin_code, holder_name, balance
john_doe, 12345, John Doe, 100
jane, 22222, Jane Roe, 0.10
";
        let mut store = MemoryStore::new();
        assert_eq!(seed_customers(data.as_bytes(), &mut store).unwrap(), 2);
        assert_eq!(store.customers["john_doe"].balance, dec!(100));
        assert_eq!(store.customers["jane"].balance, dec!(0.10));
        assert_eq!(store.customers["jane"].holder_name, "Jane Roe");
    }

    #[test]
    fn existing_logins_are_skipped() {
        let data = "\
login,pin_code,holder_name,balance
john_doe,12345,John Doe,100
john_doe,54321,Someone Else,5
";
        let mut store = MemoryStore::new();
        assert_eq!(seed_customers(data.as_bytes(), &mut store).unwrap(), 1);
        assert_eq!(store.customers["john_doe"].pin_code, "12345");
        assert_eq!(store.customers["john_doe"].balance, dec!(100));
    }

    #[test]
    fn opening_balance_lands_in_the_same_write_as_the_row() {
        let data = "login,pin_code,holder_name,balance\njane,22222,Jane Roe,7.25\n";
        let mut store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(seed_customers(data.as_bytes(), &mut store).unwrap(), 1);
        assert_eq!(
            store.get_customer_balance("jane").unwrap(),
            Some(dec!(7.25))
        );

        // A rerun finds the row and leaves the opening balance alone.
        assert_eq!(seed_customers(data.as_bytes(), &mut store).unwrap(), 0);
        assert_eq!(
            store.get_customer_balance("jane").unwrap(),
            Some(dec!(7.25))
        );
    }

    #[test]
    fn malformed_pin_is_rejected() {
        let data = "login,pin_code,holder_name,balance\nbob,123,Bob,1\n";
        let err = seed_customers(data.as_bytes(), &mut MemoryStore::new()).unwrap_err();
        assert!(matches!(
            err,
            SeedError::InvalidRecord { ref login, source: ValidationError::MalformedPin } if login == "bob"
        ));
    }

    #[test]
    fn negative_balance_is_rejected() {
        let data = "login,pin_code,holder_name,balance\nbob,12345,Bob,-1\n";
        let err = seed_customers(data.as_bytes(), &mut MemoryStore::new()).unwrap_err();
        assert!(matches!(err, SeedError::NegativeBalance { .. }));
    }

    #[test]
    fn administrators_are_loaded() {
        let data = "login,pin_code\nadmin1,11111\nadmin1,11111\nroot,00000\n";
        let mut store = MemoryStore::new();
        assert_eq!(seed_administrators(data.as_bytes(), &mut store).unwrap(), 2);
        assert!(store
            .find_administrator_by_credentials("root", "00000")
            .unwrap());
    }
}
