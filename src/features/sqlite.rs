use super::store::{CustomerRecord, DebitOutcome, RecordStore, StoreError, StoreResult};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, TransactionBehavior};
use rust_decimal::prelude::*;
use std::path::Path;

/// Record store backed by SQLite.
///
/// Balances are kept as decimal text, so every read parses them back into a
/// `Decimal` and no arithmetic ever happens in floating point.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Option<Connection>,
}

pub(crate) fn setup_database(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS customer (
            login TEXT PRIMARY KEY NOT NULL,
            pin_code TEXT NOT NULL,
            holder_name TEXT NOT NULL,
            balance TEXT NOT NULL DEFAULT '0'
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS administrator (
            login TEXT PRIMARY KEY NOT NULL,
            pin_code TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

fn parse_balance(login: &str, value: String) -> StoreResult<Decimal> {
    Decimal::from_str(&value).map_err(|_| StoreError::CorruptBalance {
        login: login.to_string(),
        value,
    })
}

fn map_duplicate(login: &str, err: rusqlite::Error) -> StoreError {
    match err.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => StoreError::Duplicate(login.to_string()),
        _ => StoreError::Database(err),
    }
}

impl SqliteStore {
    pub(crate) fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!("opened {} (journal_mode={mode})", path.display());
        setup_database(&conn)?;
        Ok(Self { conn: Some(conn) })
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;
        Ok(Self { conn: Some(conn) })
    }

    fn conn(&mut self) -> StoreResult<&mut Connection> {
        self.conn.as_mut().ok_or(StoreError::Closed)
    }

    fn customer_row(
        conn: &Connection,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> StoreResult<Option<CustomerRecord>> {
        let row = conn
            .query_row(sql, params, |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .optional()?;

        row.map(|(login, pin_code, holder_name, balance)| {
            let balance = parse_balance(&login, balance)?;
            Ok(CustomerRecord {
                login,
                pin_code,
                holder_name,
                balance,
            })
        })
        .transpose()
    }
}

impl RecordStore for SqliteStore {
    fn find_customer_by_credentials(
        &mut self,
        login: &str,
        pin_code: &str,
    ) -> StoreResult<Option<CustomerRecord>> {
        debug!("select customer {login} by credentials");
        let conn = self.conn()?;
        Self::customer_row(
            conn,
            "SELECT login, pin_code, holder_name, balance FROM customer
             WHERE login = ?1 AND pin_code = ?2",
            params![login, pin_code],
        )
    }

    fn find_administrator_by_credentials(
        &mut self,
        login: &str,
        pin_code: &str,
    ) -> StoreResult<bool> {
        debug!("select administrator {login} by credentials");
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(*) FROM administrator WHERE login = ?1 AND pin_code = ?2",
            params![login, pin_code],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn customer_exists(&mut self, login: &str) -> StoreResult<bool> {
        debug!("count customers with login {login}");
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(*) FROM customer WHERE login = ?1",
            params![login],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn insert_customer_with_balance(
        &mut self,
        login: &str,
        pin_code: &str,
        holder_name: &str,
        balance: Decimal,
    ) -> StoreResult<()> {
        debug!("insert customer {login}");
        self.conn()?
            .execute(
                "INSERT INTO customer (login, pin_code, holder_name, balance)
                 VALUES (?1, ?2, ?3, ?4)",
                params![login, pin_code, holder_name, balance.to_string()],
            )
            .map_err(|err| map_duplicate(login, err))?;
        Ok(())
    }

    fn insert_administrator(&mut self, login: &str, pin_code: &str) -> StoreResult<()> {
        debug!("insert administrator {login}");
        self.conn()?
            .execute(
                "INSERT INTO administrator (login, pin_code) VALUES (?1, ?2)",
                params![login, pin_code],
            )
            .map_err(|err| map_duplicate(login, err))?;
        Ok(())
    }

    fn delete_customer(&mut self, login: &str) -> StoreResult<usize> {
        debug!("delete customer {login}");
        Ok(self
            .conn()?
            .execute("DELETE FROM customer WHERE login = ?1", params![login])?)
    }

    fn update_customer_pin(&mut self, login: &str, pin_code: &str) -> StoreResult<usize> {
        debug!("update PIN of customer {login}");
        Ok(self.conn()?.execute(
            "UPDATE customer SET pin_code = ?2 WHERE login = ?1",
            params![login, pin_code],
        )?)
    }

    fn adjust_customer_balance(
        &mut self,
        login: &str,
        delta: Decimal,
    ) -> StoreResult<Option<Decimal>> {
        debug!("adjust balance of customer {login} by {delta}");
        let tx = self
            .conn()?
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current: Option<String> = tx
            .query_row(
                "SELECT balance FROM customer WHERE login = ?1",
                params![login],
                |row| row.get(0),
            )
            .optional()?;
        let Some(current) = current else {
            return Ok(None);
        };

        let balance = parse_balance(login, current)?
            .checked_add(delta)
            .ok_or_else(|| StoreError::BalanceOverflow {
                login: login.to_string(),
                delta,
            })?;
        tx.execute(
            "UPDATE customer SET balance = ?2 WHERE login = ?1",
            params![login, balance.to_string()],
        )?;
        tx.commit()?;
        Ok(Some(balance))
    }

    fn debit_customer_if_covered(
        &mut self,
        login: &str,
        amount: Decimal,
    ) -> StoreResult<DebitOutcome> {
        debug!("debit {amount} from customer {login} if covered");
        // IMMEDIATE takes the write lock up front, so no other connection can
        // debit between the read and the update.
        let tx = self
            .conn()?
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current: Option<String> = tx
            .query_row(
                "SELECT balance FROM customer WHERE login = ?1",
                params![login],
                |row| row.get(0),
            )
            .optional()?;
        let Some(current) = current else {
            return Ok(DebitOutcome::NotFound);
        };

        let available = parse_balance(login, current)?;
        if available < amount {
            return Ok(DebitOutcome::Insufficient { available });
        }

        let balance = available - amount;
        tx.execute(
            "UPDATE customer SET balance = ?2 WHERE login = ?1",
            params![login, balance.to_string()],
        )?;
        tx.commit()?;
        Ok(DebitOutcome::Debited { balance })
    }

    fn get_customer_balance(&mut self, login: &str) -> StoreResult<Option<Decimal>> {
        debug!("select balance of customer {login}");
        let balance: Option<String> = self
            .conn()?
            .query_row(
                "SELECT balance FROM customer WHERE login = ?1",
                params![login],
                |row| row.get(0),
            )
            .optional()?;
        balance.map(|value| parse_balance(login, value)).transpose()
    }

    fn find_customer_by_login(&mut self, login: &str) -> StoreResult<Option<CustomerRecord>> {
        debug!("select customer {login}");
        let conn = self.conn()?;
        Self::customer_row(
            conn,
            "SELECT login, pin_code, holder_name, balance FROM customer WHERE login = ?1",
            params![login],
        )
    }

    fn close(&mut self) -> StoreResult<()> {
        let conn = self.conn.take().ok_or(StoreError::Closed)?;
        conn.close().map_err(|(_, err)| StoreError::Database(err))
    }
}
