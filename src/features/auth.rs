use super::account::{AccountHolder, Administrator};
use super::identity::{Credentials, Identity};
use super::store::{RecordStore, StoreResult};

/// Resolves credentials to a role-tagged identity.
///
/// The customer table is consulted first, so a login/PIN pair present in both
/// tables resolves to the account holder. A known login with the wrong PIN is
/// indistinguishable from an unknown login.
pub(crate) fn authenticate<S: RecordStore>(
    store: &mut S,
    credentials: &Credentials,
) -> StoreResult<Option<Identity>> {
    let login = credentials.login.as_str();
    let pin = credentials.pin.as_str();

    if let Some(record) = store.find_customer_by_credentials(login, pin)? {
        debug!("{login} resolved as account holder");
        return Ok(Some(Identity::Holder(AccountHolder::new(
            credentials.clone(),
            record,
        ))));
    }

    if store.find_administrator_by_credentials(login, pin)? {
        debug!("{login} resolved as administrator");
        return Ok(Some(Identity::Admin(Administrator {
            login: credentials.login.clone(),
            pin: credentials.pin.clone(),
        })));
    }

    debug!("no account matches the credentials given for {login}");
    Ok(None)
}
