use std::path::Path;
use std::sync::Mutex;

use rusqlite::{self, params, Connection, OptionalExtension};

use common::ser_utils::to_base64;

use proto::crypto::Address;
use proto::fee::messages::{FeeRateRecord, FeeScope, Rate};

use crate::fee_store::{FeeRateStore, FeeStoreError};

/// Create the fee rate tables, if they do not exist yet.
fn create_tables(conn: &mut Connection) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;

    tx.execute(
        "CREATE TABLE IF NOT EXISTS tb_channel_rate (
             id                 INTEGER PRIMARY KEY AUTOINCREMENT,
             channel_id         TEXT NOT NULL,
             peer_address       TEXT NOT NULL,
             fee_rate           TEXT NOT NULL,
             effective_time     INTEGER NOT NULL
            );",
        params![],
    )?;

    tx.execute(
        "CREATE INDEX IF NOT EXISTS idx_channel_rate
             ON tb_channel_rate(channel_id, peer_address, effective_time);",
        params![],
    )?;

    tx.execute(
        "CREATE TABLE IF NOT EXISTS tb_token_rate (
             id                 INTEGER PRIMARY KEY AUTOINCREMENT,
             token_address      TEXT NOT NULL,
             peer_address       TEXT NOT NULL,
             fee_rate           TEXT NOT NULL,
             effective_time     INTEGER NOT NULL
            );",
        params![],
    )?;

    tx.execute(
        "CREATE INDEX IF NOT EXISTS idx_token_rate
             ON tb_token_rate(token_address, peer_address, effective_time);",
        params![],
    )?;

    tx.execute(
        "CREATE TABLE IF NOT EXISTS tb_account_rate (
             id                 INTEGER PRIMARY KEY AUTOINCREMENT,
             peer_address       TEXT NOT NULL,
             fee_rate           TEXT NOT NULL,
             effective_time     INTEGER NOT NULL
            );",
        params![],
    )?;

    tx.execute(
        "CREATE INDEX IF NOT EXISTS idx_account_rate
             ON tb_account_rate(peer_address, effective_time);",
        params![],
    )?;

    tx.commit()
}

/// A fee rate store kept in a sqlite database.
pub struct SqliteFeeRateStore {
    conn: Mutex<Connection>,
}

impl SqliteFeeRateStore {
    fn from_connection(mut conn: Connection) -> Result<Self, FeeStoreError> {
        create_tables(&mut conn)?;
        Ok(SqliteFeeRateStore {
            conn: Mutex::new(conn),
        })
    }

    /// Open a database file, creating it (and the fee tables) if needed.
    pub fn open(path: &Path) -> Result<Self, FeeStoreError> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, FeeStoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }
}

fn map_rate_row(row: &rusqlite::Row) -> rusqlite::Result<(String, i64)> {
    Ok((row.get(0)?, row.get(1)?))
}

/// Parse a raw (fee_rate, effective_time) row into a record.
fn parse_record(
    scope: &FeeScope,
    peer_address: &Address,
    raw_rate: &str,
    effective_time: i64,
) -> Result<FeeRateRecord, FeeStoreError> {
    let fee_rate = raw_rate
        .parse::<Rate>()
        .map_err(|_| FeeStoreError::CorruptRecord(format!("invalid fee rate {:?}", raw_rate)))?;
    Ok(FeeRateRecord {
        scope: scope.clone(),
        peer_address: *peer_address,
        fee_rate,
        effective_time,
    })
}

impl FeeRateStore for SqliteFeeRateStore {
    fn latest_rate(
        &self,
        scope: &FeeScope,
        peer_address: &Address,
        now: i64,
    ) -> Result<Option<FeeRateRecord>, FeeStoreError> {
        let conn = self.conn.lock().map_err(|_| FeeStoreError::LockPoisoned)?;
        let peer_str = to_base64(peer_address);

        let opt_row = match scope {
            FeeScope::Channel(channel_id) => conn
                .query_row(
                    "SELECT fee_rate, effective_time FROM tb_channel_rate
                     WHERE channel_id = ?1 AND peer_address = ?2 AND effective_time <= ?3
                     ORDER BY effective_time DESC, id DESC LIMIT 1;",
                    params![to_base64(channel_id), peer_str, now],
                    map_rate_row,
                )
                .optional()?,
            FeeScope::Token(token_address) => conn
                .query_row(
                    "SELECT fee_rate, effective_time FROM tb_token_rate
                     WHERE token_address = ?1 AND peer_address = ?2 AND effective_time <= ?3
                     ORDER BY effective_time DESC, id DESC LIMIT 1;",
                    params![to_base64(token_address), peer_str, now],
                    map_rate_row,
                )
                .optional()?,
            FeeScope::Account => conn
                .query_row(
                    "SELECT fee_rate, effective_time FROM tb_account_rate
                     WHERE peer_address = ?1 AND effective_time <= ?2
                     ORDER BY effective_time DESC, id DESC LIMIT 1;",
                    params![peer_str, now],
                    map_rate_row,
                )
                .optional()?,
        };

        match opt_row {
            Some((raw_rate, effective_time)) => Ok(Some(parse_record(
                scope,
                peer_address,
                &raw_rate,
                effective_time,
            )?)),
            None => Ok(None),
        }
    }

    fn record_rate(
        &self,
        scope: &FeeScope,
        peer_address: &Address,
        fee_rate: &Rate,
        effective_time: i64,
    ) -> Result<(), FeeStoreError> {
        let conn = self.conn.lock().map_err(|_| FeeStoreError::LockPoisoned)?;
        let peer_str = to_base64(peer_address);
        let rate_str = fee_rate.to_string();

        match scope {
            FeeScope::Channel(channel_id) => conn.execute(
                "INSERT INTO tb_channel_rate (channel_id, peer_address, fee_rate, effective_time)
                 VALUES (?1, ?2, ?3, ?4);",
                params![to_base64(channel_id), peer_str, rate_str, effective_time],
            )?,
            FeeScope::Token(token_address) => conn.execute(
                "INSERT INTO tb_token_rate (token_address, peer_address, fee_rate, effective_time)
                 VALUES (?1, ?2, ?3, ?4);",
                params![to_base64(token_address), peer_str, rate_str, effective_time],
            )?,
            FeeScope::Account => conn.execute(
                "INSERT INTO tb_account_rate (peer_address, fee_rate, effective_time)
                 VALUES (?1, ?2, ?3);",
                params![peer_str, rate_str, effective_time],
            )?,
        };

        debug!(
            "record_rate: scope={:?} peer={} rate={} effective_time={}",
            scope, peer_address, fee_rate, effective_time
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::fee_store::tests::check_fee_rate_store;

    #[test]
    fn test_sqlite_fee_store_basic() {
        let fee_store = SqliteFeeRateStore::open_in_memory().unwrap();
        check_fee_rate_store(&fee_store);
    }

    #[test]
    fn test_sqlite_fee_store_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("fees.db");
        let peer = Address::from(&[0x11; Address::len()]);

        {
            let fee_store = SqliteFeeRateStore::open(&db_path).unwrap();
            fee_store
                .record_rate(&FeeScope::Account, &peer, &Rate { mul: 3, add: 4 }, 50)
                .unwrap();
        }

        // Rates survive reopening, and creating the tables again is harmless:
        let fee_store = SqliteFeeRateStore::open(&db_path).unwrap();
        assert_eq!(
            fee_store.rate_for(&FeeScope::Account, &peer, 60).unwrap(),
            Rate { mul: 3, add: 4 }
        );
    }

    #[test]
    fn test_sqlite_fee_store_corrupt_rate() {
        let fee_store = SqliteFeeRateStore::open_in_memory().unwrap();
        let peer = Address::from(&[0x22; Address::len()]);
        {
            let conn = fee_store.conn.lock().unwrap();
            conn.execute(
                "INSERT INTO tb_account_rate (peer_address, fee_rate, effective_time)
                 VALUES (?1, ?2, ?3);",
                params![to_base64(&peer), "not a rate", 1i64],
            )
            .unwrap();
        }
        match fee_store.latest_rate(&FeeScope::Account, &peer, 10) {
            Err(FeeStoreError::CorruptRecord(_)) => {}
            _ => unreachable!(),
        }
    }
}
