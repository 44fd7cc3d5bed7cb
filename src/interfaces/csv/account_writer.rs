use crate::domain::account::Account;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct AccountRow<'a> {
    account: u64,
    username: &'a str,
    gov_id: &'a str,
    balance: String,
}

/// Writes account summaries as CSV: `account,username,gov_id,balance`.
pub struct AccountWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> AccountWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_accounts<I>(&mut self, accounts: I) -> Result<()>
    where
        I: IntoIterator<Item = Account>,
    {
        let mut wrote_any = false;
        for account in accounts {
            self.writer.serialize(AccountRow {
                account: account.id.0,
                username: &account.username,
                gov_id: &account.gov_id,
                balance: account.balance.to_string(),
            })?;
            wrote_any = true;
        }
        if !wrote_any {
            self.writer
                .write_record(["account", "username", "gov_id", "balance"])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
