#![allow(dead_code)]

use std::fs::File;
use std::io::Error;
use std::path::Path;

pub const HEADER: [&str; 8] = [
    "type",
    "username",
    "credential",
    "gov_id",
    "amount",
    "target_username",
    "target_credential",
    "target_gov_id",
];

/// Writes a script that registers `accounts` holders with 100 each, then has
/// every holder deposit 1 and withdraw 1 `rounds` times.
pub fn generate_script(path: &Path, accounts: usize, rounds: usize) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(file);

    wtr.write_record(HEADER)?;

    for i in 1..=accounts {
        let user = format!("user{i}");
        let gov_id = format!("GOV-{i}");
        wtr.write_record(["register", user.as_str(), "pw", gov_id.as_str(), "100"])?;
    }

    for _ in 0..rounds {
        for i in 1..=accounts {
            let user = format!("user{i}");
            wtr.write_record(["deposit", user.as_str(), "pw", "", "1"])?;
            wtr.write_record(["withdraw", user.as_str(), "pw", "", "1"])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Writes the given rows under the standard header.
pub fn write_script(path: &Path, rows: &[&[&str]]) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(file);
    wtr.write_record(HEADER)?;
    for row in rows {
        wtr.write_record(*row)?;
    }
    wtr.flush()?;
    Ok(())
}
