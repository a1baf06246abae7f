//! Load holiday calendars from `;`-delimited files
//!
//! Expected data lines look like `25/12/2024;quarta-feira;Natal`. Title,
//! header and footer lines are interleaved in published calendars, so only
//! lines starting with `dd/` are treated as data; everything else is skipped.

use super::HolidaySet;
use crate::error::{IrrGridError, IrrGridResult};
use chrono::NaiveDate;
use csv::{ByteRecord, ReaderBuilder};
use log::{debug, info};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Default path to the national holiday calendar
pub const DEFAULT_HOLIDAYS_PATH: &str = "data/holidays.csv";

const DATE_FORMAT: &str = "%d/%m/%Y";

/// One row of a holiday calendar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holiday {
    pub date: NaiveDate,
    pub weekday: String,
    pub name: String,
}

/// Load a holiday calendar file into a [`HolidaySet`]
pub fn load_holidays<P: AsRef<Path>>(path: P) -> IrrGridResult<HolidaySet> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let holidays = load_holidays_from_reader(file)?;
    info!("Loaded {} holidays from {}", holidays.len(), path.display());
    Ok(holidays)
}

/// Load a holiday calendar from any reader (file, string buffer, ...)
pub fn load_holidays_from_reader<R: Read>(reader: R) -> IrrGridResult<HolidaySet> {
    Ok(read_holiday_rows(reader)?.into_iter().map(|h| h.date).collect())
}

/// Parse every data line of a calendar, keeping weekday/name metadata
pub fn read_holiday_rows<R: Read>(reader: R) -> IrrGridResult<Vec<Holiday>> {
    let mut csv_reader = ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let mut rows = Vec::new();
    let mut record = ByteRecord::new();

    while csv_reader.read_byte_record(&mut record)? {
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let first = record.get(0).unwrap_or_default();

        if !is_data_line(first) {
            debug!("Skipping non-date line {}", line);
            continue;
        }

        let raw_date = String::from_utf8_lossy(first).trim().to_string();
        let date = NaiveDate::parse_from_str(&raw_date, DATE_FORMAT).map_err(|_| {
            IrrGridError::HolidayParse {
                line,
                value: raw_date.clone(),
            }
        })?;

        rows.push(Holiday {
            date,
            weekday: field_text(&record, 1),
            name: field_text(&record, 2),
        });
    }

    Ok(rows)
}

/// A data line starts with two digits followed by `/`
fn is_data_line(first_field: &[u8]) -> bool {
    first_field.len() >= 3
        && first_field[0].is_ascii_digit()
        && first_field[1].is_ascii_digit()
        && first_field[2] == b'/'
}

fn field_text(record: &ByteRecord, index: usize) -> String {
    record
        .get(index)
        .map(|bytes| String::from_utf8_lossy(bytes).trim().to_string())
        .unwrap_or_default()
}
