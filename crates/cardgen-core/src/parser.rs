//! Record-to-card materializer.
//!
//! Turns delimited text with a header row into [`Card`] values. The card
//! variant is chosen by a type tag supplied by the caller, not read from the
//! input.

use std::collections::HashMap;
use std::io::Read;

use csv::StringRecord;
use log::debug;

use crate::card::{Anthem, Artifact, Card, CardType, Creature, Incantation, Spell};
use crate::error::{CardgenError, Result};

/// Columns every input must carry.
pub const REQUIRED_COLUMNS: [&str; 3] = ["Name", "Cost", "Effect"];

pub const COLUMN_NAME: &str = "Name";
pub const COLUMN_COST: &str = "Cost";
pub const COLUMN_EFFECT: &str = "Effect";
pub const COLUMN_ATTACK: &str = "Attack";
pub const COLUMN_DEFENSE: &str = "Defense";
pub const COLUMN_TRAIT: &str = "Trait";

/// Builds [`CardReader`]s.
///
/// Registered as a fresh service, so each resolution yields a new factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardReaderFactory {
    delimiter: u8,
}

impl CardReaderFactory {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Open a reader over `input`, reading and checking its header row.
    ///
    /// # Errors
    ///
    /// Fails with `MissingRequiredColumn` if the header lacks `Name`, `Cost`
    /// or `Effect`.
    pub fn reader<R: Read>(&self, input: R) -> Result<CardReader<R>> {
        CardReader::with_delimiter(input, self.delimiter)
    }
}

impl Default for CardReaderFactory {
    fn default() -> Self {
        Self::new()
    }
}

/// Header lookup. Names are trimmed and matched case-sensitively.
#[derive(Debug, Clone, Default)]
struct Columns {
    index: HashMap<String, usize>,
}

impl Columns {
    fn from_header(header: &StringRecord) -> Self {
        let mut index = HashMap::new();
        for (position, name) in header.iter().enumerate() {
            // Last occurrence wins for duplicated headers.
            index.insert(name.trim().to_string(), position);
        }
        Self { index }
    }

    fn contains(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    /// Trimmed value of `column`; empty when the column or the field is absent.
    fn get<'r>(&self, record: &'r StringRecord, column: &str) -> &'r str {
        self.index
            .get(column)
            .and_then(|&position| record.get(position))
            .map(str::trim)
            .unwrap_or("")
    }
}

/// Streaming materializer over one input.
pub struct CardReader<R> {
    records: csv::Reader<R>,
    columns: Columns,
    /// 1-based number of the last record read; the header is line 1.
    line: u64,
}

impl<R: Read> CardReader<R> {
    /// Comma-delimited reader.
    pub fn new(input: R) -> Result<Self> {
        Self::with_delimiter(input, b',')
    }

    pub fn with_delimiter(input: R, delimiter: u8) -> Result<Self> {
        let mut records = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(input);

        let mut header = StringRecord::new();
        let has_header = records.read_record(&mut header)?;
        let columns = if has_header {
            Columns::from_header(&header)
        } else {
            Columns::default()
        };

        for column in REQUIRED_COLUMNS {
            if !columns.contains(column) {
                return Err(CardgenError::MissingRequiredColumn(column.to_string()));
            }
        }
        debug!("Card input header: {:?}", header);

        Ok(Self {
            records,
            columns,
            line: 1,
        })
    }

    /// Iterate over the remaining rows, materializing each as `card_type`.
    ///
    /// The type tag is matched case-insensitively. Iteration ends after the
    /// first error.
    pub fn cards<'a>(&'a mut self, card_type: &'a str) -> Cards<'a, R> {
        Cards {
            reader: self,
            card_type,
            finished: false,
        }
    }

    /// Materialize every remaining row, stopping at the first failure.
    pub fn read_all(&mut self, card_type: &str) -> Result<Vec<Card>> {
        self.cards(card_type).collect()
    }

    /// Line number of the last record read.
    pub fn line(&self) -> u64 {
        self.line
    }

    fn next_record(&mut self) -> Option<Result<StringRecord>> {
        let mut record = StringRecord::new();
        match self.records.read_record(&mut record) {
            Ok(true) => {
                self.line += 1;
                Some(Ok(record))
            }
            Ok(false) => None,
            Err(err) => Some(Err(CardgenError::Input(format!(
                "Line {}: {}",
                self.line + 1,
                err
            )))),
        }
    }

    fn materialize(&self, record: &StringRecord, card_type: &str) -> Result<Card> {
        let line = self.line;
        let name = self.required(record, COLUMN_NAME, line)?;
        let effect = self.required(record, COLUMN_EFFECT, line)?;
        let cost = self.integer(record, COLUMN_COST, line)?;

        let card_type: CardType =
            card_type
                .parse()
                .map_err(|card_type| CardgenError::UnsupportedCardType { card_type, line })?;

        let card = match card_type {
            CardType::Creature => {
                let attack = self.integer(record, COLUMN_ATTACK, line)?;
                let defense = self.integer(record, COLUMN_DEFENSE, line)?;
                let r#trait = self.columns.get(record, COLUMN_TRAIT);
                Creature::new(name, cost, effect, attack, defense, r#trait).into()
            }
            CardType::Spell => Spell::new(name, cost, effect).into(),
            CardType::Artifact => Artifact::new(name, cost, effect).into(),
            CardType::Incantation => Incantation::new(name, cost, effect).into(),
            CardType::Anthem => Anthem::new(name, cost, effect).into(),
        };
        Ok(card)
    }

    fn required<'r>(&self, record: &'r StringRecord, column: &str, line: u64) -> Result<&'r str> {
        let value = self.columns.get(record, column);
        if value.is_empty() {
            return Err(CardgenError::FieldRequired {
                field: column.to_string(),
                line,
            });
        }
        Ok(value)
    }

    fn integer(&self, record: &StringRecord, column: &str, line: u64) -> Result<i64> {
        let value = self.required(record, column, line)?;
        value.parse().map_err(|_| CardgenError::FieldMalformed {
            field: column.to_string(),
            value: value.to_string(),
            line,
        })
    }
}

/// Iterator returned by [`CardReader::cards`].
pub struct Cards<'a, R> {
    reader: &'a mut CardReader<R>,
    card_type: &'a str,
    finished: bool,
}

impl<R: Read> Iterator for Cards<'_, R> {
    type Item = Result<Card>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = match self.reader.next_record()? {
            Ok(record) => self.reader.materialize(&record, self.card_type),
            Err(err) => Err(err),
        };
        if result.is_err() {
            self.finished = true;
        }
        Some(result)
    }
}
