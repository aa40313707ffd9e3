//! Expansion connector tables.
//!
//! A connector is a dense, 1-indexed list of slots. Ground, power and
//! no-connect positions stay in the table as reserved markers so that
//! position numbers keep matching the board's wiring diagrams.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PlatformError, Result};

/// What sits at one connector position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConnectorSlot {
    /// A package pin usable as a signal.
    Pin(String),
    NoConnect,
    Ground,
    /// A supply rail, e.g. `+3V3`.
    Power(String),
}

impl ConnectorSlot {
    /// Parse the textual marker form: `NC`/`N/C`, `GND`, `+<rail>`, or a pin.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        match s {
            "NC" | "N/C" | "" => ConnectorSlot::NoConnect,
            "GND" => ConnectorSlot::Ground,
            _ if s.starts_with('+') => ConnectorSlot::Power(s[1..].to_string()),
            _ => ConnectorSlot::Pin(s.to_string()),
        }
    }

    pub fn is_reserved(&self) -> bool {
        !matches!(self, ConnectorSlot::Pin(_))
    }
}

impl From<String> for ConnectorSlot {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<ConnectorSlot> for String {
    fn from(slot: ConnectorSlot) -> Self {
        slot.to_string()
    }
}

impl fmt::Display for ConnectorSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectorSlot::Pin(pin) => f.write_str(pin),
            ConnectorSlot::NoConnect => f.write_str("NC"),
            ConnectorSlot::Ground => f.write_str("GND"),
            ConnectorSlot::Power(rail) => write!(f, "+{rail}"),
        }
    }
}

/// Pin table of one expansion connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorTable {
    name: String,
    /// Index 0 is the non-addressable placeholder.
    slots: Vec<ConnectorSlot>,
}

impl ConnectorTable {
    /// Build a table from `entries`, where `entries[0]` is the placeholder for
    /// the non-existent pin 0 and `entries[1..]` are positions 1..=N.
    pub fn new(name: impl Into<String>, entries: Vec<ConnectorSlot>) -> Result<Self> {
        let name = name.into();
        let malformed = |detail: &str| PlatformError::MalformedConnector {
            connector: name.clone(),
            detail: detail.to_string(),
        };

        if name.is_empty() {
            return Err(malformed("connector name is empty"));
        }
        if name.contains(':') {
            return Err(malformed("connector name must not contain ':'"));
        }
        match entries.first() {
            None => return Err(malformed("table is empty")),
            Some(ConnectorSlot::Pin(pin)) => {
                return Err(PlatformError::MalformedConnector {
                    connector: name.clone(),
                    detail: format!("position 0 must be a reserved placeholder, found pin '{pin}'"),
                });
            }
            Some(_) => {}
        }
        if entries.len() < 2 {
            return Err(malformed("table has no addressable positions"));
        }

        Ok(Self {
            name,
            slots: entries,
        })
    }

    /// Build a table from textual markers, see [`ConnectorSlot::parse`].
    pub fn parse(name: impl Into<String>, entries: &[&str]) -> Result<Self> {
        Self::new(name, entries.iter().map(|e| ConnectorSlot::parse(e)).collect())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of addressable positions (N).
    pub fn len(&self) -> usize {
        self.slots.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All entries including the position 0 placeholder.
    pub fn entries(&self) -> &[ConnectorSlot] {
        &self.slots
    }

    /// The slot at a 1-based position.
    pub fn slot_at(&self, position: usize) -> Result<&ConnectorSlot> {
        if position == 0 || position >= self.slots.len() {
            return Err(PlatformError::PositionOutOfRange {
                connector: self.name.clone(),
                position,
                len: self.len(),
            });
        }
        Ok(&self.slots[position])
    }

    /// The package pin at a 1-based position.
    pub fn pin_at(&self, position: usize) -> Result<&str> {
        match self.slot_at(position)? {
            ConnectorSlot::Pin(pin) => Ok(pin),
            reserved => Err(PlatformError::ReservedPosition {
                connector: self.name.clone(),
                position,
                slot: reserved.to_string(),
            }),
        }
    }

    /// Usable (position, pin) pairs in position order.
    pub fn usable_pins(&self) -> impl Iterator<Item = (usize, &str)> {
        self.slots
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(pos, slot)| match slot {
                ConnectorSlot::Pin(pin) => Some((pos, pin.as_str())),
                _ => None,
            })
    }
}

/// A `<connector>:<position>` reference inside a pin binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorRef<'a> {
    pub connector: &'a str,
    pub position: usize,
}

impl<'a> ConnectorRef<'a> {
    /// Split `J39:4` into its parts. Returns `None` for plain pin names.
    ///
    /// A reference with a non-numeric position is returned as `Some(Err(..))`
    /// so the caller can report it.
    pub fn parse(pin: &'a str) -> Option<std::result::Result<Self, String>> {
        let (connector, position) = pin.split_once(':')?;
        Some(
            position
                .parse()
                .map(|position| ConnectorRef {
                    connector,
                    position,
                })
                .map_err(|_| format!("position '{position}' is not a number")),
        )
    }
}
