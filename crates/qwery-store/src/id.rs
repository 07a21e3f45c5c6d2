//! Sortable entity identifiers.
//!
//! An identifier is `{prefix}_{time}{random}`: twelve lowercase hex
//! characters encoding `seconds * 4096 + counter` in 48 bits, followed by
//! fourteen base62 characters from the OS random source. Ascending ids
//! minted by one generator sort in creation order; descending ids invert
//! the time part so newer ids sort first.

use std::fmt;
use std::sync::{Mutex, OnceLock};

use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{Result, StoreError};

/// Characters after the prefix separator.
const ID_LENGTH: usize = 26;
/// Hex characters carrying the time part.
const TIME_HEX_LENGTH: usize = 12;
const RANDOM_LENGTH: usize = ID_LENGTH - TIME_HEX_LENGTH;
const COUNTER_SPACE: u64 = 0x1000;
const TIME_MASK: u64 = 0xFFFF_FFFF_FFFF;
pub(crate) const BASE62: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Entity type prefix carried by every identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdPrefix {
    Project,
    Organization,
    User,
    Datasource,
    Notebook,
    Conversation,
    Message,
    Usage,
}

impl IdPrefix {
    pub const ALL: [IdPrefix; 8] = [
        IdPrefix::Project,
        IdPrefix::Organization,
        IdPrefix::User,
        IdPrefix::Datasource,
        IdPrefix::Notebook,
        IdPrefix::Conversation,
        IdPrefix::Message,
        IdPrefix::Usage,
    ];

    /// Short tag written in front of the `_` separator.
    pub fn as_str(self) -> &'static str {
        match self {
            IdPrefix::Project => "prj",
            IdPrefix::Organization => "org",
            IdPrefix::User => "usr",
            IdPrefix::Datasource => "dts",
            IdPrefix::Notebook => "nbk",
            IdPrefix::Conversation => "conv",
            IdPrefix::Message => "msg",
            IdPrefix::Usage => "usg",
        }
    }

    /// Parse a logical entity name (`"project"`) or its short tag (`"prj"`).
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|prefix| prefix.as_str() == value || prefix.entity_name() == value)
    }

    /// Logical entity name, also the storage key prefix.
    pub fn entity_name(self) -> &'static str {
        match self {
            IdPrefix::Project => "project",
            IdPrefix::Organization => "organization",
            IdPrefix::User => "user",
            IdPrefix::Datasource => "datasource",
            IdPrefix::Notebook => "notebook",
            IdPrefix::Conversation => "conversation",
            IdPrefix::Message => "message",
            IdPrefix::Usage => "usage",
        }
    }
}

impl fmt::Display for IdPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default)]
struct Clock {
    last_second: i64,
    last_value: u64,
}

/// Identifier generator with a process-local per-second counter.
#[derive(Debug, Default)]
pub struct IdGenerator {
    clock: Mutex<Clock>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint an identifier stamped with the current time.
    pub fn create(&self, prefix: IdPrefix, descending: bool) -> Result<String> {
        self.create_at(prefix, descending, Utc::now())
    }

    /// Mint an identifier stamped with `at`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Crypto` if the OS random source is unavailable.
    pub fn create_at(
        &self,
        prefix: IdPrefix,
        descending: bool,
        at: DateTime<Utc>,
    ) -> Result<String> {
        let seconds = at.timestamp();
        let base = (seconds.max(0) as u64).wrapping_mul(COUNTER_SPACE);

        // More than 4095 ids in one second spill into the next seconds'
        // range; later seconds continue after the spilled value so ids stay
        // ordered, and `timestamp` then reads a later second than `at`.
        let mut value = {
            let mut clock = self.clock.lock().unwrap_or_else(|e| e.into_inner());
            let next = if seconds >= clock.last_second && clock.last_value > base {
                clock.last_value + 1
            } else {
                base + 1
            };
            clock.last_second = seconds;
            clock.last_value = next;
            next
        };
        if descending {
            value = !value;
        }
        value &= TIME_MASK;

        let time_bytes = &value.to_be_bytes()[2..];
        let mut id = String::with_capacity(prefix.as_str().len() + 1 + ID_LENGTH);
        id.push_str(prefix.as_str());
        id.push('_');
        id.push_str(&hex::encode(time_bytes));
        id.push_str(&random_base62(RANDOM_LENGTH)?);
        Ok(id)
    }
}

fn random_base62(length: usize) -> Result<String> {
    let mut bytes = vec![0u8; length];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| StoreError::Crypto(format!("secure random source unavailable: {}", e)))?;
    Ok(bytes
        .iter()
        .map(|byte| BASE62[(*byte % 62) as usize] as char)
        .collect())
}

/// Process-wide generator shared by every repository.
pub fn generator() -> &'static IdGenerator {
    static GENERATOR: OnceLock<IdGenerator> = OnceLock::new();
    GENERATOR.get_or_init(IdGenerator::new)
}

/// Mint an ascending identifier from the process-wide generator.
pub fn create(prefix: IdPrefix) -> Result<String> {
    generator().create(prefix, false)
}

/// Seconds since the epoch embedded in an ascending identifier.
///
/// Descending identifiers decode to a meaningless value.
pub fn timestamp(id: &str) -> Result<i64> {
    let (_, rest) = id
        .split_once('_')
        .ok_or_else(|| StoreError::InvalidInput(format!("identifier has no prefix: {}", id)))?;
    let hex_part = rest
        .get(..TIME_HEX_LENGTH)
        .ok_or_else(|| StoreError::InvalidInput(format!("identifier too short: {}", id)))?;
    let encoded = u64::from_str_radix(hex_part, 16)
        .map_err(|e| StoreError::InvalidInput(format!("invalid identifier {}: {}", id, e)))?;
    Ok((encoded / COUNTER_SPACE) as i64)
}

/// True when `id` carries the tag of `prefix`.
pub fn is_valid(prefix: IdPrefix, id: &str) -> bool {
    id.strip_prefix(prefix.as_str())
        .is_some_and(|rest| rest.starts_with('_'))
}
