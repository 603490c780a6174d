//! Persistent record schemas.
//!
//! Records are stored as a versioned envelope around a record tagged by kind.
//! Decoding is strict: unknown schema versions, unknown or missing fields and
//! records of the wrong kind are all [`CoreError::Decode`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::deck::{CardId, DECK_SIZE};
use crate::error::{CoreError, CoreResult};
use crate::identity::Identity;

/// Schema version written into every stored record.
pub const RECORD_SCHEMA_VERSION: u16 = 1;

/// Version of the classic card designs.
pub const CLASSIC_DECK_VERSION: u8 = 1;

/// Rarity tier of a fortune, from most to least common.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rarity {
    /// Nothing in common between the cards.
    Common,
    /// Exactly one Major Arcana card.
    Uncommon,
    /// Three cards of one suit.
    Rare,
    /// Two Major Arcana cards, or a run of three in one suit.
    Epic,
    /// Three Major Arcana cards.
    Legendary,
}

impl Rarity {
    /// All tiers, most common first.
    pub fn all() -> &'static [Self] {
        &[
            Self::Common,
            Self::Uncommon,
            Self::Rare,
            Self::Epic,
            Self::Legendary,
        ]
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Common => write!(f, "Common"),
            Self::Uncommon => write!(f, "Uncommon"),
            Self::Rare => write!(f, "Rare"),
            Self::Epic => write!(f, "Epic"),
            Self::Legendary => write!(f, "Legendary"),
        }
    }
}

/// The oracle's singleton configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OracleConfig {
    /// Identity allowed to reconfigure the oracle and upload cards.
    pub authority: Identity,
    /// Identity that receives divination fees.
    pub treasury: Identity,
    /// Fee per divination, in base units.
    pub fee: u64,
    /// Sequence number the next fortune will receive.
    pub fortune_counter: u64,
    /// Version of the uploaded card designs.
    pub deck_version: u8,
    /// Set once all 78 library slots hold a descriptor.
    pub deck_complete: bool,
    /// Last time the record changed.
    pub updated_at: DateTime<Utc>,
}

/// The 78-slot card library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CardLibraryRecord {
    /// Version of the card designs.
    pub version: u8,
    /// One slot per card ID; `None` until uploaded.
    pub cards: Vec<Option<String>>,
    /// Last time a card was written.
    pub last_updated: DateTime<Utc>,
}

impl CardLibraryRecord {
    /// An empty library with every slot unset.
    pub fn empty(version: u8, now: DateTime<Utc>) -> Self {
        Self {
            version,
            cards: vec![None; DECK_SIZE],
            last_updated: now,
        }
    }

    /// Number of slots holding a descriptor.
    pub fn populated(&self) -> usize {
        self.cards.iter().filter(|c| c.is_some()).count()
    }

    /// Length of the run of set slots starting at index 0.
    ///
    /// Draws are taken from this prefix so that every drawn card exists.
    pub fn populated_prefix(&self) -> usize {
        self.cards.iter().take_while(|c| c.is_some()).count()
    }

    /// Whether every slot is set.
    pub fn is_complete(&self) -> bool {
        self.cards.len() == DECK_SIZE && self.cards.iter().all(Option::is_some)
    }

    /// Whether every index in `start..end` is set.
    pub fn range_complete(&self, start: usize, end: usize) -> bool {
        self.cards
            .get(start..end)
            .is_some_and(|slots| slots.iter().all(Option::is_some))
    }

    /// The descriptor for a card, if uploaded.
    pub fn descriptor(&self, card: CardId) -> Option<&str> {
        self.cards.get(card.index()).and_then(|c| c.as_deref())
    }
}

/// Per-user divination bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserRecord {
    /// The user this record belongs to.
    pub user: Identity,
    /// Lifetime number of fortunes.
    pub total_fortunes: u64,
    /// When the last fortune was divined.
    pub last_fortune_at: Option<DateTime<Utc>>,
    /// Earliest time the next divination is allowed.
    pub cooldown_until: Option<DateTime<Utc>>,
    /// Fortunes divined in the current 24h window.
    pub daily_count: u8,
    /// Start of the current 24h window.
    pub window_started_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    /// The zero value: a user who has never divined.
    pub fn new(user: Identity) -> Self {
        Self {
            user,
            total_fortunes: 0,
            last_fortune_at: None,
            cooldown_until: None,
            daily_count: 0,
            window_started_at: None,
        }
    }
}

/// A single three-card reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FortuneRecord {
    /// Sequence number, equal to the oracle counter at creation.
    pub fortune_id: u64,
    /// Who divined this fortune.
    pub owner: Identity,
    /// Past, present and future.
    pub cards: [CardId; 3],
    /// Rarity tier of the three cards.
    pub rarity: Rarity,
    /// When the fortune was created.
    pub timestamp: DateTime<Utc>,
    /// Ledger slot at creation.
    pub slot: u64,
    /// Number of library cards the draw was taken from.
    pub deck_size: u8,
    /// Seed the draw was generated from.
    pub entropy_seed: [u8; 32],
}

impl FortuneRecord {
    /// The card in the "past" position.
    pub fn past(&self) -> CardId {
        self.cards[0]
    }

    /// The card in the "present" position.
    pub fn present(&self) -> CardId {
        self.cards[1]
    }

    /// The card in the "future" position.
    pub fn future(&self) -> CardId {
        self.cards[2]
    }

    /// Whether the three cards are pairwise distinct.
    pub fn has_distinct_cards(&self) -> bool {
        let [a, b, c] = self.cards;
        a != b && b != c && a != c
    }
}

/// Any stored record, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Record {
    /// See [`OracleConfig`].
    OracleConfig(OracleConfig),
    /// See [`CardLibraryRecord`].
    CardLibrary(CardLibraryRecord),
    /// See [`UserRecord`].
    UserRecord(UserRecord),
    /// See [`FortuneRecord`].
    FortuneRecord(FortuneRecord),
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Envelope {
    schema: u16,
    record: Record,
}

impl Record {
    /// The kind tag of this record.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::OracleConfig(_) => OracleConfig::KIND,
            Self::CardLibrary(_) => CardLibraryRecord::KIND,
            Self::UserRecord(_) => UserRecord::KIND,
            Self::FortuneRecord(_) => FortuneRecord::KIND,
        }
    }

    /// Serialize into the stored envelope.
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        let envelope = Envelope {
            schema: RECORD_SCHEMA_VERSION,
            record: self.clone(),
        };
        serde_json::to_vec(&envelope).map_err(|e| CoreError::Encode(e.to_string()))
    }

    /// Parse a stored envelope of any kind.
    pub fn decode(bytes: &[u8]) -> CoreResult<Self> {
        let envelope: Envelope = serde_json::from_slice(bytes).map_err(|e| CoreError::Decode {
            expected: "record",
            reason: e.to_string(),
        })?;
        if envelope.schema != RECORD_SCHEMA_VERSION {
            return Err(CoreError::Decode {
                expected: "record",
                reason: format!(
                    "schema version {} not supported (expected {RECORD_SCHEMA_VERSION})",
                    envelope.schema
                ),
            });
        }
        Ok(envelope.record)
    }
}

/// A record type with a fixed kind tag, decodable from stored bytes.
pub trait AccountRecord: Sized {
    /// The kind tag used in the envelope.
    const KIND: &'static str;

    /// Wrap into the tagged enum.
    fn into_record(self) -> Record;

    /// Unwrap from the tagged enum, if it is this kind.
    fn from_record(record: Record) -> Option<Self>;

    /// Encode into the stored envelope.
    fn encode(self) -> CoreResult<Vec<u8>> {
        self.into_record().encode()
    }

    /// Decode stored bytes, requiring this kind.
    fn decode(bytes: &[u8]) -> CoreResult<Self> {
        let record = Record::decode(bytes).map_err(|e| match e {
            CoreError::Decode { reason, .. } => CoreError::Decode {
                expected: Self::KIND,
                reason,
            },
            other => other,
        })?;
        let found = record.kind_name();
        Self::from_record(record).ok_or_else(|| CoreError::Decode {
            expected: Self::KIND,
            reason: format!("found a {found} record"),
        })
    }
}

macro_rules! account_record {
    ($ty:ident, $variant:ident, $kind:literal) => {
        impl AccountRecord for $ty {
            const KIND: &'static str = $kind;

            fn into_record(self) -> Record {
                Record::$variant(self)
            }

            fn from_record(record: Record) -> Option<Self> {
                match record {
                    Record::$variant(r) => Some(r),
                    _ => None,
                }
            }
        }
    };
}

account_record!(OracleConfig, OracleConfig, "oracle_config");
account_record!(CardLibraryRecord, CardLibrary, "card_library");
account_record!(UserRecord, UserRecord, "user_record");
account_record!(FortuneRecord, FortuneRecord, "fortune_record");
