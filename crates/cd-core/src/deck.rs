//! The canonical 78-card tarot deck and batched upload planning.
//!
//! Card IDs 0-21 are the Major Arcana in traditional order. IDs 22-77 are the
//! four suits of the Minor Arcana (Wands, Cups, Swords, Pentacles), 14 cards
//! each, ordered Ace through King.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Number of cards in the deck.
pub const DECK_SIZE: usize = 78;

/// Number of Major Arcana cards (IDs 0-21).
pub const MAJOR_ARCANA_COUNT: u8 = 22;

/// Number of cards per Minor Arcana suit.
pub const SUIT_SIZE: u8 = 14;

/// Names of the Major Arcana, indexed by card ID.
pub const MAJOR_ARCANA: [&str; 22] = [
    "The Fool",
    "The Magician",
    "The High Priestess",
    "The Empress",
    "The Emperor",
    "The Hierophant",
    "The Lovers",
    "The Chariot",
    "Strength",
    "The Hermit",
    "Wheel of Fortune",
    "Justice",
    "The Hanged Man",
    "Death",
    "Temperance",
    "The Devil",
    "The Tower",
    "The Star",
    "The Moon",
    "The Sun",
    "Judgement",
    "The World",
];

/// A Minor Arcana suit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Suit {
    /// IDs 22-35.
    Wands,
    /// IDs 36-49.
    Cups,
    /// IDs 50-63.
    Swords,
    /// IDs 64-77.
    Pentacles,
}

impl Suit {
    /// All suits in deck order.
    pub fn all() -> &'static [Self] {
        &[Self::Wands, Self::Cups, Self::Swords, Self::Pentacles]
    }

    fn from_index(i: u8) -> Self {
        match i {
            0 => Self::Wands,
            1 => Self::Cups,
            2 => Self::Swords,
            _ => Self::Pentacles,
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wands => write!(f, "Wands"),
            Self::Cups => write!(f, "Cups"),
            Self::Swords => write!(f, "Swords"),
            Self::Pentacles => write!(f, "Pentacles"),
        }
    }
}

/// Rank of a Minor Arcana card, 1 (Ace) through 14 (King).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rank(u8);

impl Rank {
    /// The numeric rank (1-14).
    pub fn value(self) -> u8 {
        self.0
    }

    /// The display name of the rank.
    pub fn name(self) -> &'static str {
        const NAMES: [&str; 14] = [
            "Ace", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten",
            "Jack", "Knight", "Queen", "King",
        ];
        NAMES[usize::from(self.0 - 1)]
    }
}

/// Which half of the deck a card belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arcana {
    /// A trump card, carrying its number (0-21).
    Major(u8),
    /// A suited card.
    Minor {
        /// The card's suit.
        suit: Suit,
        /// The card's rank within its suit.
        rank: Rank,
    },
}

/// A validated card ID in `0..78`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct CardId(u8);

impl CardId {
    /// Validate a raw card ID.
    pub fn new(id: u8) -> CoreResult<Self> {
        if usize::from(id) < DECK_SIZE {
            Ok(Self(id))
        } else {
            Err(CoreError::UnknownCard(u16::from(id)))
        }
    }

    /// The raw ID.
    pub fn value(self) -> u8 {
        self.0
    }

    /// Index of this card in the library.
    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    /// Whether this card is one of the Major Arcana.
    pub fn is_major(self) -> bool {
        self.0 < MAJOR_ARCANA_COUNT
    }

    /// Major/minor classification with suit and rank.
    pub fn arcana(self) -> Arcana {
        if self.is_major() {
            Arcana::Major(self.0)
        } else {
            let offset = self.0 - MAJOR_ARCANA_COUNT;
            Arcana::Minor {
                suit: Suit::from_index(offset / SUIT_SIZE),
                rank: Rank(offset % SUIT_SIZE + 1),
            }
        }
    }

    /// The suit, for Minor Arcana cards.
    pub fn suit(self) -> Option<Suit> {
        match self.arcana() {
            Arcana::Major(_) => None,
            Arcana::Minor { suit, .. } => Some(suit),
        }
    }

    /// The rank, for Minor Arcana cards.
    pub fn rank(self) -> Option<Rank> {
        match self.arcana() {
            Arcana::Major(_) => None,
            Arcana::Minor { rank, .. } => Some(rank),
        }
    }

    /// The card's full name, e.g. "The Fool" or "Queen of Cups".
    pub fn name(self) -> String {
        match self.arcana() {
            Arcana::Major(n) => MAJOR_ARCANA[usize::from(n)].to_string(),
            Arcana::Minor { suit, rank } => format!("{} of {suit}", rank.name()),
        }
    }
}

impl TryFrom<u8> for CardId {
    type Error = CoreError;

    fn try_from(id: u8) -> CoreResult<Self> {
        Self::new(id)
    }
}

impl From<CardId> for u8 {
    fn from(id: CardId) -> Self {
        id.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.0)
    }
}

/// Name of the card with the given ID.
///
/// Takes a wide integer so callers can pass unchecked input; anything outside
/// `0..78` is [`CoreError::UnknownCard`].
pub fn name_of(card_id: u16) -> CoreResult<String> {
    let id = u8::try_from(card_id).map_err(|_| CoreError::UnknownCard(card_id))?;
    Ok(CardId::new(id)?.name())
}

/// One contiguous chunk of an upload plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchRange {
    /// First card index in the chunk.
    pub start_index: usize,
    /// Number of cards in the chunk.
    pub len: usize,
}

impl BatchRange {
    /// One past the last index in the chunk.
    pub fn end(&self) -> usize {
        self.start_index + self.len
    }
}

/// A partition of `[0, total)` into contiguous chunks of at most `batch_size`.
///
/// The plan is a value: iterating it does not consume it, so it can be
/// restarted any number of times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPlan {
    total: usize,
    batch_size: usize,
}

/// Plan the batches for uploading `total` cards, `batch_size` at a time.
pub fn plan_upload_batches(total: usize, batch_size: usize) -> CoreResult<UploadPlan> {
    if batch_size == 0 {
        return Err(CoreError::InvalidBatch("batch size must be at least 1".to_string()));
    }
    if total > DECK_SIZE {
        return Err(CoreError::InvalidBatch(format!(
            "cannot plan {total} cards, deck has {DECK_SIZE}"
        )));
    }
    Ok(UploadPlan { total, batch_size })
}

impl UploadPlan {
    /// Number of batches in the plan.
    pub fn batch_count(&self) -> usize {
        self.total.div_ceil(self.batch_size)
    }

    /// Iterate over the batches in increasing start order.
    pub fn iter(&self) -> UploadBatches {
        UploadBatches {
            next: 0,
            total: self.total,
            batch_size: self.batch_size,
        }
    }
}

impl IntoIterator for &UploadPlan {
    type Item = BatchRange;
    type IntoIter = UploadBatches;

    fn into_iter(self) -> UploadBatches {
        self.iter()
    }
}

/// Lazy iterator over the chunks of an [`UploadPlan`].
#[derive(Debug, Clone)]
pub struct UploadBatches {
    next: usize,
    total: usize,
    batch_size: usize,
}

impl Iterator for UploadBatches {
    type Item = BatchRange;

    fn next(&mut self) -> Option<BatchRange> {
        if self.next >= self.total {
            return None;
        }
        let start_index = self.next;
        let len = self.batch_size.min(self.total - start_index);
        self.next += len;
        Some(BatchRange { start_index, len })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.total - self.next.min(self.total)).div_ceil(self.batch_size);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for UploadBatches {}

/// The descriptors uploaded to the oracle's card library, one per card.
#[derive(Debug, Clone)]
pub struct CardLibrary {
    descriptors: Vec<String>,
}

impl CardLibrary {
    /// The standard deck. Each descriptor is the card's name.
    pub fn standard() -> Self {
        let descriptors = (0..DECK_SIZE as u8)
            .map(|id| CardId(id).name())
            .collect();
        Self { descriptors }
    }

    /// A library of custom descriptors, indexed by card ID from 0.
    ///
    /// May hold fewer than 78 cards; never more.
    pub fn from_descriptors(descriptors: Vec<String>) -> CoreResult<Self> {
        if descriptors.len() > DECK_SIZE {
            return Err(CoreError::InvalidBatch(format!(
                "{} descriptors, deck has {DECK_SIZE}",
                descriptors.len()
            )));
        }
        Ok(Self { descriptors })
    }

    /// All descriptors, indexed by card ID.
    pub fn descriptors(&self) -> &[String] {
        &self.descriptors
    }

    /// Number of cards in the library.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the library has no cards.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Pair each chunk of `plan_upload_batches(len, batch_size)` with its
    /// descriptors.
    pub fn batches(&self, batch_size: usize) -> CoreResult<impl Iterator<Item = (usize, &[String])>> {
        let plan = plan_upload_batches(self.len(), batch_size)?;
        Ok(plan
            .iter()
            .map(move |b| (b.start_index, &self.descriptors[b.start_index..b.end()])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn major_arcana_order() {
        assert_eq!(name_of(0).unwrap(), "The Fool");
        assert_eq!(name_of(1).unwrap(), "The Magician");
        assert_eq!(name_of(13).unwrap(), "Death");
        assert_eq!(name_of(21).unwrap(), "The World");
    }

    #[test]
    fn suit_boundaries() {
        assert_eq!(name_of(22).unwrap(), "Ace of Wands");
        assert_eq!(name_of(35).unwrap(), "King of Wands");
        assert_eq!(name_of(36).unwrap(), "Ace of Cups");
        assert_eq!(name_of(50).unwrap(), "Ace of Swords");
        assert_eq!(name_of(64).unwrap(), "Ace of Pentacles");
        assert_eq!(name_of(77).unwrap(), "King of Pentacles");
    }

    #[test]
    fn court_cards() {
        assert_eq!(name_of(31).unwrap(), "Ten of Wands");
        assert_eq!(name_of(32).unwrap(), "Jack of Wands");
        assert_eq!(name_of(33).unwrap(), "Knight of Wands");
        assert_eq!(name_of(34).unwrap(), "Queen of Wands");
    }

    #[test]
    fn unknown_cards_rejected() {
        assert!(matches!(name_of(78), Err(CoreError::UnknownCard(78))));
        assert!(matches!(name_of(255), Err(CoreError::UnknownCard(255))));
        assert!(matches!(name_of(1000), Err(CoreError::UnknownCard(1000))));
        assert!(CardId::new(78).is_err());
    }

    #[test]
    fn arcana_classification() {
        let fool = CardId::new(0).unwrap();
        assert!(fool.is_major());
        assert_eq!(fool.suit(), None);

        let c = CardId::new(40).unwrap();
        assert_eq!(c.suit(), Some(Suit::Cups));
        assert_eq!(c.rank().map(Rank::value), Some(5));
        assert_eq!(c.name(), "Five of Cups");
    }

    #[test]
    fn card_id_serde_validates() {
        let ok: CardId = serde_json::from_str("77").unwrap();
        assert_eq!(ok.value(), 77);
        assert!(serde_json::from_str::<CardId>("78").is_err());
    }

    #[test]
    fn names_are_unique() {
        let lib = CardLibrary::standard();
        let mut names = lib.descriptors().to_vec();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), DECK_SIZE);
    }

    #[test]
    fn plan_78_by_10() {
        let plan = plan_upload_batches(78, 10).unwrap();
        let sizes: Vec<usize> = plan.iter().map(|b| b.len).collect();
        assert_eq!(sizes, vec![10, 10, 10, 10, 10, 10, 10, 8]);
        assert_eq!(plan.batch_count(), 8);
        let starts: Vec<usize> = plan.iter().map(|b| b.start_index).collect();
        assert_eq!(starts, vec![0, 10, 20, 30, 40, 50, 60, 70]);
    }

    #[test]
    fn plan_is_restartable() {
        let plan = plan_upload_batches(78, 8).unwrap();
        let first: Vec<BatchRange> = plan.iter().collect();
        let second: Vec<BatchRange> = (&plan).into_iter().collect();
        assert_eq!(first, second);
        assert_eq!(plan.iter().len(), 10);
    }

    #[test]
    fn plan_rejects_bad_input() {
        assert!(matches!(plan_upload_batches(78, 0), Err(CoreError::InvalidBatch(_))));
        assert!(plan_upload_batches(79, 10).is_err());
        assert_eq!(plan_upload_batches(0, 10).unwrap().iter().count(), 0);
    }

    #[test]
    fn library_batches_carry_slices() {
        let lib = CardLibrary::standard();
        let batches: Vec<(usize, &[String])> = lib.batches(10).unwrap().collect();
        assert_eq!(batches.len(), 8);
        assert_eq!(batches[7].0, 70);
        assert_eq!(batches[7].1.len(), 8);
        assert_eq!(batches[0].1[0], "The Fool");
    }

    #[test]
    fn custom_library_size_checked() {
        let lib = CardLibrary::from_descriptors(vec!["a".into(), "b".into()]).unwrap();
        assert_eq!(lib.len(), 2);
        assert_eq!(lib.batches(10).unwrap().count(), 1);
        assert!(CardLibrary::from_descriptors(vec![String::new(); 79]).is_err());
    }

    proptest! {
        #[test]
        fn plan_covers_range_exactly_once(total in 0usize..=78, size in 1usize..100) {
            let plan = plan_upload_batches(total, size).unwrap();
            let mut expected = 0;
            for b in &plan {
                prop_assert_eq!(b.start_index, expected);
                prop_assert!(b.len >= 1 && b.len <= size);
                expected = b.end();
            }
            prop_assert_eq!(expected, total);
        }

        #[test]
        fn name_of_is_total_on_deck(id in 0u16..78) {
            prop_assert_eq!(name_of(id).unwrap(), name_of(id).unwrap());
        }
    }
}
