//! An in-memory oracle that enforces the same rules as the real one.
//!
//! Every request is applied atomically: all checks run before any record is
//! written, so a rejected request leaves storage untouched. There is no
//! consensus and no signature checking; the `signer` argument is trusted.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use cd_core::record::CLASSIC_DECK_VERSION;
use cd_core::wire::REQUEST_SCHEMA_VERSION;
use cd_core::{
    AccountRecord, Address, AddressDeriver, CardLibraryRecord, DECK_SIZE, FortuneRecord,
    Identity, Instruction, OracleConfig, Receipt, Rejection, Request, UserRecord,
};
use cd_engine::{
    EngineError, OracleRules, check_divination, classify, draw_three, entropy_seed,
    record_divination,
};

use super::{Ledger, LedgerError};
use crate::clock::{Clock, SystemClock};

/// Storage limits of the card library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleLimits {
    /// Most descriptors accepted in one upload.
    pub max_batch: usize,
    /// Longest descriptor accepted, in bytes.
    pub max_descriptor_len: usize,
    /// Total descriptor bytes the library can hold.
    pub library_capacity_bytes: usize,
}

impl Default for OracleLimits {
    fn default() -> Self {
        Self {
            max_batch: 10,
            max_descriptor_len: 2048,
            library_capacity_bytes: DECK_SIZE * 2048,
        }
    }
}

impl OracleLimits {
    /// Set the library's total byte capacity.
    pub fn with_capacity(mut self, bytes: usize) -> Self {
        self.library_capacity_bytes = bytes;
        self
    }
}

type Writes = Vec<(Address, Vec<u8>)>;

fn reject(rejection: Rejection) -> LedgerError {
    LedgerError::Rejected(rejection)
}

fn encode<T: AccountRecord>(address: Address, record: T) -> Result<(Address, Vec<u8>), LedgerError> {
    let bytes = record
        .encode()
        .map_err(|e| LedgerError::Transport(e.to_string()))?;
    Ok((address, bytes))
}

fn engine_rejection(e: EngineError) -> LedgerError {
    match e {
        EngineError::CooldownActive { until, remaining } => reject(Rejection::CooldownActive {
            until,
            remaining_secs: remaining.num_seconds(),
        }),
        EngineError::DailyLimitExceeded(limit) => reject(Rejection::DailyLimitExceeded { limit }),
        EngineError::InvalidFee { fee, min, max } => reject(Rejection::InvalidFee { fee, min, max }),
        EngineError::DeckTooSmall(populated) => reject(Rejection::DeckNotReady { populated }),
        other => LedgerError::Transport(other.to_string()),
    }
}

/// A single-process oracle over a hash map of accounts.
pub struct MemoryLedger {
    deriver: AddressDeriver,
    accounts: HashMap<Address, Vec<u8>>,
    balances: HashMap<Identity, u64>,
    slot: u64,
    rules: OracleRules,
    limits: OracleLimits,
    clock: Box<dyn Clock>,
    faults: VecDeque<LedgerError>,
}

impl MemoryLedger {
    /// An empty oracle for `program_id` with default rules and limits.
    pub fn new(program_id: Identity) -> Self {
        Self {
            deriver: AddressDeriver::new(program_id),
            accounts: HashMap::new(),
            balances: HashMap::new(),
            slot: 0,
            rules: OracleRules::default(),
            limits: OracleLimits::default(),
            clock: Box::new(SystemClock),
            faults: VecDeque::new(),
        }
    }

    /// Use a different clock.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Use different divination rules.
    pub fn with_rules(mut self, rules: OracleRules) -> Self {
        self.rules = rules;
        self
    }

    /// Use different storage limits.
    pub fn with_limits(mut self, limits: OracleLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Fail the next `submit` with `error` instead of applying it.
    ///
    /// Queued failures are used in order, one per submit.
    pub fn fail_next(&mut self, error: LedgerError) {
        self.faults.push_back(error);
    }

    /// Overwrite the raw bytes at an address.
    pub fn put_raw(&mut self, address: Address, bytes: Vec<u8>) {
        self.accounts.insert(address, bytes);
    }

    /// Fees received by an identity.
    pub fn balance(&self, identity: &Identity) -> u64 {
        self.balances.get(identity).copied().unwrap_or(0)
    }

    /// The slot of the last committed request.
    pub fn slot(&self) -> u64 {
        self.slot
    }

    /// Number of accounts holding data.
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    fn load<T: AccountRecord>(&self, address: Address) -> Result<Option<T>, LedgerError> {
        self.accounts
            .get(&address)
            .map(|bytes| T::decode(bytes))
            .transpose()
            .map_err(|_| reject(Rejection::InvalidAccountData { address }))
    }

    fn require<T: AccountRecord>(&self, address: Address) -> Result<T, LedgerError> {
        self.load(address)?
            .ok_or_else(|| reject(Rejection::AccountNotFound { address }))
    }

    fn check_address(expected: Address, actual: Address) -> Result<(), LedgerError> {
        if expected == actual {
            Ok(())
        } else {
            Err(reject(Rejection::SeedsMismatch { expected, actual }))
        }
    }

    fn check_authority(config: &OracleConfig, signer: &Identity) -> Result<(), LedgerError> {
        if config.authority == *signer {
            Ok(())
        } else {
            Err(reject(Rejection::Unauthorized {
                reason: format!("{signer} is not the oracle authority"),
            }))
        }
    }

    fn initialize(
        &self,
        signer: &Identity,
        oracle_config: Address,
        card_library: Address,
        treasury: Identity,
        fee: u64,
        now: DateTime<Utc>,
    ) -> Result<Writes, LedgerError> {
        Self::check_address(self.deriver.oracle_config(), oracle_config)?;
        Self::check_address(self.deriver.card_library(), card_library)?;
        for address in [oracle_config, card_library] {
            if self.accounts.contains_key(&address) {
                return Err(reject(Rejection::AccountInUse { address }));
            }
        }
        self.rules.validate_fee(fee).map_err(engine_rejection)?;

        let config = OracleConfig {
            authority: *signer,
            treasury,
            fee,
            fortune_counter: 0,
            deck_version: CLASSIC_DECK_VERSION,
            deck_complete: false,
            updated_at: now,
        };
        let library = CardLibraryRecord::empty(CLASSIC_DECK_VERSION, now);
        Ok(vec![
            encode(oracle_config, config)?,
            encode(card_library, library)?,
        ])
    }

    fn reinitialize(
        &self,
        signer: &Identity,
        oracle_config: Address,
        treasury: Identity,
        fee: u64,
        now: DateTime<Utc>,
    ) -> Result<Writes, LedgerError> {
        Self::check_address(self.deriver.oracle_config(), oracle_config)?;
        let mut config: OracleConfig = self.require(oracle_config)?;
        Self::check_authority(&config, signer)?;
        self.rules.validate_fee(fee).map_err(engine_rejection)?;

        config.treasury = treasury;
        config.fee = fee;
        config.updated_at = now;
        Ok(vec![encode(oracle_config, config)?])
    }

    fn upload_cards(
        &self,
        signer: &Identity,
        oracle_config: Address,
        card_library: Address,
        start_index: u8,
        cards: &[String],
        now: DateTime<Utc>,
    ) -> Result<Writes, LedgerError> {
        Self::check_address(self.deriver.oracle_config(), oracle_config)?;
        Self::check_address(self.deriver.card_library(), card_library)?;
        let mut config: OracleConfig = self.require(oracle_config)?;
        Self::check_authority(&config, signer)?;
        let mut library: CardLibraryRecord = self.require(card_library)?;

        let capacity = |reason: String| reject(Rejection::CapacityExceeded { reason });
        let start = usize::from(start_index);
        if cards.len() > self.limits.max_batch {
            return Err(capacity(format!(
                "batch of {} cards exceeds limit of {}",
                cards.len(),
                self.limits.max_batch
            )));
        }
        if start + cards.len() > DECK_SIZE {
            return Err(capacity(format!(
                "cards {start}..{} past end of deck",
                start + cards.len()
            )));
        }
        if let Some(long) = cards
            .iter()
            .find(|c| c.len() > self.limits.max_descriptor_len)
        {
            return Err(capacity(format!(
                "descriptor of {} bytes exceeds limit of {}",
                long.len(),
                self.limits.max_descriptor_len
            )));
        }

        let slots = library
            .cards
            .get_mut(start..start + cards.len())
            .ok_or_else(|| {
                reject(Rejection::InvalidAccountData {
                    address: card_library,
                })
            })?;
        let mut written = 0;
        for (slot, card) in slots.iter_mut().zip(cards) {
            if slot.is_none() {
                *slot = Some(card.clone());
                written += 1;
            }
        }
        let used: usize = library.cards.iter().flatten().map(String::len).sum();
        if used > self.limits.library_capacity_bytes {
            return Err(capacity(format!(
                "library would hold {used} bytes, capacity is {}",
                self.limits.library_capacity_bytes
            )));
        }

        if written == 0 {
            debug!(start, len = cards.len(), "batch already uploaded");
            return Ok(Vec::new());
        }
        library.last_updated = now;
        let mut writes = Vec::with_capacity(2);
        if library.is_complete() && !config.deck_complete {
            config.deck_complete = true;
            config.updated_at = now;
            writes.push(encode(oracle_config, config)?);
        }
        writes.push(encode(card_library, library)?);
        Ok(writes)
    }

    #[allow(clippy::too_many_arguments)]
    fn divine_fortune(
        &self,
        signer: &Identity,
        oracle_config: Address,
        card_library: Address,
        user_record: Address,
        fortune_record: Address,
        treasury: Identity,
        now: DateTime<Utc>,
        slot: u64,
    ) -> Result<(Writes, Identity, u64), LedgerError> {
        Self::check_address(self.deriver.oracle_config(), oracle_config)?;
        Self::check_address(self.deriver.card_library(), card_library)?;
        Self::check_address(self.deriver.user_record(signer), user_record)?;

        let mut config: OracleConfig = self.require(oracle_config)?;
        if config.treasury != treasury {
            return Err(reject(Rejection::Unauthorized {
                reason: format!("treasury {treasury} does not match the oracle's"),
            }));
        }
        let library: CardLibraryRecord = self.require(card_library)?;
        let deck_size = library.populated_prefix();
        if deck_size < 3 {
            return Err(reject(Rejection::DeckNotReady {
                populated: deck_size,
            }));
        }

        let counter = config.fortune_counter;
        let expected = self.deriver.fortune_record(counter);
        if self.accounts.contains_key(&fortune_record) || self.accounts.contains_key(&expected) {
            return Err(reject(Rejection::AccountInUse {
                address: fortune_record,
            }));
        }
        Self::check_address(expected, fortune_record)?;

        let mut user = self
            .load::<UserRecord>(user_record)?
            .unwrap_or_else(|| UserRecord::new(*signer));
        check_divination(&user, now, &self.rules).map_err(engine_rejection)?;

        let seed = entropy_seed(signer, now, slot, counter);
        let cards = draw_three(seed, deck_size).map_err(engine_rejection)?;
        let fortune = FortuneRecord {
            fortune_id: counter,
            owner: *signer,
            cards,
            rarity: classify(cards),
            timestamp: now,
            slot,
            deck_size: u8::try_from(deck_size)
                .map_err(|_| LedgerError::Transport(format!("deck size {deck_size}")))?,
            entropy_seed: seed,
        };
        debug!(fortune_id = counter, rarity = %fortune.rarity, "fortune drawn");

        record_divination(&mut user, now, &self.rules).map_err(engine_rejection)?;
        config.fortune_counter += 1;
        config.updated_at = now;
        let fee = config.fee;
        Ok((
            vec![
                encode(oracle_config, config)?,
                encode(user_record, user)?,
                encode(fortune_record, fortune)?,
            ],
            treasury,
            fee,
        ))
    }
}

impl Ledger for MemoryLedger {
    fn submit(&mut self, signer: &Identity, request: &Request) -> Result<Receipt, LedgerError> {
        if let Some(fault) = self.faults.pop_front() {
            return Err(fault);
        }
        if request.schema != REQUEST_SCHEMA_VERSION {
            return Err(reject(Rejection::UnsupportedSchema {
                schema: request.schema,
            }));
        }

        let now = self.clock.now();
        let slot = self.slot + 1;
        let mut payment = None;
        let writes = match &request.instruction {
            Instruction::Initialize {
                oracle_config,
                card_library,
                treasury,
                fee,
            } => self.initialize(signer, *oracle_config, *card_library, *treasury, *fee, now),
            Instruction::Reinitialize {
                oracle_config,
                treasury,
                fee,
            } => self.reinitialize(signer, *oracle_config, *treasury, *fee, now),
            Instruction::UploadCards {
                oracle_config,
                card_library,
                start_index,
                cards,
            } => self.upload_cards(signer, *oracle_config, *card_library, *start_index, cards, now),
            Instruction::DivineFortune {
                oracle_config,
                card_library,
                user_record,
                fortune_record,
                treasury,
            } => self
                .divine_fortune(
                    signer,
                    *oracle_config,
                    *card_library,
                    *user_record,
                    *fortune_record,
                    *treasury,
                    now,
                    slot,
                )
                .map(|(writes, to, fee)| {
                    payment = Some((to, fee));
                    writes
                }),
        };
        let writes = match writes {
            Ok(writes) => writes,
            Err(e) => {
                debug!(op = request.instruction.op_name(), error = %e, "request rejected");
                return Err(e);
            }
        };

        for (address, bytes) in writes {
            self.accounts.insert(address, bytes);
        }
        if let Some((to, fee)) = payment {
            *self.balances.entry(to).or_default() += fee;
        }
        self.slot = slot;
        debug!(op = request.instruction.op_name(), slot, "request committed");
        Ok(Receipt {
            signature: Uuid::new_v4().to_string(),
            slot,
        })
    }

    fn fetch(&self, address: &Address) -> Result<Option<Vec<u8>>, LedgerError> {
        Ok(self.accounts.get(address).cloned())
    }
}
