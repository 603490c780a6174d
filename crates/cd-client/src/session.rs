//! Oracle session management.
//!
//! `OracleSession` drives one identity's conversation with the oracle:
//! setting it up, filling the card library and divining fortunes. Every
//! mutation is a request submitted through a [`Ledger`]; the session only
//! moves to a new state after the ledger confirms the commit.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use cd_core::{
    AccountRecord, Address, AddressDeriver, CardId, CardLibrary, CardLibraryRecord, DECK_SIZE,
    FortuneRecord, Identity, Instruction, OracleConfig, Receipt, Rejection, Request, UserRecord,
};
use cd_engine::{UserStats, check_divination, verify_fortune};

use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::error::{OracleError, OracleResult};
use crate::ledger::{Ledger, LedgerError};

/// How far the oracle has been set up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SessionState {
    /// No oracle configuration exists.
    Uninitialized,
    /// Configured, with an empty card library.
    Configured,
    /// Some but not all cards uploaded.
    DeckPartial,
    /// All 78 cards uploaded.
    DeckComplete,
}

impl SessionState {
    fn for_library(populated: usize) -> Self {
        match populated {
            0 => Self::Configured,
            n if n >= DECK_SIZE => Self::DeckComplete,
            _ => Self::DeckPartial,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Configured => write!(f, "configured"),
            Self::DeckPartial => write!(f, "deck partial"),
            Self::DeckComplete => write!(f, "deck complete"),
        }
    }
}

/// Outcome of [`OracleSession::upload_cards`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    /// Batches sent to the oracle.
    pub batches_submitted: usize,
    /// Batches already present and not sent.
    pub batches_skipped: usize,
    /// Cards confirmed in the library afterwards.
    pub populated: usize,
    /// One receipt per submitted batch.
    pub receipts: Vec<Receipt>,
}

impl UploadReport {
    /// Whether the library holds all 78 cards.
    pub fn is_complete(&self) -> bool {
        self.populated == DECK_SIZE
    }
}

/// A client session bound to one identity.
pub struct OracleSession<L: Ledger> {
    ledger: L,
    identity: Identity,
    config: ClientConfig,
    deriver: AddressDeriver,
    library: CardLibrary,
    clock: Box<dyn Clock>,
    state: SessionState,
}

impl<L: Ledger> OracleSession<L> {
    /// Open a session and read the oracle to find the starting state.
    pub fn new(ledger: L, identity: Identity, config: ClientConfig) -> OracleResult<Self> {
        config.validate()?;
        let deriver = AddressDeriver::new(config.program_id);
        let mut session = Self {
            ledger,
            identity,
            config,
            deriver,
            library: CardLibrary::standard(),
            clock: Box::new(SystemClock),
            state: SessionState::Uninitialized,
        };
        session.refresh()?;
        debug!(
            program = %session.deriver.program_id(),
            identity = %session.identity,
            state = %session.state,
            "session opened"
        );
        Ok(session)
    }

    /// Use a different clock for cooldown checks and stats.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Upload a different set of descriptors.
    pub fn with_library(mut self, library: CardLibrary) -> Self {
        self.library = library;
        self
    }

    /// The current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The identity this session signs with.
    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// The address deriver for the configured program.
    pub fn deriver(&self) -> &AddressDeriver {
        &self.deriver
    }

    /// The session configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The underlying ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// The underlying ledger, mutably.
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    /// Re-read the oracle and update the session state.
    pub fn refresh(&mut self) -> OracleResult<SessionState> {
        let config: Option<OracleConfig> = self.read(self.deriver.oracle_config())?;
        self.state = match config {
            None => SessionState::Uninitialized,
            Some(_) => {
                let library: Option<CardLibraryRecord> = self.read(self.deriver.card_library())?;
                SessionState::for_library(library.map_or(0, |l| l.populated()))
            }
        };
        debug!(state = %self.state, "session refreshed");
        Ok(self.state)
    }

    /// Create the oracle configuration with this session as authority.
    pub fn initialize(&mut self, treasury: Identity, fee: u64) -> OracleResult<Receipt> {
        if self.state != SessionState::Uninitialized {
            return Err(OracleError::AlreadyInitialized);
        }
        self.config.rules.validate_fee(fee)?;

        let instruction = Instruction::Initialize {
            oracle_config: self.deriver.oracle_config(),
            card_library: self.deriver.card_library(),
            treasury,
            fee,
        };
        match self.submit(self.identity, instruction) {
            Ok(receipt) => {
                self.state = SessionState::Configured;
                info!(%treasury, fee, slot = receipt.slot, "oracle initialized");
                Ok(receipt)
            }
            Err(LedgerError::Rejected(Rejection::AccountInUse { .. })) => {
                warn!("oracle already initialized");
                self.refresh()?;
                Err(OracleError::AlreadyInitialized)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the treasury and fee. Only the stored authority may do this.
    pub fn reinitialize(&mut self, treasury: Identity, fee: u64) -> OracleResult<Receipt> {
        let current = self.oracle_config()?;
        if current.authority != self.identity {
            return Err(OracleError::Unauthorized(format!(
                "{} is not the oracle authority",
                self.identity
            )));
        }
        self.config.rules.validate_fee(fee)?;

        let instruction = Instruction::Reinitialize {
            oracle_config: self.deriver.oracle_config(),
            treasury,
            fee,
        };
        match self.submit(self.identity, instruction) {
            Ok(receipt) => {
                info!(%treasury, fee, slot = receipt.slot, "oracle reconfigured");
                if self.state == SessionState::Uninitialized {
                    self.refresh()?;
                }
                Ok(receipt)
            }
            Err(LedgerError::Rejected(Rejection::AccountNotFound { .. })) => {
                Err(OracleError::NotInitialized)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Initialize, or reconfigure if the oracle already exists.
    pub fn initialize_or_reinitialize(
        &mut self,
        treasury: Identity,
        fee: u64,
    ) -> OracleResult<Receipt> {
        match self.initialize(treasury, fee) {
            Err(OracleError::AlreadyInitialized) => self.reinitialize(treasury, fee),
            other => other,
        }
    }

    /// Upload every card the library is missing.
    ///
    /// Batches whose slots are all set are skipped. On failure, batches
    /// committed before it stay in place and the session state reflects
    /// them.
    pub fn upload_cards(&mut self) -> OracleResult<UploadReport> {
        self.require_configured("upload cards")?;
        let config = self.oracle_config()?;
        if config.authority != self.identity {
            return Err(OracleError::Unauthorized(format!(
                "{} is not the oracle authority",
                self.identity
            )));
        }
        let mut stored: CardLibraryRecord = self
            .read(self.deriver.card_library())?
            .ok_or(OracleError::NotInitialized)?;

        let batches: Vec<(usize, Vec<String>)> = self
            .library
            .batches(self.config.batch_size)?
            .map(|(start, cards)| (start, cards.to_vec()))
            .collect();
        let mut report = UploadReport {
            batches_submitted: 0,
            batches_skipped: 0,
            populated: stored.populated(),
            receipts: Vec::new(),
        };

        for (start, cards) in batches {
            let end = start + cards.len();
            if stored.range_complete(start, end) {
                debug!(start, end, "batch already uploaded, skipping");
                report.batches_skipped += 1;
                continue;
            }
            let start_index = u8::try_from(start)
                .map_err(|_| OracleError::Config(format!("batch start {start} out of range")))?;
            let instruction = Instruction::UploadCards {
                oracle_config: self.deriver.oracle_config(),
                card_library: self.deriver.card_library(),
                start_index,
                cards: cards.clone(),
            };
            match self.submit(self.identity, instruction) {
                Ok(receipt) => {
                    if let Some(slots) = stored.cards.get_mut(start..end) {
                        for (slot, card) in slots.iter_mut().zip(cards) {
                            slot.get_or_insert(card);
                        }
                    }
                    report.batches_submitted += 1;
                    report.receipts.push(receipt);
                    self.state = SessionState::for_library(stored.populated());
                    debug!(start, end, state = %self.state, "batch committed");
                }
                Err(LedgerError::Rejected(Rejection::CapacityExceeded { reason })) => {
                    let populated = self.confirmed_cards()?;
                    warn!(start, populated, %reason, "card library refused batch");
                    return Err(OracleError::CapacityExceeded {
                        start_index: start,
                        populated,
                        reason,
                    });
                }
                Err(e) => {
                    warn!(start, error = %e, "batch upload failed");
                    return Err(e.into());
                }
            }
        }

        report.populated = self.confirmed_cards()?;
        info!(
            submitted = report.batches_submitted,
            skipped = report.batches_skipped,
            populated = report.populated,
            "card upload finished"
        );
        Ok(report)
    }

    /// Divine a fortune for `user`, who signs the request.
    ///
    /// Reads the fortune counter right before submitting. If another
    /// divination takes that counter first, the counter is re-read and the
    /// request sent again, up to `max_collision_retries` times.
    pub fn divine_fortune(&mut self, user: &Identity) -> OracleResult<FortuneRecord> {
        self.require_configured("divine a fortune")?;
        let library: CardLibraryRecord = self
            .read(self.deriver.card_library())?
            .ok_or(OracleError::NotInitialized)?;
        let populated = library.populated_prefix();
        if populated < 3 {
            return Err(OracleError::DeckNotReady { populated });
        }

        let user_address = self.deriver.user_record(user);
        if let Some(record) = self.read::<UserRecord>(user_address)? {
            check_divination(&record, self.clock.now(), &self.config.rules).inspect_err(|e| {
                warn!(%user, error = %e, "divination refused before submit");
            })?;
        }

        let attempts = self.config.max_collision_retries + 1;
        let mut counter = 0;
        for attempt in 1..=attempts {
            let config = self.oracle_config()?;
            counter = config.fortune_counter;
            let fortune_address = self.deriver.fortune_record(counter);
            debug!(counter, address = %fortune_address, attempt, "divining");

            let instruction = Instruction::DivineFortune {
                oracle_config: self.deriver.oracle_config(),
                card_library: self.deriver.card_library(),
                user_record: user_address,
                fortune_record: fortune_address,
                treasury: config.treasury,
            };
            match self.submit(*user, instruction) {
                Ok(receipt) => return self.committed_fortune(user, counter, &receipt),
                Err(LedgerError::Rejected(Rejection::AccountInUse { .. })) => {
                    warn!(counter, attempt, "fortune address taken, re-reading counter");
                }
                Err(LedgerError::Rejected(Rejection::SeedsMismatch { actual, .. }))
                    if actual == fortune_address =>
                {
                    warn!(counter, attempt, "counter moved since it was read, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(OracleError::AddressCollision {
            fortune_id: counter,
            attempts,
        })
    }

    /// A user's divination history. A user who never divined reads as zero.
    pub fn user_stats(&self, user: &Identity) -> OracleResult<UserStats> {
        let record: Option<UserRecord> = self.read(self.deriver.user_record(user))?;
        Ok(UserStats::of(
            record.as_ref(),
            self.clock.now(),
            &self.config.rules,
        ))
    }

    /// Fetch a fortune by sequence number.
    pub fn fortune(&self, fortune_id: u64) -> OracleResult<FortuneRecord> {
        self.read(self.deriver.fortune_record(fortune_id))?
            .ok_or_else(|| OracleError::NotFound(format!("fortune #{fortune_id}")))
    }

    /// Fetch the oracle configuration.
    pub fn oracle_config(&self) -> OracleResult<OracleConfig> {
        self.read(self.deriver.oracle_config())?
            .ok_or(OracleError::NotInitialized)
    }

    /// Fetch the uploaded descriptor of one card.
    pub fn card_descriptor(&self, card_id: u16) -> OracleResult<String> {
        let card = u8::try_from(card_id)
            .map_err(|_| OracleError::UnknownCard(card_id))
            .and_then(|id| CardId::new(id).map_err(OracleError::from))?;
        let library: CardLibraryRecord = self
            .read(self.deriver.card_library())?
            .ok_or(OracleError::NotInitialized)?;
        library
            .descriptor(card)
            .map(str::to_string)
            .ok_or_else(|| OracleError::NotFound(format!("descriptor for {}", card.name())))
    }

    fn require_configured(&mut self, op: &'static str) -> OracleResult<()> {
        if self.state == SessionState::Uninitialized {
            self.refresh()?;
        }
        if self.state == SessionState::Uninitialized {
            return Err(OracleError::InvalidState {
                op,
                state: self.state,
            });
        }
        Ok(())
    }

    fn committed_fortune(
        &self,
        user: &Identity,
        counter: u64,
        receipt: &Receipt,
    ) -> OracleResult<FortuneRecord> {
        let fortune = self.fortune(counter).map_err(|e| match e {
            OracleError::NotFound(what) => {
                OracleError::Verification(format!("{what} missing after commit"))
            }
            other => other,
        })?;
        if fortune.owner != *user || fortune.fortune_id != counter {
            return Err(OracleError::Verification(format!(
                "fortune #{} belongs to {}, expected #{counter} for {user}",
                fortune.fortune_id, fortune.owner
            )));
        }
        verify_fortune(&fortune)?;
        info!(
            fortune_id = counter,
            %user,
            rarity = %fortune.rarity,
            past = %fortune.past(),
            present = %fortune.present(),
            future = %fortune.future(),
            slot = receipt.slot,
            "fortune divined"
        );
        Ok(fortune)
    }

    fn confirmed_cards(&mut self) -> OracleResult<usize> {
        let library: Option<CardLibraryRecord> = self.read(self.deriver.card_library())?;
        let populated = library.map_or(0, |l| l.populated());
        self.state = SessionState::for_library(populated);
        Ok(populated)
    }

    fn read<T: AccountRecord>(&self, address: Address) -> OracleResult<Option<T>> {
        match self.ledger.fetch(&address)? {
            Some(bytes) => Ok(Some(T::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn submit(&mut self, signer: Identity, instruction: Instruction) -> Result<Receipt, LedgerError> {
        let request = Request::new(instruction);
        debug!(op = request.instruction.op_name(), %signer, "submitting");
        self.ledger.submit(&signer, &request).inspect_err(|e| {
            warn!(op = request.instruction.op_name(), error = %e, "request failed");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::ledger::MemoryLedger;
    use cd_engine::{CooldownPolicy, OracleRules};
    use chrono::{DateTime, Duration, Utc};

    const FEE: u64 = 10_000_000;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn authority() -> Identity {
        Identity::new([2; 32])
    }

    fn treasury() -> Identity {
        Identity::new([3; 32])
    }

    fn session_with(rules: OracleRules) -> (OracleSession<MemoryLedger>, ManualClock) {
        let config = ClientConfig::default().with_rules(rules.clone());
        let clock = ManualClock::new(t0());
        let ledger = MemoryLedger::new(config.program_id)
            .with_clock(clock.clone())
            .with_rules(rules);
        let session = OracleSession::new(ledger, authority(), config)
            .unwrap()
            .with_clock(clock.clone());
        (session, clock)
    }

    fn session() -> (OracleSession<MemoryLedger>, ManualClock) {
        session_with(OracleRules::default())
    }

    fn ready() -> (OracleSession<MemoryLedger>, ManualClock) {
        let (mut s, clock) = session();
        s.initialize(treasury(), FEE).unwrap();
        s.upload_cards().unwrap();
        (s, clock)
    }

    #[test]
    fn new_session_starts_uninitialized() {
        let (s, _) = session();
        assert_eq!(s.state(), SessionState::Uninitialized);
        assert!(matches!(s.oracle_config(), Err(OracleError::NotInitialized)));
    }

    #[test]
    fn initialize_moves_to_configured() {
        let (mut s, _) = session();
        s.initialize(treasury(), FEE).unwrap();
        assert_eq!(s.state(), SessionState::Configured);
        let config = s.oracle_config().unwrap();
        assert_eq!(config.authority, authority());
        assert_eq!(config.fee, FEE);
    }

    #[test]
    fn initialize_twice_fails() {
        let (mut s, _) = session();
        s.initialize(treasury(), FEE).unwrap();
        assert!(matches!(
            s.initialize(treasury(), FEE),
            Err(OracleError::AlreadyInitialized)
        ));
    }

    #[test]
    fn initialize_rejects_bad_fee_locally() {
        let (mut s, _) = session();
        assert!(matches!(
            s.initialize(treasury(), 1),
            Err(OracleError::InvalidFee { fee: 1, .. })
        ));
        assert_eq!(s.ledger().slot(), 0);
    }

    #[test]
    fn reinitialize_without_config() {
        let (mut s, _) = session();
        assert!(matches!(
            s.reinitialize(treasury(), FEE),
            Err(OracleError::NotInitialized)
        ));
    }

    #[test]
    fn reinitialize_replaces_treasury_and_fee() {
        let (mut s, _) = session();
        s.initialize(treasury(), FEE).unwrap();
        let new_treasury = Identity::new([4; 32]);
        s.reinitialize(new_treasury, 20_000_000).unwrap();
        let config = s.oracle_config().unwrap();
        assert_eq!(config.treasury, new_treasury);
        assert_eq!(config.fee, 20_000_000);
        assert_eq!(s.state(), SessionState::Configured);
    }

    #[test]
    fn initialize_or_reinitialize_falls_back() {
        let (mut s, _) = session();
        s.initialize_or_reinitialize(treasury(), FEE).unwrap();
        s.initialize_or_reinitialize(treasury(), 50_000_000).unwrap();
        assert_eq!(s.oracle_config().unwrap().fee, 50_000_000);
    }

    #[test]
    fn upload_completes_deck() {
        let (mut s, _) = session();
        s.initialize(treasury(), FEE).unwrap();
        let report = s.upload_cards().unwrap();
        assert_eq!(report.batches_submitted, 8);
        assert_eq!(report.batches_skipped, 0);
        assert_eq!(report.receipts.len(), 8);
        assert!(report.is_complete());
        assert_eq!(s.state(), SessionState::DeckComplete);
        assert!(s.oracle_config().unwrap().deck_complete);
    }

    #[test]
    fn second_upload_skips_everything() {
        let (mut s, _) = ready();
        let slot = s.ledger().slot();
        let report = s.upload_cards().unwrap();
        assert_eq!(report.batches_submitted, 0);
        assert_eq!(report.batches_skipped, 8);
        assert_eq!(s.ledger().slot(), slot);
    }

    #[test]
    fn partial_library_leaves_deck_partial() {
        let (s, _) = session();
        let mut s = s.with_library(
            CardLibrary::from_descriptors(vec!["a".into(), "b".into(), "c".into()]).unwrap(),
        );
        s.initialize(treasury(), FEE).unwrap();
        let report = s.upload_cards().unwrap();
        assert_eq!(report.populated, 3);
        assert!(!report.is_complete());
        assert_eq!(s.state(), SessionState::DeckPartial);
    }

    #[test]
    fn upload_before_initialize_is_invalid_state() {
        let (mut s, _) = session();
        assert!(matches!(
            s.upload_cards(),
            Err(OracleError::InvalidState {
                state: SessionState::Uninitialized,
                ..
            })
        ));
    }

    #[test]
    fn divine_before_upload_is_not_ready() {
        let (mut s, _) = session();
        s.initialize(treasury(), FEE).unwrap();
        assert!(matches!(
            s.divine_fortune(&Identity::new([5; 32])),
            Err(OracleError::DeckNotReady { populated: 0 })
        ));
    }

    #[test]
    fn divine_before_initialize_is_invalid_state() {
        let (mut s, _) = session();
        assert!(matches!(
            s.divine_fortune(&Identity::new([5; 32])),
            Err(OracleError::InvalidState { .. })
        ));
    }

    #[test]
    fn divine_returns_verified_fortune() {
        let (mut s, _) = ready();
        let user = Identity::new([5; 32]);
        let fortune = s.divine_fortune(&user).unwrap();
        assert_eq!(fortune.fortune_id, 0);
        assert_eq!(fortune.owner, user);
        assert!(fortune.has_distinct_cards());
        assert_eq!(s.fortune(0).unwrap(), fortune);
        assert_eq!(s.ledger().balance(&treasury()), FEE);
    }

    #[test]
    fn cooldown_checked_before_submit() {
        let (mut s, clock) = ready();
        let user = Identity::new([5; 32]);
        s.divine_fortune(&user).unwrap();
        let slot = s.ledger().slot();

        clock.advance(Duration::hours(2));
        let err = s.divine_fortune(&user).unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.retry_after(), Some(t0() + Duration::hours(24)));
        assert_eq!(s.ledger().slot(), slot);

        clock.advance(Duration::hours(22));
        assert_eq!(s.divine_fortune(&user).unwrap().fortune_id, 1);
    }

    #[test]
    fn escalating_rules_allow_quick_second_fortune() {
        let (mut s, clock) = session_with(
            OracleRules::default().with_cooldown(CooldownPolicy::escalating()),
        );
        s.initialize(treasury(), FEE).unwrap();
        s.upload_cards().unwrap();
        let user = Identity::new([5; 32]);
        s.divine_fortune(&user).unwrap();
        s.divine_fortune(&user).unwrap();
        assert!(matches!(
            s.divine_fortune(&user),
            Err(OracleError::CooldownActive { .. })
        ));
        clock.advance(Duration::minutes(30));
        s.divine_fortune(&user).unwrap();
        assert_eq!(s.user_stats(&user).unwrap().daily_count, 3);
    }

    #[test]
    fn stats_track_divinations() {
        let (mut s, clock) = ready();
        let user = Identity::new([5; 32]);
        assert_eq!(s.user_stats(&user).unwrap(), UserStats::default());

        s.divine_fortune(&user).unwrap();
        let stats = s.user_stats(&user).unwrap();
        assert_eq!(stats.total_fortunes, 1);
        assert_eq!(stats.last_fortune, Some(t0()));
        assert_eq!(stats.cooldown_until, Some(t0() + Duration::hours(24)));
        assert_eq!(stats.daily_count, 1);

        clock.advance(Duration::hours(48));
        let stats = s.user_stats(&user).unwrap();
        assert_eq!(stats.cooldown_until, None);
        assert_eq!(stats.daily_count, 0);
        assert_eq!(stats.total_fortunes, 1);
    }

    #[test]
    fn unknown_fortune_not_found() {
        let (s, _) = ready();
        assert!(matches!(s.fortune(12), Err(OracleError::NotFound(_))));
    }

    #[test]
    fn card_descriptors() {
        let (s, _) = ready();
        assert_eq!(s.card_descriptor(0).unwrap(), "The Fool");
        assert_eq!(s.card_descriptor(77).unwrap(), "King of Pentacles");
        assert!(matches!(s.card_descriptor(78), Err(OracleError::UnknownCard(78))));
        assert!(matches!(s.card_descriptor(300), Err(OracleError::UnknownCard(300))));
    }

    #[test]
    fn missing_descriptor_not_found() {
        let (mut s, _) = session();
        s.initialize(treasury(), FEE).unwrap();
        assert!(matches!(s.card_descriptor(5), Err(OracleError::NotFound(_))));
    }

    #[test]
    fn reopened_session_sees_progress() {
        let (s, clock) = ready();
        let ledger = s.ledger;
        let reopened = OracleSession::new(ledger, Identity::new([7; 32]), ClientConfig::default())
            .unwrap()
            .with_clock(clock);
        assert_eq!(reopened.state(), SessionState::DeckComplete);
    }

    #[test]
    fn state_display() {
        assert_eq!(SessionState::DeckPartial.to_string(), "deck partial");
        assert!(SessionState::Configured < SessionState::DeckComplete);
    }

    #[test]
    fn stale_fortune_address_is_retried() {
        let (mut s, _clock) = ready();
        let deriver = *s.deriver();
        s.ledger_mut()
            .fail_next(LedgerError::Rejected(Rejection::SeedsMismatch {
                expected: deriver.fortune_record(1),
                actual: deriver.fortune_record(0),
            }));
        let fortune = s.divine_fortune(&Identity::new([10; 32])).unwrap();
        assert_eq!(fortune.fortune_id, 0);
    }

    #[test]
    fn other_address_mismatch_is_not_a_collision() {
        let (mut s, _clock) = ready();
        let user = Identity::new([10; 32]);
        let deriver = *s.deriver();
        let mismatch = Rejection::SeedsMismatch {
            expected: deriver.user_record(&user),
            actual: deriver.user_record(&Identity::new([11; 32])),
        };
        s.ledger_mut()
            .fail_next(LedgerError::Rejected(mismatch.clone()));
        match s.divine_fortune(&user) {
            Err(OracleError::Rejected(r)) => assert_eq!(r, mismatch),
            other => panic!("expected rejection, got {other:?}"),
        }
        assert_eq!(s.oracle_config().unwrap().fortune_counter, 0);
    }
}
