//! Module for the storage seam: the atomic unit-of-work capability the engine is written against.

use std::collections::{BTreeMap, HashMap};

use crate::{
    Error,
    domain::{
        Booking, BookingId, Complaint, ComplaintId, DepositRequest, DepositRequestId, Item, ItemId,
        Settings, Transaction, TransactionId, User, UserId,
    },
    error::{conflicting_state, not_found},
};

mod memory;


pub use memory::MemoryStore;

/// A backing store offering atomic multi-row read-modify-write.
///
/// Implementations must run every `transact` call as one indivisible unit with respect to every
/// other call: the reads a unit of work performs and the writes it makes are never interleaved
/// with another unit's, and when `work` returns an error none of its writes survive.
pub trait Store: Send + Sync {
    fn transact<T>(&self, work: impl FnOnce(&mut Tables) -> Result<T, Error>) -> Result<T, Error>;

    fn read<T>(&self, query: impl FnOnce(&Tables) -> T) -> Result<T, Error>;
}

/// The rows a unit of work operates on.
#[derive(Debug, Clone)]
pub struct Tables {
    users: HashMap<UserId, User>,
    items: HashMap<ItemId, Item>,
    bookings: BTreeMap<BookingId, Booking>,
    complaints: BTreeMap<ComplaintId, Complaint>,
    deposit_requests: BTreeMap<DepositRequestId, DepositRequest>,
    settings: HashMap<u32, Settings>,
    /// Append-only
    transactions: Vec<Transaction>,
}

impl Default for Tables {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl Tables {
    pub fn new(settings: Settings) -> Self {
        Self {
            users: HashMap::new(),
            items: HashMap::new(),
            bookings: BTreeMap::new(),
            complaints: BTreeMap::new(),
            deposit_requests: BTreeMap::new(),
            settings: HashMap::from([(Settings::GLOBAL_ID, settings)]),
            transactions: Vec::new(),
        }
    }

    pub fn user(&self, id: UserId) -> Result<&User, Error> {
        self.users.get(&id).ok_or(not_found("user", id))
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn item(&self, id: ItemId) -> Result<&Item, Error> {
        self.items.get(&id).ok_or(not_found("item", id))
    }

    pub fn booking(&self, id: BookingId) -> Result<&Booking, Error> {
        self.bookings.get(&id).ok_or(not_found("booking", id))
    }

    pub fn bookings(&self) -> impl Iterator<Item = &Booking> {
        self.bookings.values()
    }

    pub fn complaint(&self, id: ComplaintId) -> Result<&Complaint, Error> {
        self.complaints.get(&id).ok_or(not_found("complaint", id))
    }

    pub fn complaints(&self) -> impl Iterator<Item = &Complaint> {
        self.complaints.values()
    }

    pub fn deposit_request(&self, id: DepositRequestId) -> Result<&DepositRequest, Error> {
        self.deposit_requests
            .get(&id)
            .ok_or(not_found("deposit request", id))
    }

    /// The settings record, read fresh by every unit of work that needs it.
    pub fn settings(&self) -> Result<&Settings, Error> {
        self.settings
            .get(&Settings::GLOBAL_ID)
            .ok_or(not_found("settings", Settings::GLOBAL_ID))
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Ledger entries documenting the given user's balance, oldest first.
    pub fn transactions_for(&self, user: UserId) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().filter(move |tx| tx.account() == user)
    }

    pub(crate) fn user_mut(&mut self, id: UserId) -> Result<&mut User, Error> {
        self.users.get_mut(&id).ok_or(not_found("user", id))
    }

    pub(crate) fn item_mut(&mut self, id: ItemId) -> Result<&mut Item, Error> {
        self.items.get_mut(&id).ok_or(not_found("item", id))
    }

    pub(crate) fn booking_mut(&mut self, id: BookingId) -> Result<&mut Booking, Error> {
        self.bookings.get_mut(&id).ok_or(not_found("booking", id))
    }

    pub(crate) fn bookings_mut(&mut self) -> impl Iterator<Item = &mut Booking> {
        self.bookings.values_mut()
    }

    pub(crate) fn complaint_mut(&mut self, id: ComplaintId) -> Result<&mut Complaint, Error> {
        self.complaints.get_mut(&id).ok_or(not_found("complaint", id))
    }

    pub(crate) fn complaints_mut(&mut self) -> impl Iterator<Item = &mut Complaint> {
        self.complaints.values_mut()
    }

    pub(crate) fn deposit_request_mut(
        &mut self,
        id: DepositRequestId,
    ) -> Result<&mut DepositRequest, Error> {
        self.deposit_requests
            .get_mut(&id)
            .ok_or(not_found("deposit request", id))
    }

    pub(crate) fn set_settings(&mut self, settings: Settings) {
        self.settings.insert(Settings::GLOBAL_ID, settings);
    }

    pub(crate) fn insert_user(&mut self, user: User) -> Result<(), Error> {
        if let Some(existing) = self.users.get(&user.id()) {
            return Err(conflicting_state(
                "user",
                existing.id(),
                existing.role(),
                "already registered",
            ));
        }
        self.users.insert(user.id(), user);
        Ok(())
    }

    pub(crate) fn insert_item(&mut self, item: Item) -> Result<(), Error> {
        if let Some(existing) = self.items.get(&item.id()) {
            return Err(conflicting_state(
                "item",
                existing.id(),
                existing.status(),
                "already listed",
            ));
        }
        self.items.insert(item.id(), item);
        Ok(())
    }

    pub(crate) fn insert_booking(&mut self, build: impl FnOnce(BookingId) -> Booking) -> BookingId {
        let id = BookingId::new(next_id(self.bookings.len()));
        self.bookings.insert(id, build(id));
        id
    }

    pub(crate) fn insert_complaint(
        &mut self,
        build: impl FnOnce(ComplaintId) -> Complaint,
    ) -> ComplaintId {
        let id = ComplaintId::new(next_id(self.complaints.len()));
        self.complaints.insert(id, build(id));
        id
    }

    pub(crate) fn insert_deposit_request(
        &mut self,
        build: impl FnOnce(DepositRequestId) -> DepositRequest,
    ) -> DepositRequestId {
        let id = DepositRequestId::new(next_id(self.deposit_requests.len()));
        self.deposit_requests.insert(id, build(id));
        id
    }

    pub(crate) fn append_transaction(
        &mut self,
        build: impl FnOnce(TransactionId) -> Transaction,
    ) -> &Transaction {
        let id = TransactionId::new(next_id(self.transactions.len()));
        self.transactions.push(build(id));
        &self.transactions[self.transactions.len() - 1]
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            users: self.users.clone(),
            items: self.items.clone(),
            bookings: self.bookings.clone(),
            complaints: self.complaints.clone(),
            deposit_requests: self.deposit_requests.clone(),
            settings: self.settings.clone(),
            transactions_len: self.transactions.len(),
        }
    }

    pub(crate) fn restore(&mut self, checkpoint: Checkpoint) {
        self.users = checkpoint.users;
        self.items = checkpoint.items;
        self.bookings = checkpoint.bookings;
        self.complaints = checkpoint.complaints;
        self.deposit_requests = checkpoint.deposit_requests;
        self.settings = checkpoint.settings;
        // the ledger is append-only, so rolling it back is a truncation
        self.transactions.truncate(checkpoint.transactions_len);
    }
}

/// Snapshot taken before a unit of work so that a failed unit can be undone.
pub(crate) struct Checkpoint {
    users: HashMap<UserId, User>,
    items: HashMap<ItemId, Item>,
    bookings: BTreeMap<BookingId, Booking>,
    complaints: BTreeMap<ComplaintId, Complaint>,
    deposit_requests: BTreeMap<DepositRequestId, DepositRequest>,
    settings: HashMap<u32, Settings>,
    transactions_len: usize,
}

// Rows are never deleted, so ids are dense and start at 1.
fn next_id(len: usize) -> u32 {
    u32::try_from(len).map_or(u32::MAX, |n| n.saturating_add(1))
}
