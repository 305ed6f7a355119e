//! Store - an in-memory card container.
//!
//! The store is an explicitly constructed handle, never process-wide state.
//! It drives the card lifecycle around the pure merge: local edits mark fields
//! dirty, incoming remote cards are merged, and acknowledged pushes reset the
//! sync bookkeeping.

use crate::{
    error::Result, Card, CardId, Error, MergeConfig, MergeOutcome, MutableField, Resolver,
    SyncSnapshot, SyncStatus, Timestamp,
};
use std::collections::HashMap;

/// In-memory card store.
#[derive(Debug, Clone, Default)]
pub struct CardStore {
    cards: HashMap<CardId, Card>,
    resolver: Resolver,
}

impl CardStore {
    /// Create an empty store using the default merge configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with a specific merge configuration.
    pub fn with_config(config: MergeConfig) -> Self {
        Self {
            cards: HashMap::new(),
            resolver: Resolver::new(config),
        }
    }

    /// Resolver used by [`apply_remote`](Self::apply_remote).
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Get a card by ID.
    pub fn get(&self, id: &CardId) -> Option<&Card> {
        self.cards.get(id)
    }

    /// Check if a card exists.
    pub fn contains(&self, id: &CardId) -> bool {
        self.cards.contains_key(id)
    }

    /// Number of cards.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// All cards, in no particular order.
    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.cards.values()
    }

    /// Cards with local edits waiting to be pushed.
    pub fn dirty_cards(&self) -> impl Iterator<Item = &Card> {
        self.cards.values().filter(|c| !c.is_clean())
    }

    /// Cards flagged as conflicting by a merge.
    pub fn conflicted_cards(&self) -> impl Iterator<Item = &Card> {
        self.cards.values().filter(|c| c.is_conflict())
    }

    /// Insert a card. Fails if a card with the same ID exists.
    pub fn insert(&mut self, card: Card) -> Result<()> {
        if self.cards.contains_key(&card.id) {
            return Err(Error::CardAlreadyExists(card.id));
        }
        self.cards.insert(card.id.clone(), card);
        Ok(())
    }

    /// Insert or replace a card, returning the previous one.
    pub fn upsert(&mut self, card: Card) -> Option<Card> {
        self.cards.insert(card.id.clone(), card)
    }

    /// Insert a card created on this device that has never been synced.
    pub fn create_local(&mut self, mut card: Card) -> Result<()> {
        card.dirty_fields.clear();
        card.sync_snapshot = None;
        card.sync_status = Some(SyncStatus::Local);
        tracing::debug!(card = %card.id, "created local card");
        self.insert(card)
    }

    /// Apply a local edit to one field.
    ///
    /// A card that has been synced before but carries no snapshot gets one
    /// captured from its pre-edit values, so later merges have a baseline.
    /// The value is type-checked; on error the card is unchanged.
    pub fn edit(
        &mut self,
        id: &CardId,
        field: MutableField,
        value: serde_json::Value,
        timestamp: Timestamp,
    ) -> Result<()> {
        let card = self
            .cards
            .get_mut(id)
            .ok_or_else(|| Error::CardNotFound(id.clone()))?;

        let baseline =
            if card.sync_snapshot.is_none() && card.sync_status != Some(SyncStatus::Local) {
                Some(SyncSnapshot::capture(card))
            } else {
                None
            };

        card.set_field(field, value)?;

        if baseline.is_some() {
            card.sync_snapshot = baseline;
        }
        card.dirty_fields.insert(field);
        card.updated_at = timestamp;
        if !matches!(
            card.sync_status,
            Some(SyncStatus::Local) | Some(SyncStatus::Conflict)
        ) {
            card.sync_status = Some(SyncStatus::Dirty);
        }

        tracing::trace!(card = %id, %field, "local edit");
        Ok(())
    }

    /// Merge an incoming remote card into the store.
    ///
    /// Unknown cards are stored as received.
    pub fn apply_remote(&mut self, remote: Card) -> MergeOutcome {
        let outcome = match self.cards.get(&remote.id) {
            Some(local) => self.resolver.resolve(local, &remote),
            None => {
                tracing::debug!(card = %remote.id, "new card from remote");
                MergeOutcome::passthrough(remote)
            }
        };

        if outcome.is_conflict() {
            tracing::info!(card = %outcome.card.id, conflicts = ?outcome.conflicts, "merge produced conflict");
        }

        self.cards
            .insert(outcome.card.id.clone(), outcome.card.clone());
        outcome
    }

    /// Record that a card's current state has been pushed and confirmed.
    ///
    /// Clears the dirty set, takes a fresh snapshot and marks the card synced.
    pub fn mark_synced(&mut self, id: &CardId) -> Result<()> {
        let card = self
            .cards
            .get_mut(id)
            .ok_or_else(|| Error::CardNotFound(id.clone()))?;

        card.dirty_fields.clear();
        card.sync_snapshot = Some(SyncSnapshot::capture(card));
        card.sync_status = Some(SyncStatus::Synced);

        tracing::debug!(card = %id, "marked synced");
        Ok(())
    }

    /// Remove a card, returning it.
    pub fn remove(&mut self, id: &CardId) -> Option<Card> {
        self.cards.remove(id)
    }
}
