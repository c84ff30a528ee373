use std::{
    collections::HashSet,
    sync::{Mutex, MutexGuard, PoisonError},
};

use time::{Month, OffsetDateTime, UtcOffset};

use crate::{
    record::{FinancialRecord, NewRecord, RecordDraft, RecordId, RecordPatch, UserId},
    session::{RecordApi, SessionError},
};

/// Who is using the app, as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// A user is signed in.
    SignedIn(UserId),
    /// Nobody is signed in, so there is no session.
    SignedOut,
}

#[derive(Debug, Default)]
struct SessionState {
    user_id: Option<UserId>,
    /// Bumped by every initialize, so that responses to requests sent before
    /// it can be recognised and dropped.
    generation: u64,
    records: Vec<FinancialRecord>,
    pending: HashSet<RecordId>,
}

/// A cache of one user's records, kept in step with a record store.
///
/// The cache only changes once the store has confirmed a change. Records
/// keep the order they were loaded or added in; updates and deletes never
/// reorder them.
///
/// All methods take `&self`, so a session can be shared (e.g. in an `Arc`)
/// and several requests may be in flight at once. Each mutation only touches
/// the record it targets, and at most one update or delete per record can be
/// in flight at a time.
#[derive(Debug)]
pub struct RecordSession<A> {
    api: A,
    state: Mutex<SessionState>,
}

/// Marks a record as having a mutation in flight until dropped.
struct PendingMutation<'a> {
    state: &'a Mutex<SessionState>,
    id: RecordId,
}

impl Drop for PendingMutation<'_> {
    fn drop(&mut self) {
        lock(self.state).pending.remove(&self.id);
    }
}

/// The cache is only ever replaced by whole values, so a panic while the lock
/// was held cannot leave it half updated.
fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<A: RecordApi> RecordSession<A> {
    /// Create an empty, signed out session that talks to the store through
    /// `api`.
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Load the records of the signed in user, replacing the cache.
    ///
    /// Call this whenever the identity changes, or to refresh the cache. When
    /// the user changes the cache is cleared straight away so another user's
    /// records are never shown. Refreshing the same user keeps the cached
    /// records until the new ones arrive. Responses to any request sent
    /// before this call are discarded. A user without records is not an
    /// error. Signing out leaves an empty session in which mutations fail
    /// with [SessionError::SignedOut].
    ///
    /// # Errors
    ///
    /// Returns the store's error if the records could not be loaded, or
    /// [SessionError::Superseded] if another call to `initialize` started
    /// before this one finished. On a refresh of the same user the cache then
    /// keeps its last loaded records, otherwise it is left empty.
    pub async fn initialize(&self, identity: &Identity) -> Result<(), SessionError> {
        let (generation, user_id) = {
            let mut state = lock(&self.state);
            state.generation += 1;

            match identity {
                Identity::SignedOut => {
                    state.user_id = None;
                    state.records.clear();
                    tracing::debug!("Session signed out");
                    return Ok(());
                }
                Identity::SignedIn(user_id) => {
                    if state.user_id.as_ref() != Some(user_id) {
                        state.records.clear();
                        state.user_id = Some(user_id.clone());
                    }
                    (state.generation, user_id.clone())
                }
            }
        };

        let records = match self.api.list_by_user(&user_id).await {
            Ok(records) => records,
            // Older stores answer 404 when a user has no records yet.
            Err(SessionError::NotFound) => Vec::new(),
            Err(error) => return Err(error),
        };

        let mut state = lock(&self.state);
        if state.generation != generation {
            tracing::warn!("Discarding records loaded for {user_id}: the session changed");
            return Err(SessionError::Superseded);
        }

        tracing::debug!("Loaded {} records for {user_id}", records.len());
        state.records = records;

        Ok(())
    }

    /// Store a new record and append it to the end of the cache.
    ///
    /// The record is stamped with the session's user and the current time.
    /// Nothing is added to the cache until the store has accepted it.
    ///
    /// # Errors
    ///
    /// Returns [SessionError::SignedOut] without a session, the store's error
    /// if the record was rejected, or [SessionError::Superseded] if the
    /// session was initialized again in the meantime. The cache is unchanged
    /// in all of these cases.
    pub async fn add_record(&self, draft: RecordDraft) -> Result<FinancialRecord, SessionError> {
        let (generation, user_id) = self.current_user()?;
        let new_record = NewRecord::new(user_id, OffsetDateTime::now_utc(), draft);

        let record = self.api.create(&new_record).await?;

        let mut state = lock(&self.state);
        if state.generation != generation {
            tracing::warn!("Discarding created record {}: the session changed", record.id);
            return Err(SessionError::Superseded);
        }

        tracing::debug!("Added record {}", record.id);
        state.records.push(record.clone());

        Ok(record)
    }

    /// Change the fields set in `patch` on the record `id`.
    ///
    /// On success the cached record is replaced with the store's copy, in
    /// the same position. If `id` is not in the cache, e.g. because it belongs
    /// to another user, the store's copy is returned and the cache is left as
    /// it is.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - [SessionError::Validation] if `patch` holds an invalid value,
    /// - [SessionError::MutationInFlight] if another update or delete of `id`
    ///   has not finished yet,
    /// - [SessionError::NotFound] if the store has no such record, e.g. it
    ///   was deleted elsewhere,
    /// - or any other error from the store.
    ///
    /// The cached record keeps its last confirmed value in all of these
    /// cases.
    pub async fn update_record(
        &self,
        id: &RecordId,
        patch: RecordPatch,
    ) -> Result<FinancialRecord, SessionError> {
        let patch = patch.validate()?;
        let (generation, _) = self.current_user()?;
        let _pending = self.begin_mutation(id)?;

        let record = self.api.update(id, &patch).await.inspect_err(|error| {
            tracing::debug!("Could not update record {id}: {error}");
        })?;

        let mut state = lock(&self.state);
        if state.generation != generation {
            tracing::warn!("Discarding update of record {id}: the session changed");
            return Err(SessionError::Superseded);
        }

        match state.records.iter_mut().find(|cached| cached.id == *id) {
            Some(cached) => *cached = record.clone(),
            None => tracing::warn!("Updated record {id} is not in the session cache"),
        }

        Ok(record)
    }

    /// Delete the record `id` from the store and the cache.
    ///
    /// Deleting a record the store no longer has is not an error: the stale
    /// cache entry is removed and `Ok(None)` returned, so calling this twice
    /// has the same effect as calling it once.
    ///
    /// # Errors
    ///
    /// Returns [SessionError::SignedOut] without a session,
    /// [SessionError::MutationInFlight] if another update or delete of `id`
    /// has not finished yet, [SessionError::Superseded] if the session was
    /// initialized again in the meantime, or any store error other than
    /// [SessionError::NotFound]. The cache is unchanged in these cases.
    pub async fn delete_record(
        &self,
        id: &RecordId,
    ) -> Result<Option<FinancialRecord>, SessionError> {
        let (generation, _) = self.current_user()?;
        let _pending = self.begin_mutation(id)?;

        let deleted = match self.api.delete(id).await {
            Ok(record) => Some(record),
            Err(SessionError::NotFound) => {
                tracing::debug!("Record {id} was already deleted");
                None
            }
            Err(error) => return Err(error),
        };

        let mut state = lock(&self.state);
        if state.generation != generation {
            tracing::warn!("Discarding deletion of record {id}: the session changed");
            return Err(SessionError::Superseded);
        }

        state.records.retain(|cached| cached.id != *id);

        Ok(deleted)
    }

    /// The sum of the amounts of every cached record.
    pub fn total_amount(&self) -> f64 {
        lock(&self.state)
            .records
            .iter()
            .fold(0.0, |total, record| total + record.amount)
    }

    /// The sum of the amounts of the cached records dated in `month` of
    /// `year`, in UTC.
    pub fn monthly_total(&self, year: i32, month: Month) -> f64 {
        lock(&self.state)
            .records
            .iter()
            .filter(|record| {
                let date = record.date.to_offset(UtcOffset::UTC);
                date.year() == year && date.month() == month
            })
            .fold(0.0, |total, record| total + record.amount)
    }

    /// A snapshot of the cached records in display order.
    pub fn records(&self) -> Vec<FinancialRecord> {
        lock(&self.state).records.clone()
    }

    /// The cached record `id`, if there is one.
    pub fn record(&self, id: &RecordId) -> Option<FinancialRecord> {
        lock(&self.state)
            .records
            .iter()
            .find(|record| record.id == *id)
            .cloned()
    }

    /// The signed in user, or `None` if signed out.
    pub fn user_id(&self) -> Option<UserId> {
        lock(&self.state).user_id.clone()
    }

    /// Whether an update or delete of `id` is waiting for the store.
    ///
    /// Views can use this to disable editing of the record until the change
    /// has been confirmed.
    pub fn has_pending_mutation(&self, id: &RecordId) -> bool {
        lock(&self.state).pending.contains(id)
    }

    /// The API the session talks to.
    pub fn api(&self) -> &A {
        &self.api
    }

    fn current_user(&self) -> Result<(u64, UserId), SessionError> {
        let state = lock(&self.state);

        state
            .user_id
            .clone()
            .map(|user_id| (state.generation, user_id))
            .ok_or(SessionError::SignedOut)
    }

    fn begin_mutation(&self, id: &RecordId) -> Result<PendingMutation<'_>, SessionError> {
        let mut state = lock(&self.state);

        if !state.pending.insert(id.clone()) {
            return Err(SessionError::MutationInFlight(id.clone()));
        }

        Ok(PendingMutation {
            state: &self.state,
            id: id.clone(),
        })
    }
}
