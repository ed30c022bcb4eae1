//! Verse session: the page-lifetime context tying the stores to the engine
//!
//! A [`VerseSession`] is created once the collection has loaded and then
//! processes user actions strictly in arrival order. Presentation layers
//! receive results through the [`Presenter`] callbacks.
use crate::engine::{self, Selection};
use crate::error::{SessionError, StorageError, VerseError};
use crate::hash;
use crate::loader::{LoadOrigin, VerseLoader};
use crate::order::{OrderStore, ShuffleOrder};
use crate::settings::{PolicyMode, Settings, SettingsStore, ThemeName};
use crate::storage::KeyValueStore;
use crate::verse::{VerseCollection, VerseRecord};
use rand::Rng;
use time::OffsetDateTime;

/// Callbacks into the presentation layer
pub trait Presenter {
    /// A verse should be displayed
    fn verse_selected(&mut self, index: usize, verse: &VerseRecord);

    /// The theme was restored at start-up or toggled
    fn theme_changed(&mut self, _theme: ThemeName) {}
}

/// User interactions the session reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    /// Show the following verse, ignoring the policy
    Next,
    /// Persist a new policy and re-evaluate it
    ChangeMode(PolicyMode),
    /// Flip and persist the theme
    ToggleTheme,
}

/// Session context holding the collection, the current position and the stores
pub struct VerseSession<S, R> {
    verses: VerseCollection,
    current: usize,
    settings: SettingsStore<S>,
    orders: OrderStore<S>,
    rng: R,
}

impl<S: KeyValueStore + Clone, R: Rng> VerseSession<S, R> {
    pub fn new(verses: VerseCollection, storage: S, rng: R) -> Self {
        VerseSession {
            verses,
            current: 0,
            settings: SettingsStore::new(storage.clone()),
            orders: OrderStore::new(storage),
            rng,
        }
    }

    /// Load the collection and build a session around it
    ///
    /// # Example
    /// ```
    /// # tokio_test::block_on(async {
    /// use daily_verse::loader::{InMemorySource, VerseLoader};
    /// use daily_verse::storage::MemoryStore;
    /// use daily_verse::VerseSession;
    /// use rand::rngs::StdRng;
    /// use rand::SeedableRng;
    /// use std::sync::Arc;
    ///
    /// let loader = VerseLoader::new(Arc::new(InMemorySource::new(
    ///     "verses.json",
    ///     r#"[{"text":"t","reference":"A","reflection":"r"}]"#,
    /// )));
    /// let session = VerseSession::init(&loader, MemoryStore::new(), StdRng::seed_from_u64(1))
    ///     .await
    ///     .unwrap();
    /// assert_eq!(session.verses().len(), 1);
    /// # });
    /// ```
    pub async fn init(loader: &VerseLoader, storage: S, rng: R) -> Result<Self, VerseError> {
        let outcome = loader.load().await?;
        tracing::info!(
            verses = outcome.verses.len(),
            fallback = matches!(outcome.origin, LoadOrigin::Fallback(_)),
            "verse session started"
        );
        Ok(VerseSession::new(outcome.verses, storage, rng))
    }

    pub fn verses(&self) -> &VerseCollection {
        &self.verses
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &VerseRecord {
        &self.verses[self.current]
    }

    /// Effective settings, defaults if nothing usable is stored
    pub fn settings(&self) -> Settings {
        self.settings.get()
    }

    /// Evaluate the stored policy and make its pick the current verse
    pub fn select(&mut self, now: OffsetDateTime) -> Result<Selection, SessionError> {
        let settings = self.settings.get();
        let selection = if settings.mode == PolicyMode::Shuffle {
            let seed = shuffle_seed(now);
            let mut order = self.orders.get_or_create(&self.verses, Some(&seed))?;
            let selection =
                engine::select_index(&self.verses, &settings, Some(&order), now, &mut self.rng)?;
            if selection.advance_order {
                self.orders.advance(&mut order)?;
            }
            selection
        } else {
            engine::select_index(&self.verses, &settings, None, now, &mut self.rng)?
        };
        self.current = selection.index;
        Ok(selection)
    }

    /// Evaluate the stored policy without writing anything
    ///
    /// Under the shuffle policy this is the verse the next [`select`] would
    /// show; the cursor is not advanced and a missing order is not persisted.
    ///
    /// [`select`]: VerseSession::select
    pub fn peek(&mut self, now: OffsetDateTime) -> Result<Selection, SessionError> {
        let settings = self.settings.get();
        let order = if settings.mode == PolicyMode::Shuffle {
            Some(self.orders.load().unwrap_or_else(|| {
                let seed = shuffle_seed(now);
                ShuffleOrder::new(hash::shuffle(&self.verses.references(), Some(&seed)))
            }))
        } else {
            None
        };
        let selection =
            engine::select_index(&self.verses, &settings, order.as_ref(), now, &mut self.rng)?;
        self.current = selection.index;
        Ok(selection)
    }

    /// Move to the following verse, wrapping; settings and order are untouched
    pub fn next(&mut self) -> &VerseRecord {
        self.current = engine::next_index(self.current, self.verses.len());
        self.current()
    }

    /// Persist a new policy mode and re-evaluate
    pub fn change_mode(
        &mut self,
        mode: PolicyMode,
        now: OffsetDateTime,
    ) -> Result<Selection, SessionError> {
        let settings = self.settings.get().with_mode(mode);
        self.settings.set(&settings)?;
        self.select(now)
    }

    /// Flip and persist the theme; selection is unaffected
    pub fn toggle_theme(&mut self) -> Result<ThemeName, StorageError> {
        let settings = self.settings.get();
        let theme = settings.theme.toggled();
        self.settings.set(&settings.with_theme(theme))?;
        Ok(theme)
    }

    /// Drop the persisted shuffle order
    pub fn reset_shuffle(&mut self) -> Result<(), StorageError> {
        self.orders.clear()
    }

    /// Restore the theme and show the verse for `now`
    pub fn start<P: Presenter>(
        &mut self,
        now: OffsetDateTime,
        presenter: &mut P,
    ) -> Result<(), SessionError> {
        presenter.theme_changed(self.settings.get().theme);
        self.select(now)?;
        presenter.verse_selected(self.current, self.current());
        Ok(())
    }

    /// Apply one user action and notify the presenter
    pub fn handle<P: Presenter>(
        &mut self,
        action: UserAction,
        now: OffsetDateTime,
        presenter: &mut P,
    ) -> Result<(), SessionError> {
        match action {
            UserAction::Next => {
                self.next();
            }
            UserAction::ChangeMode(mode) => {
                self.change_mode(mode, now)?;
            }
            UserAction::ToggleTheme => {
                let theme = self.toggle_theme()?;
                presenter.theme_changed(theme);
                return Ok(());
            }
        }
        presenter.verse_selected(self.current, self.current());
        Ok(())
    }
}

/// Seed for a new shuffle order: `now` in Unix milliseconds
fn shuffle_seed(now: OffsetDateTime) -> String {
    (now.unix_timestamp_nanos() / 1_000_000).to_string()
}
