//! Daily Verse - verse-of-the-day selection engine
//!
//! This library picks the verse to show for a given day under one of several
//! rotation policies, persists the user's preferences and shuffle progress in
//! a string key-value store, and loads the verse collection from a primary
//! source with a single embedded fallback.
//!
//! # Example
//!
//! ```
//! # tokio_test::block_on(async {
//! use daily_verse::{load_session, InMemorySource, MemoryStore};
//! use time::macros::datetime;
//!
//! let payload = r#"[
//!     {"text": "a", "reference": "A", "reflection": ""},
//!     {"text": "b", "reference": "B", "reflection": ""},
//!     {"text": "c", "reference": "C", "reflection": ""}
//! ]"#;
//! let mut session = load_session(InMemorySource::new("verses.json", payload), None, MemoryStore::new())
//!     .await
//!     .unwrap();
//! session.select(datetime!(2026-01-05 07:00 UTC)).unwrap();
//! assert_eq!(session.current().reference, "C");
//! # });
//! ```

pub mod diagnostic;
pub mod engine;
pub mod error;
pub mod hash;
pub mod loader;
pub mod order;
pub mod session;
pub mod settings;
pub mod share;
pub mod storage;
pub mod verse;

#[cfg(feature = "cli")]
pub mod app_dirs;
#[cfg(feature = "cli")]
pub mod config;

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

/// Re-export main types for convenience
pub use engine::{select_index, Selection};
pub use error::{LoadError, SelectError, SessionError, StorageError, VerseError};
pub use loader::{InMemorySource, LoadOrigin, VerseLoader, VerseSource};
pub use order::{OrderStore, ShuffleOrder};
pub use session::{Presenter, UserAction, VerseSession};
pub use settings::{PolicyMode, Settings, SettingsLoad, SettingsStore, ThemeName};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use verse::{VerseCollection, VerseRecord};

#[cfg(feature = "tokio-runtime")]
pub use loader::FileSource;

/// Load the collection and start a session with an entropy-seeded RNG
///
/// `fallback` is the embedded payload tried when `primary` fails.
pub async fn load_session<P, S>(
    primary: P,
    fallback: Option<Arc<dyn VerseSource>>,
    storage: S,
) -> Result<VerseSession<S, StdRng>, VerseError>
where
    P: VerseSource + 'static,
    S: KeyValueStore + Clone,
{
    let mut loader = VerseLoader::new(Arc::new(primary));
    if let Some(fallback) = fallback {
        loader = loader.with_fallback(fallback);
    }
    VerseSession::init(&loader, storage, StdRng::from_entropy()).await
}
