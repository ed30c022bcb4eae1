//! Verse source trait and the one-fallback verse loader
//!
//! A [`VerseSource`] produces the raw payload text. [`VerseLoader`] tries the
//! primary source once and, if it is unavailable or yields an empty or invalid
//! payload, parses the embedded fallback instead. There are no retries.
use crate::error::{LoadError, VerseError};
use crate::verse::VerseCollection;
use async_trait::async_trait;
#[cfg(feature = "tokio-runtime")]
use std::path::PathBuf;
use std::sync::Arc;

/// Async trait for fetching a verse payload
///
/// Implementations return the payload text unparsed; validation happens in
/// [`VerseLoader`] so that an invalid primary payload falls through to the
/// fallback exactly like an unreachable one.
#[async_trait]
pub trait VerseSource: Send + Sync {
    /// Fetch the payload text
    async fn fetch(&self) -> Result<String, LoadError>;

    /// Short name used in log events and diagnostics
    fn describe(&self) -> String;
}

/// Filesystem-backed verse source
///
/// Only available with the `tokio-runtime` feature (not on WASM).
#[cfg(feature = "tokio-runtime")]
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

#[cfg(feature = "tokio-runtime")]
impl FileSource {
    /// Create a source reading the given file
    ///
    /// # Example
    /// ```no_run
    /// use daily_verse::loader::FileSource;
    /// use std::path::PathBuf;
    ///
    /// let source = FileSource::new(PathBuf::from("verses.json"));
    /// ```
    pub fn new(path: PathBuf) -> Self {
        FileSource { path }
    }
}

#[cfg(feature = "tokio-runtime")]
#[async_trait]
impl VerseSource for FileSource {
    async fn fetch(&self) -> Result<String, LoadError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(LoadError::NotFound(self.path.display().to_string()))
            }
            Err(e) => Err(LoadError::Io(e.to_string())),
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Payload held in memory
///
/// Used for the payload embedded in the host page, and for tests. A source
/// built with [`InMemorySource::missing`] behaves like an absent payload.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    name: String,
    payload: Option<String>,
}

impl InMemorySource {
    /// # Example
    /// ```
    /// use daily_verse::loader::InMemorySource;
    ///
    /// let source = InMemorySource::new("inline", r#"[{"text":"t","reference":"r","reflection":"x"}]"#);
    /// ```
    pub fn new(name: impl Into<String>, payload: impl Into<String>) -> Self {
        InMemorySource {
            name: name.into(),
            payload: Some(payload.into()),
        }
    }

    pub fn missing(name: impl Into<String>) -> Self {
        InMemorySource {
            name: name.into(),
            payload: None,
        }
    }

    /// Build from an optional payload; blank text counts as missing
    pub fn from_option(name: impl Into<String>, payload: Option<String>) -> Self {
        match payload {
            Some(text) if !text.trim().is_empty() => InMemorySource::new(name, text),
            _ => InMemorySource::missing(name),
        }
    }
}

#[async_trait]
impl VerseSource for InMemorySource {
    async fn fetch(&self) -> Result<String, LoadError> {
        self.payload
            .clone()
            .ok_or_else(|| LoadError::NotFound(self.name.clone()))
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

/// Which tier produced the collection
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOrigin {
    Primary,
    /// The fallback was used; carries why the primary was rejected
    Fallback(VerseError),
}

/// A loaded collection together with where it came from
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub verses: VerseCollection,
    pub origin: LoadOrigin,
}

/// Primary source with at most one fallback
#[derive(Clone)]
pub struct VerseLoader {
    primary: Arc<dyn VerseSource>,
    fallback: Option<Arc<dyn VerseSource>>,
}

impl VerseLoader {
    pub fn new(primary: Arc<dyn VerseSource>) -> Self {
        VerseLoader {
            primary,
            fallback: None,
        }
    }

    /// Set the embedded fallback source
    pub fn with_fallback(mut self, fallback: Arc<dyn VerseSource>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Load the verse collection
    ///
    /// Returns [`VerseError::NoVerses`] when both tiers fail.
    ///
    /// # Example
    /// ```
    /// # tokio_test::block_on(async {
    /// use daily_verse::loader::{InMemorySource, LoadOrigin, VerseLoader};
    /// use std::sync::Arc;
    ///
    /// let loader = VerseLoader::new(Arc::new(InMemorySource::missing("verses.json")))
    ///     .with_fallback(Arc::new(InMemorySource::new(
    ///         "inline",
    ///         r#"[{"text":"t","reference":"A","reflection":"r"}]"#,
    ///     )));
    /// let outcome = loader.load().await.unwrap();
    /// assert_eq!(outcome.verses.len(), 1);
    /// assert!(matches!(outcome.origin, LoadOrigin::Fallback(_)));
    /// # });
    /// ```
    pub async fn load(&self) -> Result<LoadOutcome, VerseError> {
        let primary_err = match read_collection(self.primary.as_ref()).await {
            Ok(verses) => {
                return Ok(LoadOutcome {
                    verses,
                    origin: LoadOrigin::Primary,
                })
            }
            Err(e) => e,
        };
        tracing::warn!(
            source = %self.primary.describe(),
            error = %primary_err,
            "primary verse source failed, trying fallback"
        );

        let Some(fallback) = &self.fallback else {
            return Err(VerseError::NoVerses);
        };
        match read_collection(fallback.as_ref()).await {
            Ok(verses) => Ok(LoadOutcome {
                verses,
                origin: LoadOrigin::Fallback(VerseError::SourceUnavailable(primary_err)),
            }),
            Err(e) => {
                tracing::error!(
                    source = %fallback.describe(),
                    error = %e,
                    "fallback verse source failed"
                );
                Err(VerseError::NoVerses)
            }
        }
    }
}

async fn read_collection(source: &dyn VerseSource) -> Result<VerseCollection, LoadError> {
    let payload = source.fetch().await?;
    VerseCollection::from_json(&payload)
}
