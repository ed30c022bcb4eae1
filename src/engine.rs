//! Verse selection policies
//!
//! [`select_index`] is a pure decision: it reads the verse collection, the
//! settings, an optional shuffle order and the current instant, and returns a
//! [`Selection`]. Advancing and persisting the shuffle cursor is left to the
//! caller, which applies [`Selection::advance_order`] through the order store.
use crate::error::{SelectError, VerseError};
use crate::hash::hash32;
use crate::order::ShuffleOrder;
use crate::settings::{PolicyMode, Settings};
use crate::verse::VerseCollection;
use rand::Rng;
use time::{OffsetDateTime, UtcOffset};

/// Days in the calendar the yearly policy tiles over
pub const YEARLY_SPAN: usize = 365;

/// Outcome of one policy evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Index into the collection, always in range
    pub index: usize,
    /// The caller should advance and persist the shuffle cursor
    pub advance_order: bool,
    /// Set when a stale shuffle reference forced the fallback to index 0
    pub stale: Option<VerseError>,
}

impl Selection {
    fn at(index: usize) -> Self {
        Selection {
            index,
            advance_order: false,
            stale: None,
        }
    }
}

/// Day of the UTC calendar year
///
/// Counts whole days since the last day of the previous year, so 1 January
/// is day 1 and 31 December of a leap year is day 366.
///
/// # Example
/// ```
/// use daily_verse::engine::day_of_year;
/// use time::macros::datetime;
///
/// assert_eq!(day_of_year(datetime!(2026-01-05 12:00 UTC)), 5);
/// // 23:30 at UTC-3 on 4 January is already 5 January in UTC
/// assert_eq!(day_of_year(datetime!(2026-01-04 23:30 -3)), 5);
/// ```
pub fn day_of_year(now: OffsetDateTime) -> u32 {
    u32::from(now.to_offset(UtcOffset::UTC).ordinal())
}

/// `YYYY-MM-DD` of the UTC calendar day containing `now`
pub fn utc_date_string(now: OffsetDateTime) -> String {
    let date = now.to_offset(UtcOffset::UTC).date();
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Rotation policy: day of year modulo collection size
pub fn rotation_index(day: u32, len: usize) -> usize {
    day as usize % len
}

/// Yearly policy
///
/// The inner modulus tiles collections shorter than a year evenly across the
/// calendar; the outer one keeps the index in range for any size.
pub fn yearly_index(day: u32, len: usize) -> usize {
    let span = len.clamp(1, YEARLY_SPAN);
    (day as usize % span) % len
}

/// Seeded policy: hash of the seed string modulo collection size
pub fn seeded_index(seed: &str, len: usize) -> usize {
    hash32(seed) as usize % len
}

/// Index after `current` for the "next" action, wrapping; ignores the policy
pub fn next_index(current: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        (current + 1) % len
    }
}

/// Evaluate the settings' policy against the collection
///
/// `rng` drives the random policy. `order` is required for the shuffle policy
/// and ignored otherwise. Unrecognized modes evaluate as rotation.
///
/// # Example
/// ```
/// use daily_verse::engine::select_index;
/// use daily_verse::{Settings, VerseCollection, VerseRecord};
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
/// use time::macros::datetime;
///
/// let verses = VerseCollection::new(vec![
///     VerseRecord::new("a", "A", ""),
///     VerseRecord::new("b", "B", ""),
///     VerseRecord::new("c", "C", ""),
/// ])
/// .unwrap();
/// let mut rng = StdRng::seed_from_u64(42);
/// let now = datetime!(2026-01-05 08:00 UTC);
/// let selection = select_index(&verses, &Settings::default(), None, now, &mut rng).unwrap();
/// assert_eq!(verses[selection.index].reference, "C");
/// ```
pub fn select_index<R: Rng>(
    verses: &VerseCollection,
    settings: &Settings,
    order: Option<&ShuffleOrder>,
    now: OffsetDateTime,
    rng: &mut R,
) -> Result<Selection, SelectError> {
    let len = verses.len();
    let selection = match &settings.mode {
        PolicyMode::Seeded => Selection::at(seeded_index(&utc_date_string(now), len)),
        PolicyMode::Random => Selection::at(rng.gen_range(0..len)),
        PolicyMode::Shuffle => {
            let order = order.ok_or(SelectError::MissingShuffleOrder)?;
            select_from_order(verses, order)
        }
        PolicyMode::Yearly => Selection::at(yearly_index(day_of_year(now), len)),
        PolicyMode::Rotation | PolicyMode::Other(_) => {
            Selection::at(rotation_index(day_of_year(now), len))
        }
    };
    tracing::debug!(
        mode = %settings.mode,
        index = selection.index,
        advance_order = selection.advance_order,
        "selected verse"
    );
    Ok(selection)
}

fn select_from_order(verses: &VerseCollection, order: &ShuffleOrder) -> Selection {
    let found = order
        .current()
        .and_then(|reference| verses.position_of(reference));
    match found {
        Some(index) => Selection {
            index,
            advance_order: true,
            stale: None,
        },
        None => {
            let reference = order.current().unwrap_or_default().to_string();
            tracing::warn!(%reference, "shuffle order is stale, showing first verse");
            Selection {
                index: 0,
                advance_order: false,
                stale: Some(VerseError::StaleOrderReference { reference }),
            }
        }
    }
}
