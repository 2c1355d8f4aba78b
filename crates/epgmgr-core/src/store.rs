//! In-memory guide document: channels and their programmes.
//!
//! Programmes reference their channel by ID only; the store owns both
//! and cascades channel removal to the channel's programmes.

use crate::error::EpgError;
use crate::time::{EpgTime, convert};

/// Category written by `add_programme` when none is given.
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// Category written by `update_programme` whenever none is given.
pub const RESET_CATEGORY: &str = "Без категории";

/// Category sentinels used by the store.
#[allow(clippy::module_name_repetitions)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Category for programmes added without one.
    pub default_category: String,
    /// Category written on every update that omits one.
    pub reset_category: String,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            default_category: String::from(DEFAULT_CATEGORY),
            reset_category: String::from(RESET_CATEGORY),
        }
    }
}

/// A guide channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    /// Unique channel ID.
    pub id: String,
    /// Human-readable name.
    pub display_name: String,
    /// Optional logo URL.
    pub icon_url: Option<String>,
}

/// A scheduled programme on a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Programme {
    /// ID of the channel the programme airs on.
    pub channel_id: String,
    /// Inclusive start.
    pub start: EpgTime,
    /// Exclusive stop.
    pub stop: EpgTime,
    /// Programme title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Programme category.
    pub category: String,
}

impl Programme {
    /// Returns `true` if `[start, stop)` intersects this programme's
    /// interval. Touching endpoints do not overlap.
    #[must_use]
    pub fn overlaps(&self, start: EpgTime, stop: EpgTime) -> bool {
        start < self.stop && self.start < stop
    }

    fn matches(&self, channel_id: &str, start: EpgTime, stop: EpgTime) -> bool {
        self.channel_id == channel_id && self.start == start && self.stop == stop
    }
}

/// Optional changes applied by [`EpgStore::update_programme`].
///
/// Time fields take `YYYY-MM-DD.HH:MM.±ZZ` literals. Empty strings count
/// as absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgrammeUpdate<'a> {
    /// New start literal.
    pub new_start: Option<&'a str>,
    /// New stop literal.
    pub new_stop: Option<&'a str>,
    /// New title.
    pub title: Option<&'a str>,
    /// New description.
    pub desc: Option<&'a str>,
    /// New category; when absent the category is reset.
    pub category: Option<&'a str>,
}

/// The guide document.
#[allow(clippy::module_name_repetitions)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpgStore {
    options: StoreOptions,
    channels: Vec<Channel>,
    programmes: Vec<Programme>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn convert_arg(literal: &str) -> Result<EpgTime, EpgError> {
    convert(literal).map_err(EpgError::TimeConvert)
}

impl EpgStore {
    /// Creates an empty store with default category sentinels.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with the given options.
    #[must_use]
    pub const fn with_options(options: StoreOptions) -> Self {
        Self {
            options,
            channels: Vec::new(),
            programmes: Vec::new(),
        }
    }

    /// Store options.
    #[must_use]
    pub const fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// All channels in insertion order.
    #[must_use]
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// All programmes in insertion order.
    #[must_use]
    pub fn programmes(&self) -> &[Programme] {
        &self.programmes
    }

    /// Looks up a channel by ID.
    #[must_use]
    pub fn channel(&self, id: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.id == id)
    }

    /// Iterates the programmes of one channel.
    pub fn programmes_for<'a>(
        &'a self,
        channel_id: &'a str,
    ) -> impl Iterator<Item = &'a Programme> {
        self.programmes
            .iter()
            .filter(move |p| p.channel_id == channel_id)
    }

    /// Returns `true` if the store holds no channels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    fn require_channel(&self, id: &str) -> Result<usize, EpgError> {
        self.channels
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| EpgError::ChannelNotFound(String::from(id)))
    }

    fn find_programme(&self, channel_id: &str, start: EpgTime, stop: EpgTime) -> Option<usize> {
        self.programmes
            .iter()
            .position(|p| p.matches(channel_id, start, stop))
    }

    /// Adds a channel.
    ///
    /// # Errors
    ///
    /// Returns `EpgError::ChannelAlreadyExists` if `id` is taken.
    pub fn add_channel(
        &mut self,
        id: &str,
        display_name: &str,
        icon_url: Option<&str>,
    ) -> Result<(), EpgError> {
        if self.channel(id).is_some() {
            return Err(EpgError::ChannelAlreadyExists(String::from(id)));
        }

        self.channels.push(Channel {
            id: String::from(id),
            display_name: String::from(display_name),
            icon_url: non_empty(icon_url).map(String::from),
        });
        tracing::debug!(channel = id, "channel added");
        Ok(())
    }

    /// Removes a channel together with all of its programmes.
    ///
    /// # Errors
    ///
    /// Returns `EpgError::ChannelNotFound` if `id` is unknown.
    pub fn remove_channel(&mut self, id: &str) -> Result<(), EpgError> {
        let index = self.require_channel(id)?;
        self.channels.remove(index);

        let before = self.programmes.len();
        self.programmes.retain(|p| p.channel_id != id);
        tracing::debug!(
            channel = id,
            programmes = before.saturating_sub(self.programmes.len()),
            "channel removed"
        );
        Ok(())
    }

    /// Updates a channel.
    ///
    /// The display name changes only when given. The icon is replaced when
    /// given and removed when absent or empty.
    ///
    /// # Errors
    ///
    /// Returns `EpgError::ChannelNotFound` if `id` is unknown.
    pub fn update_channel(
        &mut self,
        id: &str,
        display_name: Option<&str>,
        icon_url: Option<&str>,
    ) -> Result<(), EpgError> {
        let index = self.require_channel(id)?;
        let Some(channel) = self.channels.get_mut(index) else {
            return Err(EpgError::ChannelNotFound(String::from(id)));
        };

        if let Some(name) = non_empty(display_name) {
            channel.display_name = String::from(name);
        }
        channel.icon_url = non_empty(icon_url).map(String::from);
        tracing::debug!(channel = id, "channel updated");
        Ok(())
    }

    /// Adds a programme from `YYYY-MM-DD.HH:MM.±ZZ` literals.
    ///
    /// The category defaults to the store's default category.
    ///
    /// # Errors
    ///
    /// - `EpgError::ChannelNotFound` if the channel is unknown.
    /// - `EpgError::TimeConvert` if a literal does not parse.
    /// - `EpgError::InvalidInterval` if `start >= stop`.
    /// - `EpgError::Overlap` if the interval intersects another programme
    ///   on the same channel.
    pub fn add_programme(
        &mut self,
        channel_id: &str,
        start: &str,
        stop: &str,
        title: &str,
        desc: Option<&str>,
        category: Option<&str>,
    ) -> Result<(), EpgError> {
        self.require_channel(channel_id)?;
        let start = convert_arg(start)?;
        let stop = convert_arg(stop)?;
        let category = non_empty(category).map_or_else(
            || self.options.default_category.clone(),
            String::from,
        );

        self.insert_programme(Programme {
            channel_id: String::from(channel_id),
            start,
            stop,
            title: String::from(title),
            description: non_empty(desc).map(String::from),
            category,
        })
    }

    /// Appends an already-built programme after validating it.
    ///
    /// # Errors
    ///
    /// Same rule checks as [`EpgStore::add_programme`].
    pub fn insert_programme(&mut self, programme: Programme) -> Result<(), EpgError> {
        self.require_channel(&programme.channel_id)?;

        if programme.start >= programme.stop {
            return Err(EpgError::InvalidInterval {
                start: programme.start,
                stop: programme.stop,
            });
        }

        if self.overlaps_other(&programme.channel_id, programme.start, programme.stop, None) {
            return Err(EpgError::Overlap {
                channel_id: programme.channel_id,
                start: programme.start,
                stop: programme.stop,
            });
        }

        tracing::debug!(
            channel = %programme.channel_id,
            start = %programme.start,
            stop = %programme.stop,
            "programme added"
        );
        self.programmes.push(programme);
        Ok(())
    }

    /// Appends a programme read back from a saved guide.
    ///
    /// The channel must exist and `start < stop` must hold. Overlap is
    /// logged rather than rejected, since updates may have shifted a
    /// programme into its neighbour before the guide was saved.
    ///
    /// # Errors
    ///
    /// - `EpgError::ChannelNotFound` if the channel is unknown.
    /// - `EpgError::InvalidInterval` if `start >= stop`.
    pub(crate) fn restore_programme(&mut self, programme: Programme) -> Result<(), EpgError> {
        self.require_channel(&programme.channel_id)?;

        if programme.start >= programme.stop {
            return Err(EpgError::InvalidInterval {
                start: programme.start,
                stop: programme.stop,
            });
        }

        if self.overlaps_other(&programme.channel_id, programme.start, programme.stop, None) {
            tracing::warn!(
                channel = %programme.channel_id,
                start = %programme.start,
                stop = %programme.stop,
                "stored programme overlaps another programme"
            );
        }

        self.programmes.push(programme);
        Ok(())
    }

    /// Returns `true` if any programme on `channel_id` other than the one at
    /// `skip` overlaps `[start, stop)`.
    fn overlaps_other(
        &self,
        channel_id: &str,
        start: EpgTime,
        stop: EpgTime,
        skip: Option<usize>,
    ) -> bool {
        self.programmes.iter().enumerate().any(|(i, p)| {
            Some(i) != skip && p.channel_id == channel_id && p.overlaps(start, stop)
        })
    }

    /// Removes the first programme matching the channel and exact interval.
    ///
    /// # Errors
    ///
    /// - `EpgError::ChannelNotFound` if the channel is unknown.
    /// - `EpgError::TimeConvert` if a literal does not parse.
    /// - `EpgError::ProgrammeNotFound` if nothing matches.
    pub fn remove_programme(
        &mut self,
        channel_id: &str,
        start: &str,
        stop: &str,
    ) -> Result<(), EpgError> {
        self.require_channel(channel_id)?;
        let start = convert_arg(start)?;
        let stop = convert_arg(stop)?;

        let index = self
            .find_programme(channel_id, start, stop)
            .ok_or_else(|| EpgError::ProgrammeNotFound {
                channel_id: String::from(channel_id),
                start,
                stop,
            })?;
        self.programmes.remove(index);
        tracing::debug!(channel = channel_id, start = %start, stop = %stop, "programme removed");
        Ok(())
    }

    /// Updates the programme matching the channel and exact interval.
    ///
    /// Every input is converted and checked before anything changes, and
    /// the resulting interval must keep `start < stop`. Overlap with other
    /// programmes is not re-checked. The category is set when given and
    /// otherwise reset to the store's reset category.
    ///
    /// # Errors
    ///
    /// - `EpgError::ChannelNotFound` if the channel is unknown.
    /// - `EpgError::TimeConvert` if any literal does not parse.
    /// - `EpgError::ProgrammeNotFound` if nothing matches.
    /// - `EpgError::InvalidInterval` if the new interval is empty or inverted.
    pub fn update_programme(
        &mut self,
        channel_id: &str,
        old_start: &str,
        old_stop: &str,
        update: &ProgrammeUpdate<'_>,
    ) -> Result<(), EpgError> {
        self.require_channel(channel_id)?;
        let old_start = convert_arg(old_start)?;
        let old_stop = convert_arg(old_stop)?;

        let not_found = || EpgError::ProgrammeNotFound {
            channel_id: String::from(channel_id),
            start: old_start,
            stop: old_stop,
        };
        let index = self
            .find_programme(channel_id, old_start, old_stop)
            .ok_or_else(not_found)?;

        let new_start = non_empty(update.new_start).map(convert_arg).transpose()?;
        let new_stop = non_empty(update.new_stop).map(convert_arg).transpose()?;
        let start = new_start.unwrap_or(old_start);
        let stop = new_stop.unwrap_or(old_stop);
        if start >= stop {
            return Err(EpgError::InvalidInterval { start, stop });
        }

        if new_start.is_some() || new_stop.is_some() {
            if self.overlaps_other(channel_id, start, stop, Some(index)) {
                tracing::warn!(
                    channel = channel_id,
                    start = %start,
                    stop = %stop,
                    "updated programme overlaps another programme"
                );
            }
        }

        let category = non_empty(update.category).map_or_else(
            || self.options.reset_category.clone(),
            String::from,
        );
        let programme = self.programmes.get_mut(index).ok_or_else(not_found)?;
        programme.start = start;
        programme.stop = stop;
        if let Some(title) = non_empty(update.title) {
            programme.title = String::from(title);
        }
        if let Some(desc) = non_empty(update.desc) {
            programme.description = Some(String::from(desc));
        }
        programme.category = category;

        tracing::debug!(channel = channel_id, start = %start, stop = %stop, "programme updated");
        Ok(())
    }

    /// Keeps only the programmes for which `keep` returns `true`.
    /// Returns how many were removed.
    pub fn retain_programmes<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&Programme) -> bool,
    {
        let before = self.programmes.len();
        self.programmes.retain(keep);
        before.saturating_sub(self.programmes.len())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use tracing::subscriber::with_default;
    use tracing_mock::{expect, subscriber};

    use super::*;

    const NOON: &str = "2024-08-17.12:00.+00";
    const HALF_PAST: &str = "2024-08-17.12:30.+00";
    const ONE: &str = "2024-08-17.13:00.+00";
    const HALF_PAST_ONE: &str = "2024-08-17.13:30.+00";
    const TWO: &str = "2024-08-17.14:00.+00";

    fn store_with_channel() -> EpgStore {
        let mut store = EpgStore::new();
        store
            .add_channel("sport", "Sport 1", Some("https://example.com/sport.png"))
            .unwrap();
        store
    }

    #[test]
    fn test_add_channel() {
        // Arrange & Act
        let store = store_with_channel();

        // Assert
        let channel = store.channel("sport").unwrap();
        assert_eq!(channel.display_name, "Sport 1");
        assert_eq!(
            channel.icon_url.as_deref(),
            Some("https://example.com/sport.png")
        );
    }

    #[test]
    fn test_add_channel_duplicate() {
        // Arrange
        let mut store = store_with_channel();

        // Act
        let result = store.add_channel("sport", "Other", None);

        // Assert
        assert_eq!(
            result,
            Err(EpgError::ChannelAlreadyExists(String::from("sport")))
        );
        assert_eq!(store.channels().len(), 1);
    }

    #[test]
    fn test_add_channel_empty_icon_is_none() {
        // Arrange
        let mut store = EpgStore::new();

        // Act
        store.add_channel("news", "News", Some("")).unwrap();

        // Assert
        assert!(store.channel("news").unwrap().icon_url.is_none());
    }

    #[test]
    fn test_remove_channel_cascades() {
        // Arrange
        let mut store = store_with_channel();
        store.add_channel("news", "News", None).unwrap();
        store
            .add_programme("sport", NOON, ONE, "Football", None, None)
            .unwrap();
        store
            .add_programme("sport", ONE, TWO, "Tennis", None, None)
            .unwrap();
        store
            .add_programme("news", NOON, ONE, "Headlines", None, None)
            .unwrap();

        // Act
        store.remove_channel("sport").unwrap();

        // Assert
        assert!(store.channel("sport").is_none());
        assert_eq!(store.programmes().len(), 1);
        assert_eq!(store.programmes_for("sport").count(), 0);
        assert_eq!(
            store.add_programme("sport", NOON, ONE, "Football", None, None),
            Err(EpgError::ChannelNotFound(String::from("sport")))
        );
    }

    #[test]
    fn test_remove_channel_unknown() {
        // Arrange
        let mut store = EpgStore::new();

        // Act & Assert
        assert_eq!(
            store.remove_channel("ghost"),
            Err(EpgError::ChannelNotFound(String::from("ghost")))
        );
    }

    #[test]
    fn test_update_channel_name_keeps_icon_when_given() {
        // Arrange
        let mut store = store_with_channel();

        // Act
        store
            .update_channel("sport", Some("Sport HD"), Some("https://example.com/hd.png"))
            .unwrap();

        // Assert
        let channel = store.channel("sport").unwrap();
        assert_eq!(channel.display_name, "Sport HD");
        assert_eq!(
            channel.icon_url.as_deref(),
            Some("https://example.com/hd.png")
        );
    }

    #[test]
    fn test_update_channel_without_icon_clears_it() {
        // Arrange
        let mut store = store_with_channel();

        // Act
        store.update_channel("sport", None, None).unwrap();

        // Assert
        let channel = store.channel("sport").unwrap();
        assert_eq!(channel.display_name, "Sport 1");
        assert!(channel.icon_url.is_none());
    }

    #[test]
    fn test_update_channel_adds_icon() {
        // Arrange
        let mut store = EpgStore::new();
        store.add_channel("news", "News", None).unwrap();

        // Act
        store
            .update_channel("news", Some(""), Some("https://example.com/news.png"))
            .unwrap();

        // Assert
        let channel = store.channel("news").unwrap();
        assert_eq!(channel.display_name, "News");
        assert_eq!(
            channel.icon_url.as_deref(),
            Some("https://example.com/news.png")
        );
    }

    #[test]
    fn test_update_channel_unknown() {
        // Arrange
        let mut store = EpgStore::new();

        // Act & Assert
        assert!(matches!(
            store.update_channel("ghost", Some("Ghost"), None),
            Err(EpgError::ChannelNotFound(_))
        ));
    }

    #[test]
    fn test_add_programme_defaults_category() {
        // Arrange
        let mut store = store_with_channel();

        // Act
        store
            .add_programme("sport", NOON, ONE, "Football", Some("Final"), None)
            .unwrap();

        // Assert
        let programme = &store.programmes()[0];
        assert_eq!(programme.title, "Football");
        assert_eq!(programme.description.as_deref(), Some("Final"));
        assert_eq!(programme.category, DEFAULT_CATEGORY);
        assert_eq!(programme.start.to_string(), "20240817120000 +0000");
        assert_eq!(programme.stop.to_string(), "20240817130000 +0000");
    }

    #[test]
    fn test_add_programme_unknown_channel() {
        // Arrange
        let mut store = EpgStore::new();

        // Act
        let result = store.add_programme("ghost", NOON, ONE, "Nothing", None, None);

        // Assert
        assert_eq!(result, Err(EpgError::ChannelNotFound(String::from("ghost"))));
    }

    #[test]
    fn test_add_programme_bad_literal() {
        // Arrange
        let mut store = store_with_channel();

        // Act
        let result = store.add_programme("sport", "2024-08-17 12:00", ONE, "Football", None, None);

        // Assert
        assert!(matches!(result, Err(EpgError::TimeConvert(_))));
        assert!(store.programmes().is_empty());
    }

    #[test]
    fn test_add_programme_rejects_non_increasing_interval() {
        // Arrange
        let mut store = store_with_channel();

        // Act
        let equal = store.add_programme("sport", NOON, NOON, "Zero", None, None);
        let inverted = store.add_programme("sport", ONE, NOON, "Backwards", None, None);

        // Assert
        assert!(matches!(equal, Err(EpgError::InvalidInterval { .. })));
        assert!(matches!(inverted, Err(EpgError::InvalidInterval { .. })));
        assert!(equal.unwrap_err().is_rule_violation());
    }

    #[test]
    fn test_add_programme_rejects_overlap() {
        // Arrange
        let mut store = store_with_channel();
        store
            .add_programme("sport", NOON, ONE, "Football", None, None)
            .unwrap();

        // Act
        let result = store.add_programme("sport", HALF_PAST, HALF_PAST_ONE, "Tennis", None, None);

        // Assert
        assert!(matches!(result, Err(EpgError::Overlap { .. })));
        assert_eq!(store.programmes().len(), 1);
    }

    #[test]
    fn test_add_programme_touching_intervals() {
        // Arrange
        let mut store = store_with_channel();
        store
            .add_programme("sport", NOON, ONE, "Football", None, None)
            .unwrap();

        // Act
        let result = store.add_programme("sport", ONE, TWO, "Tennis", None, None);

        // Assert
        assert!(result.is_ok());
        assert_eq!(store.programmes().len(), 2);
    }

    #[test]
    fn test_add_programme_same_interval_other_channel() {
        // Arrange
        let mut store = store_with_channel();
        store.add_channel("news", "News", None).unwrap();
        store
            .add_programme("sport", NOON, ONE, "Football", None, None)
            .unwrap();

        // Act
        let result = store.add_programme("news", NOON, ONE, "Headlines", None, Some("News"));

        // Assert
        assert!(result.is_ok());
        assert_eq!(store.programmes_for("news").next().unwrap().category, "News");
    }

    #[test]
    fn test_add_programme_enclosing_interval_overlaps() {
        // Arrange
        let mut store = store_with_channel();
        store
            .add_programme("sport", HALF_PAST, ONE, "Short", None, None)
            .unwrap();

        // Act
        let result = store.add_programme("sport", NOON, TWO, "Long", None, None);

        // Assert
        assert!(matches!(result, Err(EpgError::Overlap { .. })));
    }

    #[test]
    fn test_remove_programme() {
        // Arrange
        let mut store = store_with_channel();
        store
            .add_programme("sport", NOON, ONE, "Football", None, None)
            .unwrap();
        store
            .add_programme("sport", ONE, TWO, "Tennis", None, None)
            .unwrap();

        // Act
        store.remove_programme("sport", NOON, ONE).unwrap();

        // Assert
        assert_eq!(store.programmes().len(), 1);
        assert_eq!(store.programmes()[0].title, "Tennis");
    }

    #[test]
    fn test_remove_programme_requires_exact_interval() {
        // Arrange
        let mut store = store_with_channel();
        store
            .add_programme("sport", NOON, ONE, "Football", None, None)
            .unwrap();

        // Act
        let result = store.remove_programme("sport", NOON, HALF_PAST_ONE);

        // Assert
        assert!(matches!(result, Err(EpgError::ProgrammeNotFound { .. })));
        assert_eq!(store.programmes().len(), 1);
    }

    #[test]
    fn test_remove_programme_unknown_channel() {
        // Arrange
        let mut store = EpgStore::new();

        // Act & Assert
        assert!(matches!(
            store.remove_programme("ghost", NOON, ONE),
            Err(EpgError::ChannelNotFound(_))
        ));
    }

    #[test]
    fn test_update_programme_fields() {
        // Arrange
        let mut store = store_with_channel();
        store
            .add_programme("sport", NOON, ONE, "Football", None, Some("Sport"))
            .unwrap();

        // Act
        store
            .update_programme(
                "sport",
                NOON,
                ONE,
                &ProgrammeUpdate {
                    title: Some("Football: Final"),
                    desc: Some("Live"),
                    category: Some("Live sport"),
                    ..ProgrammeUpdate::default()
                },
            )
            .unwrap();

        // Assert
        let programme = &store.programmes()[0];
        assert_eq!(programme.title, "Football: Final");
        assert_eq!(programme.description.as_deref(), Some("Live"));
        assert_eq!(programme.category, "Live sport");
    }

    #[test]
    fn test_update_programme_without_category_resets_it() {
        // Arrange
        let mut store = store_with_channel();
        store
            .add_programme("sport", NOON, ONE, "Football", None, Some("Sport"))
            .unwrap();

        // Act
        store
            .update_programme(
                "sport",
                NOON,
                ONE,
                &ProgrammeUpdate {
                    title: Some("Football"),
                    ..ProgrammeUpdate::default()
                },
            )
            .unwrap();

        // Assert
        assert_eq!(store.programmes()[0].category, RESET_CATEGORY);
    }

    #[test]
    fn test_update_programme_reset_category_is_configurable() {
        // Arrange
        let mut store = EpgStore::with_options(StoreOptions {
            reset_category: String::from("No category"),
            ..StoreOptions::default()
        });
        store.add_channel("sport", "Sport 1", None).unwrap();
        store
            .add_programme("sport", NOON, ONE, "Football", None, Some("Sport"))
            .unwrap();

        // Act
        store
            .update_programme("sport", NOON, ONE, &ProgrammeUpdate::default())
            .unwrap();

        // Assert
        assert_eq!(store.programmes()[0].category, "No category");
    }

    #[test]
    fn test_update_programme_shifts_times() {
        // Arrange
        let mut store = store_with_channel();
        store
            .add_programme("sport", NOON, ONE, "Football", None, None)
            .unwrap();

        // Act
        store
            .update_programme(
                "sport",
                NOON,
                ONE,
                &ProgrammeUpdate {
                    new_start: Some(HALF_PAST),
                    new_stop: Some(TWO),
                    ..ProgrammeUpdate::default()
                },
            )
            .unwrap();

        // Assert
        let programme = &store.programmes()[0];
        assert_eq!(programme.start.to_string(), "20240817123000 +0000");
        assert_eq!(programme.stop.to_string(), "20240817140000 +0000");
        assert!(store.remove_programme("sport", HALF_PAST, TWO).is_ok());
    }

    #[test]
    fn test_update_programme_moves_both_past_old_stop() {
        // Arrange
        let mut store = store_with_channel();
        store
            .add_programme("sport", NOON, HALF_PAST, "Football", None, None)
            .unwrap();

        // Act: the new start lies after the old stop but before the new stop
        let result = store.update_programme(
            "sport",
            NOON,
            HALF_PAST,
            &ProgrammeUpdate {
                new_start: Some(ONE),
                new_stop: Some(TWO),
                ..ProgrammeUpdate::default()
            },
        );

        // Assert
        assert!(result.is_ok());
        assert_eq!(store.programmes()[0].start.to_string(), "20240817130000 +0000");
    }

    #[test]
    fn test_update_programme_rejects_start_after_stop() {
        // Arrange
        let mut store = store_with_channel();
        store
            .add_programme("sport", NOON, ONE, "Football", None, Some("Sport"))
            .unwrap();

        // Act
        let result = store.update_programme(
            "sport",
            NOON,
            ONE,
            &ProgrammeUpdate {
                new_start: Some(ONE),
                title: Some("Changed"),
                ..ProgrammeUpdate::default()
            },
        );

        // Assert: nothing was applied
        assert!(matches!(result, Err(EpgError::InvalidInterval { .. })));
        let programme = &store.programmes()[0];
        assert_eq!(programme.title, "Football");
        assert_eq!(programme.category, "Sport");
        assert_eq!(programme.start.to_string(), "20240817120000 +0000");
    }

    #[test]
    fn test_update_programme_rejects_stop_before_start() {
        // Arrange
        let mut store = store_with_channel();
        store
            .add_programme("sport", HALF_PAST, ONE, "Football", None, None)
            .unwrap();

        // Act
        let result = store.update_programme(
            "sport",
            HALF_PAST,
            ONE,
            &ProgrammeUpdate {
                new_stop: Some(NOON),
                ..ProgrammeUpdate::default()
            },
        );

        // Assert
        assert!(matches!(result, Err(EpgError::InvalidInterval { .. })));
    }

    #[test]
    fn test_update_programme_bad_literal_changes_nothing() {
        // Arrange
        let mut store = store_with_channel();
        store
            .add_programme("sport", NOON, ONE, "Football", None, Some("Sport"))
            .unwrap();

        // Act
        let result = store.update_programme(
            "sport",
            NOON,
            ONE,
            &ProgrammeUpdate {
                new_start: Some(HALF_PAST),
                new_stop: Some("tomorrow"),
                ..ProgrammeUpdate::default()
            },
        );

        // Assert
        assert!(matches!(result, Err(EpgError::TimeConvert(_))));
        let programme = &store.programmes()[0];
        assert_eq!(programme.start.to_string(), "20240817120000 +0000");
        assert_eq!(programme.category, "Sport");
    }

    #[test]
    fn test_update_programme_not_found() {
        // Arrange
        let mut store = store_with_channel();

        // Act
        let result =
            store.update_programme("sport", NOON, ONE, &ProgrammeUpdate::default());

        // Assert
        assert!(matches!(result, Err(EpgError::ProgrammeNotFound { .. })));
    }

    #[test]
    fn test_update_programme_does_not_recheck_overlap() {
        // Arrange
        let mut store = store_with_channel();
        store
            .add_programme("sport", NOON, ONE, "Football", None, None)
            .unwrap();
        store
            .add_programme("sport", ONE, TWO, "Tennis", None, None)
            .unwrap();

        // Act
        let result = store.update_programme(
            "sport",
            ONE,
            TWO,
            &ProgrammeUpdate {
                new_start: Some(HALF_PAST),
                ..ProgrammeUpdate::default()
            },
        );

        // Assert
        assert!(result.is_ok());
        let shifted = &store.programmes()[1];
        assert!(store.programmes()[0].overlaps(shifted.start, shifted.stop));
    }

    #[test]
    fn test_update_programme_warns_on_overlap() {
        // Arrange
        let mut store = store_with_channel();
        store
            .add_programme("sport", NOON, ONE, "Football", None, None)
            .unwrap();
        store
            .add_programme("sport", ONE, TWO, "Tennis", None, None)
            .unwrap();
        let (subscriber, handle) = subscriber::mock()
            .event(
                expect::event()
                    .at_level(tracing::Level::WARN)
                    .with_fields(expect::msg("updated programme overlaps another programme")),
            )
            .event(
                expect::event()
                    .at_level(tracing::Level::DEBUG)
                    .with_fields(expect::msg("programme updated")),
            )
            .only()
            .run_with_handle();
        let shift = ProgrammeUpdate {
            new_start: Some(HALF_PAST),
            ..ProgrammeUpdate::default()
        };

        // Act
        let result = with_default(subscriber, || {
            store.update_programme("sport", ONE, TWO, &shift)
        });

        // Assert
        assert!(result.is_ok());
        handle.assert_finished();
    }

    #[test]
    fn test_update_programme_without_overlap_does_not_warn() {
        // Arrange
        let mut store = store_with_channel();
        store
            .add_programme("sport", NOON, ONE, "Football", None, None)
            .unwrap();
        store
            .add_programme("sport", ONE, TWO, "Tennis", None, None)
            .unwrap();
        let (subscriber, handle) = subscriber::mock()
            .event(
                expect::event()
                    .at_level(tracing::Level::DEBUG)
                    .with_fields(expect::msg("programme updated")),
            )
            .only()
            .run_with_handle();
        let shift = ProgrammeUpdate {
            new_start: Some(HALF_PAST_ONE),
            ..ProgrammeUpdate::default()
        };

        // Act
        let result = with_default(subscriber, || {
            store.update_programme("sport", ONE, TWO, &shift)
        });

        // Assert
        assert!(result.is_ok());
        handle.assert_finished();
    }

    #[test]
    fn test_add_programme_mixed_offsets_follow_canonical_order() {
        // Arrange
        let mut store = store_with_channel();

        // Act
        let east_to_west = store.add_programme(
            "sport",
            "2024-08-17.12:00.+03",
            "2024-08-17.12:00.-05",
            "Relay",
            None,
            None,
        );
        let west_to_east = store.add_programme(
            "sport",
            "2024-08-18.12:00.-05",
            "2024-08-18.12:00.+03",
            "Return",
            None,
            None,
        );

        // Assert
        assert!(east_to_west.is_ok());
        assert!(matches!(west_to_east, Err(EpgError::InvalidInterval { .. })));
    }

    #[test]
    fn test_retain_programmes_counts_removed() {
        // Arrange
        let mut store = store_with_channel();
        store
            .add_programme("sport", NOON, ONE, "Football", None, None)
            .unwrap();
        store
            .add_programme("sport", ONE, TWO, "Tennis", None, None)
            .unwrap();

        // Act
        let removed = store.retain_programmes(|p| p.title == "Tennis");

        // Assert
        assert_eq!(removed, 1);
        assert_eq!(store.programmes()[0].title, "Tennis");
    }
}
