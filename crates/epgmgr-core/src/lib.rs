//! XMLTV electronic program guide model for epgmgr.
//!
//! Keeps a guide document (channels and their time-bounded programmes) in
//! memory, validates programme intervals, purges stale entries, and
//! serializes the whole document to XMLTV.

mod error;
/// Channel and programme storage.
pub mod store;
/// Retention-based cleanup of old programmes.
pub mod sweeper;
/// Time literal conversion.
pub mod time;
mod xmltv;

pub use error::{EpgError, TimeFormatError};
#[allow(clippy::module_name_repetitions)]
pub use store::{
    Channel, DEFAULT_CATEGORY, EpgStore, Programme, ProgrammeUpdate, RESET_CATEGORY, StoreOptions,
};
pub use sweeper::{DEFAULT_RETENTION_DAYS, StaleProgrammeSweeper};
pub use time::{EpgTime, convert, convert_to_epg_time};
