//! Settings lookup and filename resolution for watershed-modeling control
//! files.
//!
//! A control file holds one setting per line in the form
//! `key | value # comment`. Lines starting with `#` are ignored.

pub mod config;
pub mod control;
pub mod error;
pub mod filename;

pub const CONFIG_LOCATION: &str = "/etc/wsctl/";

pub use control::{
    read_from_control, ControlCache, ControlFile, ControlPath, Entry, SettingSource,
};
pub use error::{ControlError, Result};
pub use filename::{resolve_filename, set_filename};
