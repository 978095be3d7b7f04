pub mod copy;
pub mod error;
pub mod models;
pub mod pass_id;
pub mod theme;

pub use error::{Error, ErrorKind, Result};
pub use models::{AttendeeRecord, AttendeeView, PhotoAsset};
pub use pass_id::PassId;
pub use theme::{Palette, Theme};
