//! Pass Template Renderer
//!
//! Turns an attendee snapshot plus presentation choices (template, theme,
//! optional selfie) into a self-contained SVG document with every slot of
//! the template bound. Rendering is pure: the only time-dependent value, the
//! footer date, is an explicit input.

pub mod assets;
pub mod error;
pub mod qr;
pub mod render;
pub mod slots;
pub mod template;
pub mod text;

pub use error::{RenderError, RenderResult};
pub use render::{render_pass, PassData, PhotoRef, RenderRequest, RenderedPass, SiteInfo};
pub use slots::{PhotoSlot, Slot, SlotMap};
pub use template::{Layout, SlotBox, TemplateKey, TextBox};
