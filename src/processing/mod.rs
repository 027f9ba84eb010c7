//! Pure image operations behind the display: resizing, palette extraction,
//! brightness classification and cross-fade blending.

pub mod brightness;
pub mod fade;
pub mod palette;
pub mod resize;
