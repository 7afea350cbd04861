//! Card rendering: word wrap, font handling and CPU rasterization onto the card template.

pub mod card;
pub mod surface;
pub mod text;
pub mod wrap;

pub use card::{CardBackend, CardLayout, CardRenderer, ImageArtifact, card_file_name};
pub use text::{FontSet, FontSizes, TextLayoutEngine, TextRole};
pub use wrap::{TextMeasure, wrap_text};
