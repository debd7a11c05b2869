//! Selector-driven extraction of material records from listing pages.

pub mod card;
pub mod models;
pub mod normalize;
pub mod selectors;

pub use card::CardExtractor;
pub use models::{Availability, ExtractionContext, MaterialRecord};
pub use normalize::{clean_text, normalize_price};
pub use selectors::CompiledSelectors;
