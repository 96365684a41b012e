pub mod attributes;
pub mod comparison;
pub mod labels;
pub mod normalize;
pub mod scoring;
pub mod vocabulary;

pub use attributes::ExtractedAttributes;
pub use comparison::{ComparisonResult, VisualSimilarity};
pub use labels::Prediction;
pub use scoring::{MatchReason, PetTraits};
pub use vocabulary::VocabularyEntry;
