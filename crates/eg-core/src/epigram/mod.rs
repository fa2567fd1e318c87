mod model;

pub use model::{Epigram, EpigramDraft, EpigramId, EpigramPatch, EpigramStatus};
