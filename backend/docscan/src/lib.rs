pub mod countries;
pub mod extract;
pub mod labels;
pub mod mrz;
pub mod vision;

pub use extract::{extract_guest, ExtractionMethod, ScanOutcome};
pub use vision::{OcrError, VisionOcr};
