// Analysis pipeline entry point

pub mod orchestrator;
pub mod result;

pub use orchestrator::AnalysisOrchestrator;
pub use result::{AnalysisMetadata, AnalysisResult};
