pub mod client;
pub mod payload;

pub use client::{AnalysisBackend, AnalysisRequest, Endpoint, HttpAnalyzer, SubmissionPart};
pub use payload::{AnalysisReport, Band};
