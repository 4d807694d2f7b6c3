pub mod context;
pub mod extractor;
pub mod orchestrator;
pub mod planner;
pub mod writer;

pub use context::ContextRetriever;
pub use extractor::{ExtractionResult, StakeholderExtractor};
pub use orchestrator::{Orchestrator, Request, Response};
pub use planner::{PlanOutcome, PlannerRequest, TaskPlanner};
pub use writer::{EmailWriterAgent, WriterSettings};
