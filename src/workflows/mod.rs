pub mod chat;
pub mod quiz;

pub use chat::{ChatResponse, ChatWorkflow, PlotImage, ResponsePart, ToolKind, ToolNeeds, ToolRequest};
pub use quiz::{QuizRequest, QuizStage, QuizState, QuizWorkflow};
