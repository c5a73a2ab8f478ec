//! Chat with one document, with solver and plotter tool calls.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;
use crate::services::{GenerationClient, Retriever};
use crate::tools::{EquationSolver, PlotRenderer};
use crate::utils::contains_any;

pub const CHAT_CONTEXT_CHUNKS: u64 = 3;
pub const NO_CONTEXT_MARKER: &str = "No relevant context was found in the document.";

const MATH_KEYWORDS: &[&str] = &["solve", "equation", "calculate", "evaluate", "math"];
const PLOT_KEYWORDS: &[&str] = &["plot", "graph", "visualize", "chart"];
const TABLE_KEYWORDS: &[&str] = &["table", "compare", "list"];
const DIAGRAM_KEYWORDS: &[&str] = &["flowchart", "diagram", "steps", "process"];

const MAX_ARGUMENT_CHARS: usize = 200;
const TOOL_RESULTS_HEADER: &str = "\n\n---\n**Tool Results:**";

static RE_TOOL_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(EQUATION|PLOT):\s*([^\n]+)").unwrap());

/// Capabilities a question seems to call for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolNeeds {
    pub math: bool,
    pub plot: bool,
    pub table: bool,
    pub diagram: bool,
}

impl ToolNeeds {
    pub fn detect(query: &str) -> Self {
        Self {
            math: contains_any(query, MATH_KEYWORDS),
            plot: contains_any(query, PLOT_KEYWORDS),
            table: contains_any(query, TABLE_KEYWORDS),
            diagram: contains_any(query, DIAGRAM_KEYWORDS),
        }
    }

    fn instructions(&self) -> String {
        let mut out = String::new();
        if self.math {
            out.push_str("\nIf the question involves solving equations, provide the equation in the format 'EQUATION: <equation>'");
        }
        if self.plot {
            out.push_str("\nIf visualization is needed, provide the function in the format 'PLOT: <function>'");
        }
        if self.table {
            out.push_str("\nIf a comparison or list is needed, present it as a markdown table.");
        }
        if self.diagram {
            out.push_str("\nIf a process needs to be shown, list steps clearly.");
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Equation,
    Plot,
}

impl ToolKind {
    fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "EQUATION" => Some(ToolKind::Equation),
            "PLOT" => Some(ToolKind::Plot),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRequest {
    pub tool: ToolKind,
    pub argument: String,
}

impl ToolRequest {
    /// Clean up the argument and reject anything unusable.
    pub fn validate(self) -> Result<Self, String> {
        let argument = self
            .argument
            .trim()
            .trim_end_matches('.')
            .trim_matches(|c| matches!(c, '`' | '$' | '\'' | '"'))
            .trim()
            .to_string();
        if argument.is_empty() {
            return Err("empty argument".to_string());
        }
        if argument.chars().count() > MAX_ARGUMENT_CHARS {
            return Err(format!("argument longer than {} characters", MAX_ARGUMENT_CHARS));
        }
        if argument.contains('<') && argument.contains('>') {
            return Err("argument is a template placeholder".to_string());
        }
        Ok(Self {
            tool: self.tool,
            argument,
        })
    }
}

/// A span of the generated answer: plain prose or a tool directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePart {
    Text(String),
    ToolRequest(ToolRequest),
}

/// Split a generated answer into prose and tool directives, in order.
pub fn parse_response(raw: &str) -> Vec<ResponsePart> {
    let mut parts = Vec::new();
    let mut last = 0;

    for caps in RE_TOOL_MARKER.captures_iter(raw) {
        let (Some(whole), Some(marker), Some(argument)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        if whole.start() > last {
            parts.push(ResponsePart::Text(raw[last..whole.start()].to_string()));
        }
        if let Some(tool) = ToolKind::from_marker(marker.as_str()) {
            parts.push(ResponsePart::ToolRequest(ToolRequest {
                tool,
                argument: argument.as_str().to_string(),
            }));
        }
        last = whole.end();
    }
    if last < raw.len() {
        parts.push(ResponsePart::Text(raw[last..].to_string()));
    }
    parts
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotImage {
    pub function: String,
    /// PNG, base64 encoded
    pub image_base64: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    pub needs: ToolNeeds,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plots: Vec<PlotImage>,
}

#[derive(Clone)]
pub struct ChatWorkflow {
    retriever: Retriever,
    generation: GenerationClient,
    solver: Arc<dyn EquationSolver>,
    plotter: Arc<dyn PlotRenderer>,
}

impl ChatWorkflow {
    pub fn new(
        retriever: Retriever,
        generation: GenerationClient,
        solver: Arc<dyn EquationSolver>,
        plotter: Arc<dyn PlotRenderer>,
    ) -> Self {
        Self {
            retriever,
            generation,
            solver,
            plotter,
        }
    }

    pub async fn answer(&self, query: &str, document_identifier: &str) -> ChatResponse {
        let needs = ToolNeeds::detect(query);
        tracing::debug!(?needs, document = document_identifier, "answering chat query");

        let context = self
            .retriever
            .context(query, document_identifier, CHAT_CONTEXT_CHUNKS, NO_CONTEXT_MARKER)
            .await;
        let prompt = build_prompt(query, &context, &needs);
        let raw = self.generation.generate_text(&prompt).await;

        let mut appendix = String::new();
        let mut plots = Vec::new();

        let requests = parse_response(&raw)
            .into_iter()
            .filter_map(|part| match part {
                ResponsePart::ToolRequest(request) => Some(request),
                ResponsePart::Text(_) => None,
            });

        for request in requests {
            let request = match request.validate() {
                Ok(request) => request,
                Err(reason) => {
                    tracing::warn!(%reason, "ignoring tool request");
                    continue;
                }
            };

            match request.tool {
                ToolKind::Equation => {
                    let solver = Arc::clone(&self.solver);
                    let equation = request.argument.clone();
                    match run_blocking(move || solver.solve(&equation)).await {
                        Ok(solution) => {
                            appendix.push_str(&format!("\n\n**Solution:** {}", solution));
                        }
                        Err(e) => {
                            tracing::warn!(equation = %request.argument, error = %e, "equation solver failed");
                        }
                    }
                }
                ToolKind::Plot => {
                    let plotter = Arc::clone(&self.plotter);
                    let function = request.argument.clone();
                    match run_blocking(move || plotter.render(&function)).await {
                        Ok(image_base64) => {
                            appendix.push_str("\n\n**Graph:** [Plot generated - see visualization]");
                            plots.push(PlotImage {
                                function: request.argument,
                                image_base64,
                            });
                        }
                        Err(e) => {
                            tracing::warn!(function = %request.argument, error = %e, "plot rendering failed");
                        }
                    }
                }
            }
        }

        let answer = if appendix.is_empty() {
            raw
        } else {
            format!("{}{}{}", raw, TOOL_RESULTS_HEADER, appendix)
        };

        ChatResponse {
            answer,
            needs,
            plots,
        }
    }
}

/// Solver scans and plot rendering are CPU-bound; keep them off the async
/// workers.
async fn run_blocking<T, F>(task: F) -> Result<T, ToolError>
where
    F: FnOnce() -> Result<T, ToolError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| ToolError::Evaluation(e.to_string()))?
}

fn build_prompt(query: &str, context: &str, needs: &ToolNeeds) -> String {
    format!(
        r#"You are a helpful tutor. Answer the student's question based on the context provided.
If the answer is not in the context, say so but try to help with general knowledge.
{tools}

Context:
{context}

Student Question: {query}

After answering, generate 3 follow-up questions that the student might want to ask to deepen their understanding.
Format the output as:
Answer: [Your Answer]

Follow-up Questions:
1. [Question 1]
2. [Question 2]
3. [Question 3]
"#,
        tools = needs.instructions(),
    )
}
