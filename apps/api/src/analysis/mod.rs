// Resume screening: prompt building, result parsing, score checking and the
// pipeline that ties them to extraction and the model call.
// All LLM calls go through llm_client.

pub mod handlers;
pub mod parser;
pub mod pipeline;
pub mod prompts;
pub mod result;
pub mod scores;
