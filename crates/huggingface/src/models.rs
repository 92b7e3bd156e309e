use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct SummarizationRequest<'a> {
    pub inputs: &'a str,
    pub parameters: SummarizationParameters,
}

#[derive(Debug, Serialize)]
pub struct SummarizationParameters {
    pub max_length: usize,
    pub min_length: usize,
}

/// The inference API answers with either a list of summaries or an error object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SummarizationResponse {
    Summaries(Vec<SummaryText>),
    Error {
        error: String,
        #[serde(default)]
        estimated_time: Option<f64>,
    },
}

#[derive(Debug, Deserialize)]
pub struct SummaryText {
    pub summary_text: String,
}
