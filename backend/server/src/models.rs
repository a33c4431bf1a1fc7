use serde::{Deserialize, Serialize};

pub const DEFAULT_ENDPOINT: &str =
    "https://dashscope.aliyuncs.com/api/v1/services/aigc/text-generation/generation";

pub const DEFAULT_MODEL: &str = "qwen-turbo";

pub const SYSTEM_PERSONA: &str = "You are a friendly AI assistant named Little Helper. \
     You answer questions in a short, friendly way.";

#[derive(Serialize)]
pub struct GenerationRequest<'a> {
    pub model: &'a str,
    pub input: Input<'a>,
    pub parameters: Parameters,
}

#[derive(Serialize)]
pub struct Input<'a> {
    pub messages: [Message<'a>; 2],
}

#[derive(Serialize)]
pub struct Message<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Serialize)]
pub struct Parameters {
    pub result_format: &'static str,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub seed: u32,
    pub max_tokens: u32,
    pub stop: Vec<String>,
    pub repetition_penalty: f32,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            result_format: "message",
            temperature: 0.7,
            top_p: 0.8,
            top_k: 50,
            seed: 1234,
            max_tokens: 1500,
            stop: Vec::new(),
            repetition_penalty: 1.1,
        }
    }
}

#[derive(Deserialize)]
pub struct GenerationResponse {
    pub output: Option<Output>,
}

#[derive(Deserialize)]
pub struct Output {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Deserialize)]
pub struct Choice {
    pub message: Option<ChoiceMessage>,
    pub text: Option<String>,
}

#[derive(Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}
