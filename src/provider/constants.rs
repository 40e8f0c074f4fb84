pub mod gradient {
    pub const API_BASE: &str = "https://inference.do-ai.run/v1";
    pub const CHAT_COMPLETIONS_ENDPOINT: &str = "/chat/completions";
    pub const MODEL_ACCESS_KEY_ENV_VAR: &str = "GRADIENT_MODEL_ACCESS_KEY";
    pub const BASE_URL_ENV_VAR: &str = "GRADIENT_BASE_URL";
    pub const DEFAULT_TIMEOUT_SECS: f64 = 60.0;
    pub const DEFAULT_MAX_RETRIES: u32 = 2;
    pub const DEFAULT_TEMPERATURE: f32 = 0.1;
    pub const DEFAULT_CONTEXT_WINDOW: u32 = 4096;
}
