pub const DEFAULT_ROUNDS: &str = "10";
pub const DEFAULT_INTERVAL: &str = "100ms";
pub const DEFAULT_TIMEOUT: &str = "30s";
pub const DEFAULT_OUTPUT_DIR: &str = "./output";
pub const DEFAULT_PATH: &str = "/";
