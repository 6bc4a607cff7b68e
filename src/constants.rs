pub const DEFAULT_ENDPOINT: &str = "tcp://127.0.0.1:5555";
pub const DEFAULT_SOURCE_FILE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/sample_ticks.csv");
pub const INTER_TICK_DELAY_MS: u64 = 10;
pub const SUBSCRIBER_WARMUP_MS: u64 = 1_000;
