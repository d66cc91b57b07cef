use rocket::data::ByteUnit;

const DEFAULT_MAX_BYTES: u64 = 2 * 1024 * 1024;

/// Upload limits for the bulk user import endpoint.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub max_bytes: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

impl ImportConfig {
    pub fn from_env() -> Self {
        let max_bytes = std::env::var("COACH_IMPORT_MAX_BYTES")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_MAX_BYTES);
        Self { max_bytes }
    }

    pub fn limit(&self) -> ByteUnit {
        ByteUnit::Byte(self.max_bytes)
    }
}
