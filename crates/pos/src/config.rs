//! Till configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use printer::StoreIdentity;

use crate::scan::DEFAULT_SCAN_GAP;

/// Till configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `POS_PRINT_SERVICE_URL` — print service base URL (default: `"http://localhost:5174"`)
/// - `POS_STORE_NAME`, `POS_STORE_PHONE`, `POS_STORE_ADDRESS`, `POS_THANK_YOU` — receipt header and footer
/// - `POS_SHADOW_PATH` — cart shadow file (default: `"persisted_products.json"`)
/// - `POS_SCAN_GAP_MS` — max keystroke gap inside one scan (default: `50`)
/// - `POS_PRINT_TIMEOUT_MS` — print service request timeout (default: `10000`)
#[derive(Debug, Clone)]
pub struct PosConfig {
    pub print_service_url: String,
    pub store: StoreIdentity,
    pub shadow_path: PathBuf,
    pub scan_gap: Duration,
    pub print_timeout: Duration,
}

impl PosConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let var = |name: &str, default: String| std::env::var(name).unwrap_or(default);
        let millis = |name: &str, default: Duration| {
            std::env::var(name)
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(default)
        };

        Self {
            print_service_url: var("POS_PRINT_SERVICE_URL", defaults.print_service_url),
            store: StoreIdentity {
                store_name: var("POS_STORE_NAME", defaults.store.store_name),
                phone_number: var("POS_STORE_PHONE", defaults.store.phone_number),
                address: var("POS_STORE_ADDRESS", defaults.store.address),
                thank_you_message: var("POS_THANK_YOU", defaults.store.thank_you_message),
            },
            shadow_path: std::env::var("POS_SHADOW_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.shadow_path),
            scan_gap: millis("POS_SCAN_GAP_MS", defaults.scan_gap),
            print_timeout: millis("POS_PRINT_TIMEOUT_MS", defaults.print_timeout),
        }
    }
}

impl Default for PosConfig {
    fn default() -> Self {
        Self {
            print_service_url: "http://localhost:5174".to_string(),
            store: StoreIdentity::default(),
            shadow_path: PathBuf::from("persisted_products.json"),
            scan_gap: DEFAULT_SCAN_GAP,
            print_timeout: Duration::from_secs(10),
        }
    }
}
