// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Upstream API limits, scheduler defaults, and tool identifiers

//! Constants module
//!
//! Constants are grouped by domain rather than kept in a single flat list.

/// `FoodData` Central API contract values
pub mod fdc {
    /// Production base URL
    pub const DEFAULT_BASE_URL: &str = "https://api.nal.usda.gov/fdc/v1";
    /// Query parameter carrying the access credential
    pub const API_KEY_PARAM: &str = "api_key";
    /// Largest `fdcIds` list accepted by one batch call
    pub const MAX_BATCH_IDS: usize = 20;
    /// Largest `pageSize` accepted by search and list
    pub const MAX_PAGE_SIZE: u32 = 200;
    /// Dataset classification subject to the strict macro policy
    pub const FOUNDATION_DATA_TYPE: &str = "Foundation";
    /// Service name used in logs and error messages
    pub const SERVICE_NAME: &str = "USDA FoodData Central";
}

/// Request scheduling and retry defaults
pub mod limits {
    /// Concurrent upstream calls
    pub const DEFAULT_MAX_CONCURRENT: usize = 1;
    /// Minimum spacing between two dispatches
    pub const DEFAULT_MIN_INTERVAL_MS: u64 = 400;
    /// Retries after the first attempt
    pub const DEFAULT_MAX_RETRIES: u32 = 2;
    /// Backoff base delay
    pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 750;
    /// Wall-clock timeout for one transport attempt
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
    /// Lower bound of the backoff jitter factor (inclusive)
    pub const JITTER_MIN: f64 = 0.5;
    /// Upper bound of the backoff jitter factor (exclusive)
    pub const JITTER_MAX: f64 = 1.5;
}

/// Tool identifiers that own pagination cursors
pub mod tools {
    /// Free-text food search
    pub const SEARCH_FOODS: &str = "search_foods";
    /// Filtered food listing
    pub const LIST_FOODS: &str = "list_foods";

    /// Default page size for `search_foods`
    pub const SEARCH_FOODS_DEFAULT_PAGE_SIZE: u32 = 25;
    /// Default page size for `list_foods`
    pub const LIST_FOODS_DEFAULT_PAGE_SIZE: u32 = 50;
    /// Fallback for tools without a documented default
    pub const DEFAULT_PAGE_SIZE: u32 = 25;

    /// Documented default page size for a tool
    #[must_use]
    pub fn default_page_size(tool_name: &str) -> u32 {
        match tool_name {
            SEARCH_FOODS => SEARCH_FOODS_DEFAULT_PAGE_SIZE,
            LIST_FOODS => LIST_FOODS_DEFAULT_PAGE_SIZE,
            _ => DEFAULT_PAGE_SIZE,
        }
    }
}

/// Service names for structured logging
pub mod service_names {
    /// Gateway service name
    pub const FOODDATA_MCP_SERVER: &str = "fooddata-mcp-server";
}
