//! Constants Module - Single Source of Truth
//!
//! Protocol constants, chain metadata and RPC endpoint helpers. Other
//! modules import from here instead of hardcoding values.

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "DepositSentry";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for HTTP requests
pub const USER_AGENT: &str = concat!("DepositSentry/", env!("CARGO_PKG_VERSION"));

// ============================================
// RPC CONSTANTS
// ============================================

/// Default timeout for a single RPC request (seconds)
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 10;

/// Default deadline for one whole evaluation (seconds)
pub const DEFAULT_EVAL_TIMEOUT_SECS: u64 = 60;

/// Default number of attempts for retryable RPC failures
pub const DEFAULT_RPC_MAX_RETRIES: u32 = 3;

/// Base retry delay in milliseconds
pub const BASE_RETRY_MS: u64 = 250;

/// Maximum retry delay in milliseconds
pub const MAX_RETRY_MS: u64 = 4000;

/// Jitter percentage for retry delay
pub const RETRY_JITTER_PERCENT: u64 = 20;

/// Receipt lookups in flight at once when fetching a block per transaction
pub const RECEIPT_FETCH_CONCURRENCY: usize = 16;

// ============================================
// CHAIN IDS
// ============================================

/// Ethereum Mainnet, only named in wrong-network logs
pub const CHAIN_ID_ETHEREUM: u64 = 1;
/// Polygon PoS
pub const CHAIN_ID_POLYGON: u64 = 137;

/// CAIP-2 identifier of the only network Polymarket deposits are valid on
pub const EXPECTED_CHAIN: &str = "eip155:137";

// ============================================
// POLYMARKET CONSTANTS
// ============================================

/// Runtime bytecode of the Polymarket proxy wallet
pub const PROXY_WALLET_BYTECODE: &str = "0x6080604052600080546001600160a01b0316813563530ca43760e11b1415602857808252602082f35b3682833781823684845af490503d82833e806041573d82fd5b503d81f3fea264697066735822122015938e3bf2c49f5df5c1b7f9569fa85cc5d6f3074bb258a2dc0c7e299bc9e33664736f6c63430008040033";

/// First topic of the log emitted when a proxy wallet is deployed
pub const DEPLOYMENT_EVENT_TOPIC: &str =
    "0x4f51faf6c4561ff95f067657e43439f0f856d97c04d9ec9070a6199ad418e235";

/// Native USDC on Polygon
pub const USDC_ADDRESS: &str = "0x3c499c542cEF5E3811e1192ce70d8cC03d5c3359";

/// Bridged USDC.e on Polygon
pub const USDCE_ADDRESS: &str = "0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174";

// ============================================
// RPC ENDPOINTS
// ============================================

/// Get public RPC fallback URL for a chain
pub fn get_public_rpc_fallback(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        CHAIN_ID_POLYGON => Some("https://polygon-rpc.com"),
        _ => None,
    }
}

/// Get Alchemy subdomain for a chain
pub fn get_alchemy_subdomain(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        CHAIN_ID_POLYGON => Some("polygon-mainnet"),
        _ => None,
    }
}

/// Build Alchemy URL for a chain
pub fn build_alchemy_url(chain_id: u64, api_key: &str) -> Option<String> {
    get_alchemy_subdomain(chain_id)
        .map(|subdomain| format!("https://{}.g.alchemy.com/v2/{}", subdomain, api_key))
}

/// Get chain name
pub fn get_chain_name(chain_id: u64) -> &'static str {
    match chain_id {
        CHAIN_ID_ETHEREUM => "Ethereum",
        CHAIN_ID_POLYGON => "Polygon",
        _ => "Unknown",
    }
}

/// Parse a CAIP-2 `eip155:<id>` string into a numeric chain id
pub fn parse_caip2_chain_id(caip2: &str) -> Option<u64> {
    caip2.strip_prefix("eip155:")?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alchemy_url() {
        assert_eq!(
            build_alchemy_url(CHAIN_ID_POLYGON, "abc").as_deref(),
            Some("https://polygon-mainnet.g.alchemy.com/v2/abc")
        );
        assert!(build_alchemy_url(CHAIN_ID_ETHEREUM, "abc").is_none());
    }

    #[test]
    fn test_caip2_parsing() {
        assert_eq!(parse_caip2_chain_id(EXPECTED_CHAIN), Some(CHAIN_ID_POLYGON));
        assert_eq!(parse_caip2_chain_id("eip155:1"), Some(CHAIN_ID_ETHEREUM));
        assert_eq!(parse_caip2_chain_id("solana:mainnet"), None);
        assert_eq!(get_chain_name(CHAIN_ID_POLYGON), "Polygon");
    }

    #[test]
    fn test_public_fallback() {
        assert_eq!(get_public_rpc_fallback(CHAIN_ID_POLYGON), Some("https://polygon-rpc.com"));
        assert!(get_public_rpc_fallback(CHAIN_ID_ETHEREUM).is_none());
    }
}
