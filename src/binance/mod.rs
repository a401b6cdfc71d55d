// =============================================================================
// Binance — public REST market data
// =============================================================================

pub mod client;
