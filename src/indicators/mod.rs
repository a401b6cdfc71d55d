// =============================================================================
// Statistical Indicators Module
// =============================================================================
//
// Pure, side-effect-free rolling statistics over plain `f64` slices. Rolling
// functions return one value per *full* trailing window, so output index `k`
// belongs to input index `k + window - 1`. Scalar helpers return `Option<T>`
// so callers are forced to handle insufficient-data and degenerate input.

pub mod correlation;
pub mod distribution;
pub mod entropy;
pub mod normalize;
pub mod returns;
pub mod volatility;
