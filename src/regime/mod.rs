// =============================================================================
// Regime Analysis Module
// =============================================================================
//
// Analyses built on top of the metrics table:
// - rolling correlation between normalised volatility and entropy
// - quantile threshold and high-entropy regime flags
// - histogram bin-count sensitivity of the entropy estimate

pub mod coupling;
pub mod detector;
pub mod sensitivity;

pub use coupling::{correlate, CorrelationAnalysis};
pub use detector::{detect_regimes, RegimeAnalysis};
pub use sensitivity::{bin_sensitivity, SensitivitySurface};
