// =============================================================================
// Shared types used across the analyzer
// =============================================================================

use serde::{Deserialize, Serialize};

/// Where daily closing prices come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSourceKind {
    /// Public Binance daily klines.
    Binance,
    /// Local JSON price cache.
    File,
}

impl Default for DataSourceKind {
    fn default() -> Self {
        Self::Binance
    }
}

impl std::fmt::Display for DataSourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Binance => write!(f, "Binance"),
            Self::File => write!(f, "File"),
        }
    }
}

impl std::str::FromStr for DataSourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binance" => Ok(Self::Binance),
            "file" => Ok(Self::File),
            other => Err(format!("unknown data source '{other}' (expected binance|file)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_source_is_case_insensitive() {
        assert_eq!("Binance".parse::<DataSourceKind>(), Ok(DataSourceKind::Binance));
        assert_eq!(" FILE ".parse::<DataSourceKind>(), Ok(DataSourceKind::File));
        assert!("yahoo".parse::<DataSourceKind>().is_err());
    }

    #[test]
    fn default_source_is_binance() {
        assert_eq!(DataSourceKind::default(), DataSourceKind::Binance);
        assert_eq!(DataSourceKind::default().to_string(), "Binance");
    }
}
