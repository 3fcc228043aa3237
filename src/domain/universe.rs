//! Ticker lists: parsing, default lists and ticker-set identity.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Target tickers ranked when none are configured.
pub const DEFAULT_TICKERS: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "AMZN", "META", "NVDA", "TSLA", // tech
    "JPM", "BAC", "WFC", "GS", "MS", // financials
    "WMT", "HD", "MCD", "NKE", "SBUX", // consumer
    "JNJ", "PFE", "UNH", "ABT", "TMO", // health care
    "BA", "CAT", "GE", "HON", "UPS", // industrials
    "XOM", "CVX", "SLB", "COP", "EOG", // energy
    "VZ", "T", "CMCSA", "DIS", "NFLX", // communication
    "BRK-B", "V", "MA", "PG", "KO",
];

/// Fallback market universe used to build the reference distribution.
pub const DEFAULT_MARKET_TICKERS: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "META", "TSLA", "BRK-B", "UNH", "XOM", "JNJ", "JPM",
    "V", "PG", "MA", "CVX", "HD", "ABBV", "MRK", "COST", "AVGO", "PEP", "TMO", "CSCO", "WMT",
    "DIS", "ABT", "ACN", "NFLX", "ADBE", "NKE", "MCD", "PM", "LIN", "TXN", "RTX", "HON", "QCOM",
    "AMGN", "IBM", "UPS", "CAT", "GS", "AXP", "SBUX", "VZ", "DE", "LMT", "BKNG", "ADI", "TJX",
    "GILD", "AMT", "ISRG", "BLK", "SYK", "CI", "CME", "REGN", "ADP", "ZTS", "CDNS", "SNPS",
    "KLAC", "FTNT", "NXPI", "APH", "FAST", "CTAS", "PAYX", "ANSS", "IDXX", "MCHP", "DXCM", "ODFL",
    "CTSH", "WDAY", "TEAM", "DDOG", "CRWD", "ZS", "NET", "OKTA", "NOW", "VEEV", "ZM", "DOCU",
];

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in ticker list")]
    EmptyToken,

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),

    #[error("ticker list is empty")]
    Empty,
}

/// Parse a comma-separated list; each entry may itself hold several
/// whitespace-separated symbols. Symbols are upper-cased.
pub fn parse_tickers(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        for symbol in trimmed.split_whitespace() {
            let ticker = symbol.to_uppercase();
            if !seen.insert(ticker.clone()) {
                return Err(UniverseError::DuplicateTicker(ticker));
            }
            tickers.push(ticker);
        }
    }

    Ok(tickers)
}

/// One symbol per line; blank lines and `#` comments are skipped and
/// repeated symbols keep their first position.
pub fn parse_ticker_file(content: &str) -> Result<Vec<String>, UniverseError> {
    let mut seen = HashSet::new();
    let tickers: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_uppercase)
        .filter(|t| seen.insert(t.clone()))
        .collect();

    if tickers.is_empty() {
        return Err(UniverseError::Empty);
    }
    Ok(tickers)
}

pub fn default_tickers() -> Vec<String> {
    DEFAULT_TICKERS.iter().map(|t| t.to_string()).collect()
}

pub fn default_market_tickers() -> Vec<String> {
    DEFAULT_MARKET_TICKERS.iter().map(|t| t.to_string()).collect()
}

/// Order-insensitive identity of a ticker universe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TickerSet(BTreeSet<String>);

impl TickerSet {
    pub fn new<I, S>(tickers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            tickers
                .into_iter()
                .map(|t| t.as_ref().trim().to_uppercase())
                .filter(|t| !t.is_empty())
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.0.contains(ticker)
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tickers_basic() {
        let result = parse_tickers("AAPL,MSFT,NVDA").unwrap();
        assert_eq!(result, vec!["AAPL", "MSFT", "NVDA"]);
    }

    #[test]
    fn parse_tickers_with_whitespace() {
        let result = parse_tickers("  aapl , msft ,nvda").unwrap();
        assert_eq!(result, vec!["AAPL", "MSFT", "NVDA"]);
    }

    #[test]
    fn parse_tickers_space_separated() {
        let result = parse_tickers("AAPL MSFT  GOOGL").unwrap();
        assert_eq!(result, vec!["AAPL", "MSFT", "GOOGL"]);
    }

    #[test]
    fn parse_tickers_empty_token() {
        assert!(matches!(
            parse_tickers("AAPL,,MSFT"),
            Err(UniverseError::EmptyToken)
        ));
    }

    #[test]
    fn parse_tickers_duplicate() {
        let result = parse_tickers("AAPL,MSFT,aapl");
        assert!(matches!(result, Err(UniverseError::DuplicateTicker(s)) if s == "AAPL"));
    }

    #[test]
    fn ticker_file_skips_comments_and_blanks() {
        let content = "# tech\naapl\n\n  MSFT  \n# banks\nJPM\nAAPL\n";
        let result = parse_ticker_file(content).unwrap();
        assert_eq!(result, vec!["AAPL", "MSFT", "JPM"]);
    }

    #[test]
    fn ticker_file_all_comments_is_empty() {
        assert!(matches!(
            parse_ticker_file("# nothing\n\n"),
            Err(UniverseError::Empty)
        ));
    }

    #[test]
    fn default_lists_have_no_duplicates() {
        let targets: HashSet<_> = DEFAULT_TICKERS.iter().collect();
        assert_eq!(targets.len(), DEFAULT_TICKERS.len());
        let market: HashSet<_> = DEFAULT_MARKET_TICKERS.iter().collect();
        assert_eq!(market.len(), DEFAULT_MARKET_TICKERS.len());
    }

    #[test]
    fn ticker_set_ignores_order_and_case() {
        let a = TickerSet::new(["MSFT", "aapl", "NVDA"]);
        let b = TickerSet::new(vec!["NVDA".to_string(), "AAPL".into(), "msft".into()]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
        assert!(a.contains("AAPL"));
        assert_eq!(a.to_vec(), vec!["AAPL", "MSFT", "NVDA"]);
    }

    #[test]
    fn ticker_set_differs_on_membership() {
        let a = TickerSet::new(["AAPL", "MSFT"]);
        let b = TickerSet::new(["AAPL", "MSFT", "NVDA"]);
        assert_ne!(a, b);
    }
}
