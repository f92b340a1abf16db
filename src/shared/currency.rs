//! Canonical ticker symbols for the exchange's asset codes.
//!
//! Kraken still reports a number of legacy codes: fiat prefixed with `Z`
//! (`ZEUR`), older crypto prefixed with `X` (`XXBT`, `XETH`), its own `XBT`
//! for bitcoin, and `.HOLD` suffixed balances. All of them collapse to the
//! plain ticker the rest of the tooling expects.

/// Returns the canonical ticker for `symbol`, or `symbol` itself when no alias exists.
pub fn normalize_currency(symbol: &str) -> &str {
    match symbol {
        "ZEUR" | "EUR.HOLD" | "EUR.M" => "EUR",
        "ZUSD" | "USD.HOLD" | "USD.M" => "USD",
        "ZGBP" | "GBP.HOLD" => "GBP",
        "ZCAD" | "CAD.HOLD" => "CAD",
        "ZJPY" => "JPY",
        "ZAUD" | "AUD.HOLD" => "AUD",
        "ZCHF" | "CHF.HOLD" => "CHF",
        "XXBT" | "XBT" | "XBT.M" => "BTC",
        "XETH" | "ETH.F" => "ETH",
        "XLTC" => "LTC",
        "XXRP" => "XRP",
        "XXLM" => "XLM",
        "XXMR" => "XMR",
        "XZEC" => "ZEC",
        "XETC" => "ETC",
        "XREP" => "REP",
        "XMLN" => "MLN",
        "XXDG" | "XDG" => "DOGE",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fiat_aliases() {
        assert_eq!(normalize_currency("ZEUR"), "EUR");
        assert_eq!(normalize_currency("EUR.HOLD"), "EUR");
        assert_eq!(normalize_currency("ZUSD"), "USD");
    }

    #[test]
    fn test_crypto_aliases() {
        assert_eq!(normalize_currency("XXBT"), "BTC");
        assert_eq!(normalize_currency("XBT"), "BTC");
        assert_eq!(normalize_currency("XETH"), "ETH");
        assert_eq!(normalize_currency("XXDG"), "DOGE");
    }

    #[test]
    fn test_unknown_symbols_pass_through() {
        assert_eq!(normalize_currency("DOGE"), "DOGE");
        assert_eq!(normalize_currency("DOT"), "DOT");
        assert_eq!(normalize_currency(""), "");
    }
}
