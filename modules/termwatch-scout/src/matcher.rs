use termwatch_common::Watchlist;

/// True iff at least one token is an exact member of the watchlist.
/// No substring matching, no stemming. Tokens are expected to already be
/// lowercased by the caller.
pub fn matches(tokens: &[String], watchlist: &Watchlist) -> bool {
    tokens.iter().any(|token| watchlist.contains(token))
}
