//! Classification of inbound peer text into chat or commands.

/// Literal first token that turns a message into an exchange-rate request.
pub const EXCHANGE_KEYWORD: &str = "exchange";

/// Reason attached to [`Command::Malformed`] for a non-numeric day count.
pub const NON_NUMERIC_ARGUMENT: &str = "first argument must be numeric";

/// One inbound peer message, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Free-form text to reflect to the room.
    Chat(String),
    /// Exchange-rate report for the given number of days back from today.
    Exchange(i64),
    /// An `exchange` command whose argument could not be used.
    Malformed(&'static str),
}

/// Classify `raw` without trimming or rewriting chat content.
///
/// `exchange <N>` with `N` made only of ASCII digits yields
/// [`Command::Exchange`]; values too large for `i64` saturate. Any other
/// second token yields [`Command::Malformed`]. Everything else, including a
/// bare `exchange`, is chat.
pub fn classify(raw: &str) -> Command {
    let Some(rest) = raw.strip_prefix(EXCHANGE_KEYWORD) else {
        return Command::Chat(raw.to_owned());
    };

    if !rest.starts_with(char::is_whitespace) {
        return Command::Chat(raw.to_owned());
    }

    let Some(argument) = rest.split_whitespace().next() else {
        return Command::Chat(raw.to_owned());
    };

    match parse_day_count(argument) {
        Some(days) => Command::Exchange(days),
        None => Command::Malformed(NON_NUMERIC_ARGUMENT),
    }
}

fn parse_day_count(token: &str) -> Option<i64> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(token.parse::<i64>().unwrap_or(i64::MAX))
}
