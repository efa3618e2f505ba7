/*!
    logical commands as supplied by callers, before any wire encoding.

    A [Task] pairs a command payload with the pause to respect after its
    acknowledgment. The first character of the command, its *token*, selects
    both the wire encoding ([crate::frame]) and the acknowledgment character
    the device is expected to echo back.
*/

use std::time::Duration;

use crate::Error;


/// tokens whose textual form may carry several space-separated words
///
/// the leading space is itself a valid token of this family
pub const MULTIWORD_TOKENS: &str = "cmi but";

/// one command to run against the robot: payload plus trailing pacing delay
#[derive(Clone, Debug, PartialEq)]
pub struct Task {
    pub payload: Payload,
    /// pause after the acknowledgment, before the next task may start
    pub pacing: Duration,
}

/** command payload, tagged by how the caller expressed it

    numeric payloads go through the binary/ASCII packing rules selected by
    their token; textual payloads go through the word-oriented rules (glued
    arguments, pass-through words)
*/
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    /// a single-character token followed by integer arguments
    Numeric {token: char, values: Vec<i32>},
    /// whole command words, the first one starting with the token character
    Textual {words: Vec<String>},
}

/// ordered sequence of tasks derived from one logical command
pub type TaskQueue = Vec<Task>;


impl Task {
    /// numeric command, like a joint-angle list or a skill frame
    pub fn numeric(token: char, values: impl Into<Vec<i32>>, pacing: Duration) -> Self {
        Self {payload: Payload::Numeric {token, values: values.into()}, pacing}
    }
    /// word command, like `["m", "0", "30"]`
    pub fn textual(words: impl IntoIterator<Item=impl Into<String>>, pacing: Duration) -> Self {
        Self {payload: Payload::Textual {words: words.into_iter().map(Into::into).collect()}, pacing}
    }
    /// payload-less command carried by a single word, like `"kbalance"` or `"d"`
    pub fn bare(word: impl Into<String>, pacing: Duration) -> Self {
        Self::textual([word.into()], pacing)
    }

    /// token character of this task, selecting encoding and acknowledgment
    pub fn token(&self) -> Result<char, Error> {
        match &self.payload {
            Payload::Numeric {token, ..} => Ok(*token),
            Payload::Textual {words} => words.first()
                .and_then(|word| word.chars().next())
                .ok_or(Error::MalformedTask("empty command word")),
        }
    }
}


/**
    whether a reply line acknowledges the given token.

    the line is trimmed at its first carriage-return, then compared
    case-insensitively to the token. Token `'p'` additionally accepts the
    device's `'k'` acknowledgment.
*/
pub fn ack_matches(token: char, line: &str) -> bool {
    let trimmed = line.split('\r').next().unwrap_or("");
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next()) {
        (Some(first), None) =>
            first.eq_ignore_ascii_case(&token)
            || token == 'p' && first == 'k',
        _ => false,
    }
}

/**
    split an argument glued to the command character of the first word.

    the device's console allows `"L3"` as a shorthand for `"L 3"`: a token
    immediately followed by its argument in the same word. This yields the
    word list with the glued tail inserted as a word of its own, leaving
    single-character first words untouched.
*/
pub fn split_glued_argument(words: &[String]) -> Vec<String> {
    let mut words = words.to_vec();
    if let Some(first) = words.first() {
        let mut chars = first.chars();
        if let Some(head) = chars.next() {
            let tail: String = chars.collect();
            if !tail.is_empty() {
                words[0] = head.to_string();
                words.insert(1, tail);
            }
        }
    }
    words
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn glued_argument() {
        let split = |words: &[&str]| split_glued_argument(
            &words.iter().map(|w| w.to_string()).collect::<Vec<_>>());

        assert_eq!(split(&["L3"]), ["L", "3"]);
        assert_eq!(split(&["L3", "5"]), ["L", "3", "5"]);
        assert_eq!(split(&["I", "8", "20"]), ["I", "8", "20"]);
        assert_eq!(split(&["L"]), ["L"]);
        assert!(split(&[]).is_empty());
    }

    #[test]
    fn acknowledgments() {
        assert!(ack_matches('k', "k\r\n"));
        assert!(ack_matches('k', "K\r\n"));
        assert!(ack_matches('K', "k\r"));
        assert!(ack_matches('p', "p\r\n"));
        assert!(ack_matches('p', "k\r\n"));
        assert!(!ack_matches('p', "K\r\n"));
        assert!(!ack_matches('k', "ko\r\n"));
        assert!(!ack_matches('k', "d\r\n"));
        assert!(!ack_matches('k', ""));
        // without a carriage return the terminator stays part of the line
        assert!(!ack_matches('k', "k\n"));
    }
}
