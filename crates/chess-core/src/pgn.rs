//! PGN parsing utilities — lightweight regex-based parser.

use regex::Regex;

use crate::game_data::{GameData, GameMetadata};

/// Parse a PGN string into a GameData struct.
/// Returns None when the text contains no moves.
pub fn parse_pgn(pgn: &str) -> Option<GameData> {
    // Extract headers
    let header_re = Regex::new(r#"\[(\w+)\s+"([^"]*)"\]"#).ok()?;

    let mut white = "Unknown".to_string();
    let mut black = "Unknown".to_string();
    let mut result = "*".to_string();
    let mut date = None;
    let mut event = None;
    let mut setup = None;
    let mut fen = None;

    for cap in header_re.captures_iter(pgn) {
        let key = &cap[1];
        let value = cap[2].to_string();
        match key {
            "White" => white = value,
            "Black" => black = value,
            "Result" => result = value,
            "Date" => date = Some(value),
            "Event" => event = Some(value),
            "SetUp" => setup = Some(value),
            "FEN" => fen = Some(value),
            _ => {}
        }
    }

    // A FEN header counts unless SetUp explicitly says otherwise
    let start_fen = match setup.as_deref() {
        Some("0") => None,
        _ => fen.filter(|f| !f.trim().is_empty()),
    };

    let moves = extract_moves(pgn);
    if moves.is_empty() {
        return None;
    }

    Some(GameData {
        metadata: GameMetadata {
            white,
            black,
            result,
            date,
            event,
        },
        start_fen,
        moves,
    })
}

/// Extract SAN moves from PGN text (after removing headers, comments, variations).
pub fn extract_moves(pgn: &str) -> Vec<String> {
    // Remove headers
    let header_re = Regex::new(r"\[[^\]]*\]").unwrap();
    let no_headers = header_re.replace_all(pgn, "");

    // Remove comments (braces and rest-of-line)
    let comment_re = Regex::new(r"\{[^}]*\}|;[^\n]*").unwrap();
    let no_comments = comment_re.replace_all(&no_headers, "");

    // Remove variations, innermost first so nested lines disappear too
    let variation_re = Regex::new(r"\([^()]*\)").unwrap();
    let mut text = no_comments.into_owned();
    while variation_re.is_match(&text) {
        text = variation_re.replace_all(&text, "").into_owned();
    }

    // Extract moves
    let move_re =
        Regex::new(r"[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=[QRBN])?[+#]?|O-O-O[+#]?|O-O[+#]?")
            .unwrap();

    move_re
        .find_iter(&text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Extract a string value from a PGN header.
pub fn extract_header(pgn: &str, header_name: &str) -> Option<String> {
    let pattern = format!(r#"\[{}\s+"([^"]*)"\]"#, regex::escape(header_name));
    let re = Regex::new(&pattern).ok()?;
    let value = re.captures(pgn)?.get(1)?.as_str().to_string();
    if value.is_empty() { None } else { Some(value) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pgn_basic() {
        let pgn = r#"[White "Player1"]
[Black "Player2"]
[Result "1-0"]
[Date "2025.01.15"]

1. e4 e5 2. Nf3 Nc6 3. Bb5 1-0"#;

        let game = parse_pgn(pgn).unwrap();
        assert_eq!(game.metadata.white, "Player1");
        assert_eq!(game.metadata.black, "Player2");
        assert_eq!(game.metadata.result, "1-0");
        assert_eq!(game.moves, vec!["e4", "e5", "Nf3", "Nc6", "Bb5"]);
        assert!(game.start_fen.is_none());
    }

    #[test]
    fn test_comments_and_nested_variations_are_skipped() {
        let pgn = "1. e4 {best by test} e5 (1... c5 2. Nf3 (2. c3 d5) d6) 2. Nf3 ; rest of line Nc6\n2... Nc6 3. O-O-O+ *";
        let moves = extract_moves(pgn);
        assert_eq!(moves, vec!["e4", "e5", "Nf3", "Nc6", "O-O-O+"]);
    }

    #[test]
    fn test_fen_header_sets_start_position() {
        let pgn = r#"[SetUp "1"]
[FEN "4k3/8/8/8/8/8/4R3/4K3 w - - 0 1"]

1. Re7+ Kf8 *"#;
        let game = parse_pgn(pgn).unwrap();
        assert_eq!(
            game.start_fen.as_deref(),
            Some("4k3/8/8/8/8/8/4R3/4K3 w - - 0 1")
        );
        assert_eq!(game.moves.len(), 2);
    }

    #[test]
    fn test_empty_movetext() {
        assert!(parse_pgn("[White \"A\"]\n\n*").is_none());
    }

    #[test]
    fn test_extract_header() {
        let pgn = r#"[Event "Club Championship"]
[Site ""]"#;

        assert_eq!(extract_header(pgn, "Event").as_deref(), Some("Club Championship"));
        assert_eq!(extract_header(pgn, "Site"), None);
        assert_eq!(extract_header(pgn, "Missing"), None);
    }
}
