use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct GameMetadata {
    pub white: String,
    pub black: String,
    pub result: String, // "1-0", "0-1", "1/2-1/2", "*"
    pub date: Option<String>,
    pub event: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameData {
    pub metadata: GameMetadata,
    /// FEN of the starting position when the game did not start from the initial array
    pub start_fen: Option<String>,
    pub moves: Vec<String>, // SAN notation
}
