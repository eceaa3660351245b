/// Errors surfaced by the game model.
///
/// Normal gameplay outcomes (a rejected move, a bomb placement at capacity, a detonation) are
/// never reported through this type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A grid access fell outside of `[0, width) x [0, height)`.
    #[error("({x}, {y}) is outside of the {width}x{height} grid")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: usize,
        height: usize,
    },

    #[error("unrecognised intent `{0}`")]
    InvalidIntent(String),

    #[error("invalid map: {0}")]
    InvalidMap(String),

    #[error("couldn't read config: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("couldn't parse config: {0}")]
    ConfigFormat(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
