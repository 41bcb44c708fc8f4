use std::fmt;

/// Everything that can go wrong between the canvas and the ledger.
///
/// None of these are fatal: the application root turns every variant into a
/// status line and stays usable for the next action.
#[derive(Debug)]
pub enum Error {
    /// View edge length outside `1..=32` (or not a finite integer).
    InvalidViewSize(f64),
    /// A call argument that cannot be expressed on chain.
    InvalidArgument(String),
    /// The ledger answered a chunk read with the wrong number of tiles.
    ChunkLength { expected: usize, actual: usize },
    /// No injected wallet provider is available.
    WalletUnavailable,
    /// A write was attempted before `connect_wallet`.
    WalletNotConnected,
    /// The wallet rejected or failed a request.
    Wallet(String),
    /// JSON-RPC error object returned by the node.
    Rpc { code: i64, message: String },
    /// The request never produced a JSON-RPC answer.
    Transport(String),
    /// Contract interface lookup or encoding failure.
    Abi(String),
    /// Malformed data coming back from the node.
    Decode(String),
    /// A submitted transaction could not be confirmed.
    Confirmation(String),
    Json(serde_json::Error),
    Image(image::ImageError),
    Io(std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidViewSize(_) => write!(f, "Size must be 1..32"),
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Error::ChunkLength { expected, actual } => {
                write!(f, "chunk has {actual} tiles, expected {expected}")
            }
            Error::WalletUnavailable => write!(f, "Wallet not found"),
            Error::WalletNotConnected => write!(f, "Connect Wallet first"),
            Error::Wallet(msg) => write!(f, "wallet: {msg}"),
            Error::Rpc { code, message } => write!(f, "rpc error {code}: {message}"),
            Error::Transport(msg) => write!(f, "transport: {msg}"),
            Error::Abi(msg) => write!(f, "abi: {msg}"),
            Error::Decode(msg) => write!(f, "decode: {msg}"),
            Error::Confirmation(msg) => write!(f, "confirmation: {msg}"),
            Error::Json(e) => write!(f, "json: {e}"),
            Error::Image(e) => write!(f, "image: {e}"),
            Error::Io(e) => write!(f, "io: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Json(e) => Some(e),
            Error::Image(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Image(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
