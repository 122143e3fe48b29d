use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CrdtError {
    #[error("unknown CRDT kind: {0}")]
    UnknownCrdtKind(String),
}
