use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeyphraseError {
    #[error("No reference key at {0}. Run `keyphrase keygen --out <PATH>` first.")]
    KeyFileNotFound(PathBuf),

    #[error("Failed to write key file atomically")]
    AtomicWriteFailed(#[source] std::io::Error),

    #[error("Reference key at {path} could not be decrypted")]
    ReferenceKeyUnreadable {
        path: PathBuf,
        #[source]
        source: crate::codec::CodecError,
    },

    #[error("No scenario matches the given filter")]
    NoScenarioSelected,

    #[error("{failed} of {total} scenarios failed")]
    ScenariosFailed { failed: usize, total: usize },
}
