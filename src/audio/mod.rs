mod directory;
mod selector;

pub use directory::AudioDirectory;
pub use selector::{pick_index, AudioSelector, SelectionError, SelectionResult};
