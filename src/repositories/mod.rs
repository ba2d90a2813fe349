pub mod channels;
pub mod tracked;

#[cfg(test)]
pub use channels::MockChannelDirectory;
#[cfg(test)]
pub use tracked::MockCursorStore;
pub use channels::{ChannelDirectory, ServerChannelRepository};
pub use tracked::{CursorStore, TrackedProfileRepository};
