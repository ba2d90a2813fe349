pub mod notifier;
pub mod posters;
pub mod registration;
pub mod worker;

pub use notifier::{LogNotifier, Notifier, WebhookNotifier};
pub use posters::{OMDB_ENDPOINT, OmdbPosters, PosterLookup};
pub use registration::{RegistrationOutcome, register_profile, unregister_profile};
pub use worker::{DiaryWatcher, PassStatus, PassSummary};
