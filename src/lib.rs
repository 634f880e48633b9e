pub mod atomic;
pub mod changelog;
pub mod console;
pub mod document;
pub mod error;
pub mod logging;
pub mod migration;
pub mod profile;
pub mod relocate;
pub mod settings;
pub mod store;

pub use changelog::{ChangelogNotice, ChangelogSource, FetchError, GithubChangelog};
pub use console::{AdminChoice, Console, Prompt, Unattended};
pub use document::{BuildEntry, BuildKind, DefaultProfile, Document, FormatTag};
pub use error::Error;
pub use migration::{Migrated, Migrator};
pub use settings::{ChangelogSettings, Settings};
pub use store::ProjectStore;
