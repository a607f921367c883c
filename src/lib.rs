//! modsift - mod classification and slot-conflict analysis
//!
//! Sorts character mod packages into semantic categories from the game
//! paths their manifests touch, proposes cross-package dependencies, and
//! reports slot conflicts between selected packages.

pub mod analysis;
pub mod category;
pub mod classifier;
pub mod dependency;
pub mod entry;
pub mod identity;
pub mod loader;
pub mod manifest;
pub mod paths;
pub mod provider;
pub mod selection;
pub mod session;
pub mod settings;
pub mod store;

pub use category::Category;
pub use entry::ModEntry;
pub use identity::PackageIdentity;
pub use loader::{BatchLoader, LoadOutcome, LoadProgress, LoadStage, LoaderConfig, ModLoader};
pub use selection::{SelectionState, SharedSelection};
pub use session::Session;
pub use store::CategoryStore;
