pub mod assessment;
pub mod core;
pub mod entitlement;
pub mod game;
pub mod journal;
pub mod logging;
pub mod persistence;
pub mod remote;
pub mod settings;
pub mod vocab;
pub mod wizard;

pub use crate::core::{
    LearnError,
    Notice,
    NoticeKind,
};
pub use entitlement::{
    AgeCheck,
    AuthStep,
    EntitlementOracle,
    Feature,
    Gate,
    Plan,
    Session,
    Tier,
};
pub use journal::JournalStore;
pub use persistence::{
    FileStore,
    LocalStore,
    MemoryStore,
};
pub use remote::{
    MemoryRemote,
    RemoteStore,
    RestRemote,
};
pub use settings::Settings;
