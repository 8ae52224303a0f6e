pub mod errors;
pub mod notice;
pub mod utils;

pub use errors::LearnError;
pub use notice::{
    Notice,
    NoticeKind,
};
