//! # causerie-shared
//!
//! Types and pure helpers shared by every Causerie crate: the chat API data
//! model, fallback avatar assignment, mention autocomplete and the feed
//! projection used by message list renderers.

pub mod avatar;
pub mod constants;
pub mod error;
pub mod feed;
pub mod mention;
pub mod types;

pub use avatar::{FallbackAssigner, FallbackImage};
pub use error::CauserieError;
pub use types::{
    Attachment, ImageAttachment, Message, NewMessage, Participant, Reaction, ReplyReference,
    SessionInfo,
};
