//! Typed records for the server's wire JSON.

pub mod album;
pub mod asset;
pub mod job;
pub mod tag;
pub mod user;

pub use album::Album;
pub use asset::{Asset, AssetType, ExifInfo};
pub use job::{Job, JobCommand, JobCounts, JobName, QueueStatus};
pub use tag::Tag;
pub use user::User;
