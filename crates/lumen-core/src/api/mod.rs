//! Typed facades over the wire-level [`Client`](crate::client::Client).
//! Each facade borrows the client, deserializes responses into
//! [`crate::models`] types, and adds the small amount of orchestration the
//! raw endpoints do not cover (ledger-backed uploads, find-or-create).

pub mod albums;
pub mod assets;
pub mod jobs;
pub mod server;
pub mod tags;

pub use albums::AlbumApi;
pub use assets::AssetApi;
pub use jobs::JobApi;
pub use server::ServerApi;
pub use tags::TagApi;
