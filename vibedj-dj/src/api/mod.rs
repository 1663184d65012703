//! HTTP API handlers for vibedj-dj

pub mod auth;
pub mod buildinfo;
pub mod health;
pub mod recommend;
pub mod sessions;
pub mod sse;

pub use auth::auth_middleware;
pub use buildinfo::get_build_info;
pub use health::health_routes;
pub use recommend::recommend;
pub use sessions::{
    create_session, delete_session, get_session, install_playlist, skip, toggle, track_ended,
    track_failed,
};
pub use sse::event_stream;
