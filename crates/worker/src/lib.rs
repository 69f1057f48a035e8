//! # panelcut worker
//!
//! Message boundary around the panelcut solvers. Callers exchange plain data:
//! a tagged [`Request`] goes in, a [`Response`] of the form
//! `{ok: true, data}` or `{ok: false, error}` comes back.
//!
//! [`handle_json`] answers one JSON message synchronously; [`WorkerHandle`]
//! runs jobs on a tokio task and the blocking pool.
//!
//! ## Quick Start
//!
//! ```rust
//! use panelcut_worker::handle_json;
//!
//! let reply = handle_json(r#"{
//!     "op": "pack",
//!     "parts": [{ "id": "A", "width": 400, "height": 600 }],
//!     "config": { "seed": 1, "maxIterations": 5 }
//! }"#);
//! assert!(reply.contains(r#""ok":true"#));
//! ```

pub mod api;
pub mod types;
pub mod worker;

pub use api::{encode, handle_json, handle_json_with_cache, handle_request, handle_request_with_cache};
pub use types::{PartRequest, Request, Response, ResponseData, API_VERSION};
pub use worker::{WorkerHandle, WorkerOptions};
