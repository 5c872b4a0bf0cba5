//! Portal client library.
//!
//! SYSTEM CONTEXT
//! ==============
//! Everything a front end needs to talk to the authentication backend and the
//! portal session gateway: bearer-token storage, the auth client, an
//! authenticated fetch wrapper, the session state object, the dashboard
//! view model rendered by the CLI, and the todo task list it links to.

pub mod net;
pub mod pages;
pub mod state;
pub mod tasks;
pub mod util;

pub use net::api::{ApiError, AuthedFetch, RequestOptions};
pub use net::auth::{AuthClient, ClientError};
pub use net::portal::PortalClient;
pub use net::types::{Credentials, LoginResponse};
pub use state::session::{Navigator, Session, SessionState};
pub use state::storage::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use tasks::model::{Task, TaskError, TaskId};
pub use tasks::service::TaskService;
pub use tasks::store::{FileTaskStore, MemoryTaskStore, TaskStore};
pub use util::claims::UntrustedClaims;
