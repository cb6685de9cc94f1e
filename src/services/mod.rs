//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain logic and infrastructure to fulfill
//! application use cases. They depend on abstractions (traits) for
//! dependency inversion.
//!
//! All services use the Unit of Work pattern for centralized repository
//! access.

mod auth_service;
pub mod bootstrap;
mod comment_service;
pub mod container;
mod post_service;
pub mod token_service;
mod user_service;

// Service Container
pub use container::{ServiceContainer, Services};

// Service traits and implementations
pub use auth_service::{AuthService, AuthSession, Authenticator, Registration};
pub use bootstrap::AdminSlot;
pub use comment_service::{CommentManager, CommentService};
pub use post_service::{PostManager, PostService};
pub use token_service::{Claims, IssuedToken, TokenError, TokenService};
pub use user_service::{UserManager, UserService};
