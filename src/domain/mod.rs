//! Domain layer - Core business entities and logic
//!
//! This module contains the core domain models that represent
//! business concepts independent of infrastructure concerns.
//!
//! Contains: Entities, Value Objects, and the authorization guard.

pub mod access;
pub mod identity;
pub mod password;
pub mod post;
pub mod user;

pub use access::{ensure_owner_or_admin, is_owner_or_admin, require_admin, require_role, Owned};
pub use identity::Identity;
pub use password::Password;
pub use post::{Comment, NewComment, NewPost, Post, PostChanges};
pub use user::{normalize_email, Credential, NewUser, User, UserChanges, UserResponse, UserRole};
