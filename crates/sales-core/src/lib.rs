//! # Sales Core
//!
//! Foundational types shared by every Sales API crate:
//!
//! - [`errors`]: the closed request error taxonomy and the error response body
//! - [`validate`]: input validation reporting every failing field
//! - [`password`]: bcrypt hashing and comparison
//!
//! # Example
//!
//! ```ignore
//! use sales_core::{AppError, validate};
//!
//! validate::check(&new_user).map_err(AppError::fields)?;
//! let hash = sales_core::hash_password(&new_user.password)?;
//! ```

pub mod errors;
pub mod password;
pub mod validate;

// Re-export commonly used types at crate root
pub use errors::{AppError, ErrorResponse, FieldError, FieldErrors};
pub use password::{hash_password, verify_password};
