//! `fatura-auth` — authentication boundary.
//!
//! The engine never authenticates anyone; it receives an already-validated
//! actor with roles. This crate holds the claims model, deterministic claim
//! validation, and the HS256 token decoder the HTTP middleware plugs in.

pub mod claims;
pub mod jwt;
pub mod principal;
pub mod roles;

pub use claims::{validate_claims, JwtClaims, TokenValidationError};
pub use jwt::{Hs256JwtValidator, JwtValidator};
pub use principal::PrincipalId;
pub use roles::Role;
