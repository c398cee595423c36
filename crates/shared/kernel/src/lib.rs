//! Kernel utilities shared across slices.
//! Keep this crate lightweight; it re-exports ergonomic helpers for config loading and
//! for handling untrusted text (HTML escaping, slugs, URI component decoding).
//!
//! ## Escaping
//! ```rust
//! # use forum_kernel::security::escape_html;
//! assert_eq!(escape_html("<b>\"hi\"</b>"), "&lt;b&gt;&quot;hi&quot;&lt;&#x2F;b&gt;");
//! ```
//!
//! ## Config loading
//! ```rust,ignore
//! use forum_kernel::config::load_config;
//! let cfg: forum_kernel::domain::config::ForumConfig = load_config(Some("forum"))?;
//! ```
pub mod config;
pub mod security;
#[cfg(feature = "server")]
pub mod server;
pub mod text;

pub use forum_domain as domain;
