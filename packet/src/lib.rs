//! Frame, compress and dispatch identified packets.
//!
//! A [Packet] is any [Reflect] type with a string id. A [Registry] maps ids to
//! packet types and frames packets as the id (a short string) followed by the
//! packet's payload, optionally compressed with `zstd`. A [Dispatcher] routes
//! decoded packets to handlers registered for their type.
//!
//! # Example
//!
//! ```
//! use packetwire_codec::Reflect;
//! use packetwire_packet::{Config, Dispatcher, Packet, Registry};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! #[derive(Debug, PartialEq, Reflect)]
//! struct LoginRequest {
//!     user: String,
//! }
//!
//! impl Packet for LoginRequest {}
//!
//! let mut registry = Registry::new(Config::default());
//! registry.register::<LoginRequest>().unwrap();
//! assert_eq!(LoginRequest::id(), "login_request");
//!
//! let frame = registry
//!     .write(&LoginRequest { user: "ada".into() })
//!     .unwrap();
//! let frame = registry.read(frame).unwrap();
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.on(|login: &LoginRequest, seen: &AtomicUsize| {
//!     assert_eq!(login.user, "ada");
//!     seen.fetch_add(1, Ordering::Relaxed);
//! });
//! let seen = AtomicUsize::new(0);
//! assert_eq!(dispatcher.dispatch_any(&frame, &seen), 1);
//! assert_eq!(seen.load(Ordering::Relaxed), 1);
//! ```

use packetwire_codec::Reflect;
use std::{any::type_name, borrow::Cow};

mod config;
pub use config::Config;
mod dispatcher;
pub use dispatcher::Dispatcher;
mod error;
pub use error::Error;
mod registry;
pub use registry::{Frame, Registry};

/// A type sent as an identified, self-contained frame.
pub trait Packet: Reflect + Send + Sync {
    /// The id written ahead of the payload.
    ///
    /// Defaults to the snake_case form of the type's name, so `LoginRequest`
    /// becomes `login_request`.
    fn id() -> Cow<'static, str> {
        Cow::Owned(snake_case(short_name(type_name::<Self>())))
    }
}

/// Drops the module path and generic arguments from a type name.
fn short_name(name: &str) -> &str {
    let name = name.split('<').next().unwrap_or(name);
    name.rsplit("::").next().unwrap_or(name)
}

/// Lowercases every letter, prefixing each uppercase letter after the first
/// with `_`.
fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
