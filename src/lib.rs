//! itsdangerous: sign values so they can be handed to untrusted parties and
//! verified when they come back.
//!
//! Signed values use the `value.signature` and `value.timestamp.signature`
//! layouts of Python's itsdangerous, so tokens interoperate in both
//! directions given the same secret, salt and options.
//!
//! ```
//! use itsdangerous::sign::Signer;
//!
//! let signer = Signer::new("secret-key");
//! let signed = signer.sign(b"my string").unwrap();
//! assert_eq!(signed, b"my string.wh6tMHxLgJqB6oY1uT73iMlyrOA");
//! assert_eq!(signer.unsign(&signed).unwrap(), b"my string");
//! ```

pub mod algorithm;
pub mod config;
pub mod encoding;
pub mod error;
pub mod keys;
pub mod sign;
pub mod timestamp;
pub mod types;
