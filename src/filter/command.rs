//! Key/body command packages for text command protocols.

use crate::buffer::BufferSequence;
use crate::error::ProtocolError;
use crate::filter::resolver::PackageResolver;

/// A text command split into a dispatch key and a body.
///
/// `"ECHO hello"` resolves to key `ECHO`, body `hello`. The package
/// dispatch layer routes on the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPackage {
    /// Dispatch key, the first space-delimited token.
    pub key: String,
    /// Everything after the first space; empty if there is none.
    pub body: String,
}

/// Resolves a message body into a [`CommandPackage`].
///
/// The body must be valid UTF-8; anything else is a structural error.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandResolver;

impl PackageResolver for CommandResolver {
    type Package = CommandPackage;

    fn resolve(&mut self, body: &BufferSequence) -> Result<CommandPackage, ProtocolError> {
        let text =
            String::from_utf8(body.copy_to_vec()).map_err(|_| ProtocolError::InvalidUtf8)?;
        let (key, body) = match text.find(' ') {
            Some(at) => (text[..at].to_string(), text[at + 1..].to_string()),
            None => (text, String::new()),
        };
        Ok(CommandPackage { key, body })
    }
}
