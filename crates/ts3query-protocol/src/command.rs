//! Typed commands and their wire encoding.

use std::fmt;

use crate::codec::Value;

/// Encodes a command line.
///
/// The verb comes first, then `-name` for every flag that is set, then
/// `key=value` for every argument that is present. Arguments set to `None`
/// and flags set to `false` contribute nothing. The line ends with a single
/// `\n`.
pub fn encode_command(verb: &str, flags: &[(&str, bool)], args: &[(&str, Option<Value>)]) -> Vec<u8> {
    let mut line = String::from(verb);
    for (name, _) in flags.iter().filter(|(_, set)| *set) {
        line.push_str(" -");
        line.push_str(name);
    }
    for (key, value) in args {
        if let Some(value) = value {
            line.push(' ');
            line.push_str(key);
            line.push('=');
            line.push_str(&value.to_wire());
        }
    }
    line.push('\n');
    line.into_bytes()
}

/// An immutable ServerQuery command.
///
/// The wire bytes are computed once when the command is built. The `Debug`
/// output lists argument names only, so a `login` never leaks its password
/// into logs.
#[derive(Clone, PartialEq)]
pub struct Command {
    verb: String,
    flags: Vec<(String, bool)>,
    args: Vec<(String, Value)>,
    encoded: Vec<u8>,
}

impl Command {
    /// A command with no flags and no arguments.
    pub fn new(verb: impl Into<String>) -> Self {
        Self::builder(verb).build()
    }

    /// Starts building a command.
    pub fn builder(verb: impl Into<String>) -> CommandBuilder {
        CommandBuilder {
            verb: verb.into(),
            flags: Vec::new(),
            args: Vec::new(),
        }
    }

    pub fn verb(&self) -> &str {
        &self.verb
    }

    /// Flags in declaration order, including unset ones.
    pub fn flags(&self) -> impl Iterator<Item = (&str, bool)> {
        self.flags.iter().map(|(name, set)| (name.as_str(), *set))
    }

    /// Arguments that made it onto the wire, in declaration order.
    pub fn args(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.args.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Returns the argument value by name.
    pub fn arg(&self, key: &str) -> Option<&Value> {
        self.args.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns true if the flag is present and set.
    pub fn has_flag(&self, name: &str) -> bool {
        self.flags.iter().any(|(n, set)| n == name && *set)
    }

    /// The exact bytes written to the stream.
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("verb", &self.verb)
            .field("flags", &self.flags)
            .field("args", &self.args.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`Command`].
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    verb: String,
    flags: Vec<(String, bool)>,
    args: Vec<(String, Option<Value>)>,
}

impl CommandBuilder {
    /// Adds a flag option rendered as `-name` when `set` is true.
    pub fn flag(mut self, name: impl Into<String>, set: bool) -> Self {
        self.flags.push((name.into(), set));
        self
    }

    /// Adds an argument.
    pub fn arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.push((key.into(), Some(value.into())));
        self
    }

    /// Adds an argument that is omitted from the wire when `None`.
    pub fn arg_opt<V: Into<Value>>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.args.push((key.into(), value.map(Into::into)));
        self
    }

    /// Adds every pair of a property map in iteration order.
    pub fn args<K, V, I>(mut self, pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in pairs {
            self = self.arg(key, value);
        }
        self
    }

    pub fn build(self) -> Command {
        let flags: Vec<(&str, bool)> = self.flags.iter().map(|(n, s)| (n.as_str(), *s)).collect();
        let args: Vec<(&str, Option<Value>)> = self
            .args
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();
        let encoded = encode_command(&self.verb, &flags, &args);

        Command {
            args: self
                .args
                .into_iter()
                .filter_map(|(k, v)| v.map(|v| (k, v)))
                .collect(),
            verb: self.verb,
            flags: self.flags,
            encoded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clientmove_omits_none_arguments() {
        let bytes = encode_command(
            "clientmove",
            &[],
            &[
                ("clid", Some(Value::from(5))),
                ("cid", Some(Value::from(3))),
                ("cpw", None),
            ],
        );
        assert_eq!(bytes, b"clientmove clid=5 cid=3\n");
    }

    #[test]
    fn false_flags_leave_no_trace() {
        let bytes = encode_command("clientlist", &[("uid", true), ("away", false), ("voice", true)], &[]);
        assert_eq!(bytes, b"clientlist -uid -voice\n");
    }

    #[test]
    fn flags_precede_arguments() {
        let command = Command::builder("use")
            .arg("sid", 1)
            .flag("virtual", true)
            .build();
        assert_eq!(command.encoded(), b"use -virtual sid=1\n");
    }

    #[test]
    fn arguments_are_escaped_and_booleans_are_literal() {
        let command = Command::builder("sendtextmessage")
            .arg("targetmode", 2)
            .arg("msg", "hi there | you")
            .arg("notify", true)
            .build();
        assert_eq!(
            command.encoded(),
            b"sendtextmessage targetmode=2 msg=hi\\sthere\\s\\p\\syou notify=1\n"
        );
    }

    #[test]
    fn builder_keeps_only_present_arguments() {
        let command = Command::builder("clientmove")
            .arg("clid", 5)
            .arg_opt::<&str>("cpw", None)
            .arg_opt("cid", Some(3))
            .build();
        assert_eq!(command.args().map(|(k, _)| k).collect::<Vec<_>>(), ["clid", "cid"]);
        assert_eq!(command.arg("cid"), Some(&Value::Int(3)));
        assert!(command.arg("cpw").is_none());
    }

    #[test]
    fn bare_command() {
        let command = Command::new("version");
        assert_eq!(command.verb(), "version");
        assert_eq!(command.encoded(), b"version\n");
    }

    #[test]
    fn debug_hides_argument_values() {
        let command = Command::builder("login")
            .arg("client_login_name", "serveradmin")
            .arg("client_login_password", "hunter2")
            .build();
        let debug = format!("{command:?}");
        assert!(debug.contains("client_login_password"));
        assert!(!debug.contains("hunter2"));
    }
}
