//! Frame grammar.
//!
//! Pushes and data rows start at the beginning of a line; the server ends
//! every line with `\n\r`, so the patterns run in CRLF multi-line mode where
//! `^` also matches right after a `\r`.

use std::sync::LazyLock;

use regex::Regex;
use regex::bytes::Regex as BytesRegex;

/// Banner the server writes once after accepting a connection.
pub const GREETING: &[u8] = b"TS3\n\rWelcome to the TeamSpeak 3 ServerQuery interface, type \"help\" for a list of commands and \"help <command>\" for information on a specific command.\n\r";

/// Line separator used by the server.
pub const LINE_END: &str = "\n\r";

const TERMINATOR_PATTERN: &str = r"(?mR)(?:\n\r)?^error id=(?P<id>\d+) msg=(?P<msg>\S+)(?: extra_msg=(?P<extramsg>\S+))?(?: failed_permid=(?P<failed_permid>\d+))? ?\n\r";

/// Response terminator over decoded text.
pub static TERMINATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TERMINATOR_PATTERN).expect("valid terminator regex"));

/// Response terminator over raw stream bytes.
pub static TERMINATOR_BYTES: LazyLock<BytesRegex> = LazyLock::new(|| {
    BytesRegex::new(&format!("(?-u){TERMINATOR_PATTERN}")).expect("valid terminator bytes regex")
});

/// Incoming chat line. `target` is only sent for private messages.
pub static MESSAGE_PUSH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?mR)^notifytextmessage targetmode=(?P<targetmode>\d) msg=(?P<msg>\S+)(?: target=(?P<target>\d+))? invokerid=(?P<invokerid>\d+) invokername=(?P<invokername>\S+) invokeruid=(?P<invokeruid>\S+) ?\n\r",
    )
    .expect("valid message push regex")
});

/// Any other `notify<tag>` line. The tag is classified separately.
pub static EVENT_PUSH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mR)^notify(?P<event>[a-z]+)(?: (?P<body>[^\r\n]*))?\n\r")
        .expect("valid event push regex")
});
