//! Protocol Registry
//!
//! Static mapping from protocol name to its canonical set of message-type
//! tokens, plus the leading-command pattern and a short formatting exemplar
//! used when prompting the model. The registry is built once at startup and
//! is read-only afterwards.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

/// One supported protocol: its canonical command set, the pattern that
/// recognizes a command-leading line, and a short correct request sample.
pub struct ProtocolSpec {
    /// Canonical protocol name (uppercase)
    pub name: &'static str,

    /// Canonical message-type tokens
    pub commands: &'static [&'static str],

    /// Matches a line that starts with one of the protocol's commands
    command_re: Regex,

    /// A short correct sample of 3-5 client requests, used as a
    /// formatting exemplar in enrichment prompts
    pub exemplar: &'static str,
}

impl ProtocolSpec {
    fn new(name: &'static str, commands: &'static [&'static str], exemplar: &'static str) -> Self {
        let alternation = commands.join("|");
        // Command must be followed by whitespace, matching how seeds are
        // written (e.g. "USER anonymous", "DESCRIBE rtsp://...").
        let command_re = Regex::new(&format!(r"^({})\s", alternation))
            .unwrap_or_else(|e| panic!("invalid command pattern for {}: {}", name, e));
        Self {
            name,
            commands,
            command_re,
            exemplar,
        }
    }

    /// Canonical message types as an owned set.
    pub fn canonical_types(&self) -> BTreeSet<String> {
        self.commands.iter().map(|c| c.to_string()).collect()
    }

    /// Whether a line begins with one of this protocol's commands.
    pub fn is_command_line(&self, line: &str) -> bool {
        self.command_re.is_match(line)
    }
}

const FTP_COMMANDS: &[&str] = &[
    "USER", "PASS", "LIST", "RETR", "STOR", "DELE", "MKD", "RMD", "CWD", "PWD", "QUIT", "PASV",
    "PORT", "TYPE", "MODE", "STRU", "NLST", "SIZE", "MDTM", "RNFR", "RNTO", "APPE", "REST", "ABOR",
    "SYST", "STAT", "HELP", "NOOP", "SITE", "STOU", "ALLO", "ACCT", "SMNT", "REIN", "CDUP",
];

const RTSP_COMMANDS: &[&str] = &[
    "DESCRIBE",
    "SETUP",
    "PLAY",
    "PAUSE",
    "TEARDOWN",
    "OPTIONS",
    "ANNOUNCE",
    "RECORD",
    "REDIRECT",
    "GET_PARAMETER",
    "SET_PARAMETER",
];

const HTTP_COMMANDS: &[&str] = &[
    "GET", "POST", "PUT", "DELETE", "HEAD", "OPTIONS", "PATCH", "TRACE", "CONNECT",
];

const SMTP_COMMANDS: &[&str] = &[
    "HELO", "EHLO", "MAIL", "RCPT", "DATA", "RSET", "VRFY", "EXPN", "HELP", "NOOP", "QUIT",
];

const SIP_COMMANDS: &[&str] = &[
    "INVITE",
    "ACK",
    "BYE",
    "CANCEL",
    "REGISTER",
    "OPTIONS",
    "INFO",
    "PRACK",
    "UPDATE",
    "REFER",
    "SUBSCRIBE",
    "NOTIFY",
    "PUBLISH",
    "MESSAGE",
];

const FTP_EXEMPLAR: &str = "USER anonymous\r\nPASS guest\r\nSYST\r\nPWD\r\nQUIT\r\n";

const RTSP_EXEMPLAR: &str = "DESCRIBE rtsp://127.0.0.1:8554/test RTSP/1.0\r\nCSeq: 1\r\n\r\nSETUP rtsp://127.0.0.1:8554/test/track1 RTSP/1.0\r\nCSeq: 2\r\nTransport: RTP/AVP;unicast;client_port=8000-8001\r\n\r\nPLAY rtsp://127.0.0.1:8554/test RTSP/1.0\r\nCSeq: 3\r\n\r\n";

const HTTP_EXEMPLAR: &str =
    "GET /index.html HTTP/1.1\r\nHost: localhost\r\n\r\nHEAD / HTTP/1.1\r\nHost: localhost\r\n\r\n";

const SMTP_EXEMPLAR: &str = "HELO client.example.com\r\nMAIL FROM:<alice@example.com>\r\nRCPT TO:<bob@example.com>\r\nDATA\r\nQUIT\r\n";

const SIP_EXEMPLAR: &str = "REGISTER sip:example.com SIP/2.0\r\nCSeq: 1 REGISTER\r\n\r\nINVITE sip:bob@example.com SIP/2.0\r\nCSeq: 2 INVITE\r\n\r\nBYE sip:bob@example.com SIP/2.0\r\nCSeq: 3 BYE\r\n\r\n";

/// Built-in protocol table, constructed once at first use.
static REGISTRY: Lazy<Vec<ProtocolSpec>> = Lazy::new(|| {
    vec![
        ProtocolSpec::new("FTP", FTP_COMMANDS, FTP_EXEMPLAR),
        ProtocolSpec::new("RTSP", RTSP_COMMANDS, RTSP_EXEMPLAR),
        ProtocolSpec::new("HTTP", HTTP_COMMANDS, HTTP_EXEMPLAR),
        ProtocolSpec::new("SMTP", SMTP_COMMANDS, SMTP_EXEMPLAR),
        ProtocolSpec::new("SIP", SIP_COMMANDS, SIP_EXEMPLAR),
    ]
});

/// Matches any uppercase leading token followed by whitespace. Used when no
/// protocol-specific pattern is available.
pub static GENERIC_COMMAND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z_]+\s").expect("valid generic command pattern"));

/// Look up a protocol by name, case-insensitively.
pub fn lookup(name: &str) -> Option<&'static ProtocolSpec> {
    REGISTRY.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Canonical message types for a protocol. Unknown protocols yield the
/// empty set; the caller decides whether that is fatal.
pub fn canonical_types(name: &str) -> BTreeSet<String> {
    lookup(name).map(|p| p.canonical_types()).unwrap_or_default()
}

/// Names of all supported protocols.
pub fn supported() -> Vec<&'static str> {
    REGISTRY.iter().map(|p| p.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_case_insensitive() {
        assert!(lookup("ftp").is_some());
        assert!(lookup("Rtsp").is_some());
        assert!(lookup("SMTP").is_some());
        assert!(lookup("gopher").is_none());
    }

    #[test]
    fn test_unknown_protocol_yields_empty_set() {
        assert!(canonical_types("gopher").is_empty());
    }

    #[test]
    fn test_canonical_types_contains_expected_commands() {
        let rtsp = canonical_types("RTSP");
        for cmd in ["DESCRIBE", "SETUP", "PLAY", "PAUSE", "TEARDOWN"] {
            assert!(rtsp.contains(cmd), "missing {}", cmd);
        }
    }

    #[test]
    fn test_command_line_recognition() {
        let ftp = lookup("FTP").unwrap();
        assert!(ftp.is_command_line("USER anonymous"));
        assert!(ftp.is_command_line("SITE CHMOD 777 f"));
        assert!(!ftp.is_command_line("220 Service ready"));
        assert!(!ftp.is_command_line("USERNAME is not a command"));
        // Bare command with no argument and no trailing whitespace is not
        // matched; the extractor deliberately trades recall for precision.
        assert!(!ftp.is_command_line("QUIT"));
    }

    #[test]
    fn test_underscore_commands() {
        let rtsp = lookup("RTSP").unwrap();
        assert!(rtsp.is_command_line("GET_PARAMETER rtsp://x RTSP/1.0"));
    }

    #[test]
    fn test_exemplars_are_command_leading() {
        for proto in REGISTRY.iter() {
            let first = proto.exemplar.lines().next().unwrap();
            assert!(
                proto.is_command_line(first),
                "{} exemplar does not start with a command",
                proto.name
            );
        }
    }
}
