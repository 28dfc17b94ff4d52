use std::sync::OnceLock;

use regex::RegexSet;

/// Recognized connectivity-loss signatures from the Postgres driver, the pool,
/// and the network stack. Patterns are lowercase; messages are lowered first.
const SIGNATURES: &[&str] = &[
    r"connection reset",
    r"connection refused",
    r"connection (was )?closed",
    r"server closed the connection unexpectedly",
    r"terminating connection",
    r"could not connect to server",
    r"broken pipe",
    r"timed out",
    r"timeout expired",
    r"no connection to the server",
    r"the database system is (starting up|shutting down)",
    r"econnreset",
    r"etimedout",
    r"unexpected eof",
];

static PATTERNS: OnceLock<RegexSet> = OnceLock::new();

/// Adapter that turns human-readable driver messages into a transient/not
/// transient decision. Only the storage boundary calls this.
pub struct TransientSignatures;

impl TransientSignatures {
    fn patterns() -> &'static RegexSet {
        PATTERNS.get_or_init(|| {
            RegexSet::new(SIGNATURES).expect("transient signatures are valid regexes")
        })
    }

    /// Returns true when `message` matches one of the known connectivity-loss
    /// signatures.
    pub fn matches(message: &str) -> bool {
        Self::patterns().is_match(&message.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_known_signatures() {
        assert!(TransientSignatures::matches(
            "server closed the connection unexpectedly\n\tThis probably means the server terminated abnormally"
        ));
        assert!(TransientSignatures::matches("Connection reset by peer (os error 104)"));
        assert!(TransientSignatures::matches(
            "FATAL: terminating connection due to administrator command"
        ));
        assert!(TransientSignatures::matches("Timed out in bb8"));
        assert!(TransientSignatures::matches("read ECONNRESET"));
    }

    #[test]
    fn test_ignores_business_errors() {
        assert!(!TransientSignatures::matches(
            "duplicate key value violates unique constraint \"published_posts_schedule_id_key\""
        ));
        assert!(!TransientSignatures::matches("post text is empty"));
        assert!(!TransientSignatures::matches(
            "null value in column \"platform\" violates not-null constraint"
        ));
    }
}
