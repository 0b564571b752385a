use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use rand::Rng;

/// TTL and attempt limits for one-time codes. Built from `AppConfig`
/// at startup; the store never reads the environment itself.
#[derive(Debug, Clone, Copy)]
pub struct OtpConfig {
    pub ttl: Duration,
    pub max_attempts: u32,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            max_attempts: 3,
        }
    }
}

#[derive(Debug, Clone)]
struct OtpEntry {
    code: String,
    attempts: u32,
    created_at: Instant,
}

impl OtpEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() >= ttl
    }
}

/// Outcome of a single verification attempt. Verification failures are
/// ordinary outcomes, not errors; the store never fails for well-formed
/// operation (a non-numeric submission is just a mismatch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    Success,
    NotFound,
    MaxAttemptsExceeded,
    Mismatch { attempts_left: u32 },
}

impl VerifyOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, VerifyOutcome::Success)
    }

    pub fn message(&self) -> &'static str {
        match self {
            VerifyOutcome::Success => "OTP verified successfully",
            VerifyOutcome::NotFound => "OTP expired or not found",
            VerifyOutcome::MaxAttemptsExceeded => "Maximum OTP attempts exceeded",
            VerifyOutcome::Mismatch { .. } => "Invalid OTP",
        }
    }

    pub fn attempts_left(&self) -> Option<u32> {
        match self {
            VerifyOutcome::Mismatch { attempts_left } => Some(*attempts_left),
            _ => None,
        }
    }
}

/// In-memory one-time-code cache keyed by `(identifier, purpose)`.
///
/// Records disappear on the first of: successful verification, exceeding
/// the attempt limit, or TTL expiry. Expiry is passive: an expired record
/// is treated as absent and dropped the next time its key is touched.
/// Storing again under the same key overwrites the previous code and
/// resets the attempt counter.
///
/// Owned by `AppState` and shared behind an `Arc`; the interior mutex
/// serializes racing verifications against the same key so the attempt
/// counter can neither be lost nor double-charged.
pub struct OtpStore {
    config: OtpConfig,
    entries: Mutex<HashMap<(String, String), OtpEntry>>,
}

impl OtpStore {
    pub fn new(config: OtpConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Generate a uniformly random 6-digit code (100000-999999).
    pub fn generate_code() -> String {
        let mut rng = rand::thread_rng();
        rng.gen_range(100_000..1_000_000).to_string()
    }

    pub fn store(&self, identifier: &str, purpose: &str, code: &str) {
        let mut entries = self.entries.lock().expect("otp store lock poisoned");
        entries.insert(
            (identifier.to_string(), purpose.to_string()),
            OtpEntry {
                code: code.to_string(),
                attempts: 0,
                created_at: Instant::now(),
            },
        );
    }

    /// Verify a submitted code against the stored one.
    ///
    /// Attempts are charged before the comparison, so a caller gets exactly
    /// `max_attempts` guesses per stored code. TTL expiry and the attempt
    /// limit are independent invalidation paths.
    pub fn verify(&self, identifier: &str, purpose: &str, submitted: &str) -> VerifyOutcome {
        let key = (identifier.to_string(), purpose.to_string());
        let mut entries = self.entries.lock().expect("otp store lock poisoned");

        let (expired, exhausted) = match entries.get(&key) {
            Some(entry) => (
                entry.is_expired(self.config.ttl),
                entry.attempts >= self.config.max_attempts,
            ),
            None => return VerifyOutcome::NotFound,
        };

        if expired {
            entries.remove(&key);
            return VerifyOutcome::NotFound;
        }

        if exhausted {
            entries.remove(&key);
            return VerifyOutcome::MaxAttemptsExceeded;
        }

        let (matched, attempts_left) = {
            let entry = entries.get_mut(&key).expect("entry present and checked");
            entry.attempts += 1;
            (
                entry.code == submitted,
                self.config.max_attempts - entry.attempts,
            )
        };

        if !matched {
            return VerifyOutcome::Mismatch { attempts_left };
        }

        entries.remove(&key);
        VerifyOutcome::Success
    }

    /// Explicit invalidation; a no-op when the key is absent.
    pub fn remove(&self, identifier: &str, purpose: &str) {
        let mut entries = self.entries.lock().expect("otp store lock poisoned");
        entries.remove(&(identifier.to_string(), purpose.to_string()));
    }

    /// Drop every expired record. Expiry is otherwise lazy, so a host that
    /// issues many codes that are never verified can call this to keep the
    /// table from accumulating dead entries.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock().expect("otp store lock poisoned");
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(self.config.ttl));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("otp store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(ttl: Duration, max_attempts: u32) -> OtpStore {
        OtpStore::new(OtpConfig { ttl, max_attempts })
    }

    fn default_store() -> OtpStore {
        OtpStore::new(OtpConfig::default())
    }

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..100 {
            let code = OtpStore::generate_code();
            assert_eq!(code.len(), 6);
            let value: u32 = code.parse().unwrap();
            assert!((100_000..=999_999).contains(&value));
        }
    }

    #[test]
    fn correct_code_verifies_once() {
        let store = default_store();
        store.store("+233201234567", "login", "123456");

        assert_eq!(
            store.verify("+233201234567", "login", "123456"),
            VerifyOutcome::Success
        );
        // Consumed on success.
        assert_eq!(
            store.verify("+233201234567", "login", "123456"),
            VerifyOutcome::NotFound
        );
    }

    #[test]
    fn unknown_key_is_not_found() {
        let store = default_store();
        assert_eq!(
            store.verify("+233201234567", "login", "123456"),
            VerifyOutcome::NotFound
        );
    }

    #[test]
    fn keys_are_scoped_by_purpose() {
        let store = default_store();
        store.store("+233201234567", "login", "111111");

        assert_eq!(
            store.verify("+233201234567", "signup", "111111"),
            VerifyOutcome::NotFound
        );
        assert_eq!(
            store.verify("+233201234567", "login", "111111"),
            VerifyOutcome::Success
        );
    }

    #[test]
    fn wrong_codes_count_down_then_lock_out() {
        let store = store_with(Duration::from_secs(300), 3);
        store.store("user@example.com", "login", "123456");

        assert_eq!(
            store.verify("user@example.com", "login", "000000"),
            VerifyOutcome::Mismatch { attempts_left: 2 }
        );
        assert_eq!(
            store.verify("user@example.com", "login", "000001"),
            VerifyOutcome::Mismatch { attempts_left: 1 }
        );
        assert_eq!(
            store.verify("user@example.com", "login", "000002"),
            VerifyOutcome::Mismatch { attempts_left: 0 }
        );
        // Fourth try hits the exhausted record and deletes it.
        assert_eq!(
            store.verify("user@example.com", "login", "123456"),
            VerifyOutcome::MaxAttemptsExceeded
        );
        // Record is gone after the lockout.
        assert_eq!(
            store.verify("user@example.com", "login", "123456"),
            VerifyOutcome::NotFound
        );
    }

    #[test]
    fn correct_code_on_last_attempt_still_succeeds() {
        let store = store_with(Duration::from_secs(300), 3);
        store.store("+233201234567", "signup", "654321");

        store.verify("+233201234567", "signup", "000000");
        store.verify("+233201234567", "signup", "000000");
        assert_eq!(
            store.verify("+233201234567", "signup", "654321"),
            VerifyOutcome::Success
        );
    }

    #[test]
    fn non_numeric_submission_is_just_a_mismatch() {
        let store = default_store();
        store.store("+233201234567", "login", "123456");

        assert_eq!(
            store.verify("+233201234567", "login", "not-a-code"),
            VerifyOutcome::Mismatch { attempts_left: 2 }
        );
    }

    #[test]
    fn restore_overwrites_code_and_resets_attempts() {
        let store = store_with(Duration::from_secs(300), 3);
        store.store("+233201234567", "login", "111111");
        store.verify("+233201234567", "login", "000000");
        store.verify("+233201234567", "login", "000000");

        store.store("+233201234567", "login", "222222");
        assert_eq!(
            store.verify("+233201234567", "login", "111111"),
            VerifyOutcome::Mismatch { attempts_left: 2 }
        );
        assert_eq!(
            store.verify("+233201234567", "login", "222222"),
            VerifyOutcome::Success
        );
    }

    #[test]
    fn expired_record_is_not_found() {
        let store = store_with(Duration::from_millis(30), 3);
        store.store("+233201234567", "login", "123456");

        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(
            store.verify("+233201234567", "login", "123456"),
            VerifyOutcome::NotFound
        );
        // Lazy eviction dropped the entry on that touch.
        assert!(store.is_empty());
    }

    #[test]
    fn remove_is_idempotent() {
        let store = default_store();
        store.store("+233201234567", "login", "123456");

        store.remove("+233201234567", "login");
        store.remove("+233201234567", "login");
        assert_eq!(
            store.verify("+233201234567", "login", "123456"),
            VerifyOutcome::NotFound
        );
    }

    #[test]
    fn purge_drops_only_expired_entries() {
        let store = store_with(Duration::from_millis(30), 3);
        store.store("expired@example.com", "login", "111111");
        std::thread::sleep(Duration::from_millis(60));

        // Re-arm a fresh record under a different key; only the stale one
        // should be purged.
        store.store("fresh@example.com", "login", "222222");
        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.verify("fresh@example.com", "login", "222222"),
            VerifyOutcome::Success
        );
    }

    #[test]
    fn outcome_maps_to_response_shape() {
        let outcome = VerifyOutcome::Mismatch { attempts_left: 1 };
        assert!(!outcome.is_success());
        assert_eq!(outcome.message(), "Invalid OTP");
        assert_eq!(outcome.attempts_left(), Some(1));

        assert_eq!(VerifyOutcome::Success.attempts_left(), None);
        assert_eq!(
            VerifyOutcome::NotFound.message(),
            "OTP expired or not found"
        );
    }
}
