//! Email verification gate.
//!
//! This is a UX gate, not a security control: the code is generated locally,
//! shown straight back to the user and compared locally. Anyone reading the
//! notice can pass it. Real verification needs a server-side secret and
//! out-of-band delivery, which this crate does not provide.

use thiserror::Error;

const CODE_SPACE: u32 = 1_000_000;
// Largest multiple of CODE_SPACE that fits in u32; draws above it are
// rejected so every code is equally likely.
const ACCEPT_BELOW: u32 = (u32::MAX / CODE_SPACE) * CODE_SPACE;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("No verification code has been sent")]
    NoCodeSent,

    #[error("Invalid verification code. Please try again.")]
    CodeMismatch,
}

/// Source of six-digit codes.
pub trait CodeSource: Send {
    fn next_code(&mut self) -> String;
}

/// Uniformly random codes from 000000 to 999999.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCodes;

impl CodeSource for RandomCodes {
    fn next_code(&mut self) -> String {
        loop {
            let draw = rand::random::<u32>();
            if draw < ACCEPT_BELOW {
                return format!("{:06}", draw % CODE_SPACE);
            }
        }
    }
}

/// Verification state for one session.
#[derive(Debug, Default, Clone)]
pub struct Verification {
    code: Option<String>,
    verified: bool,
}

impl Verification {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new code for `email` and return it for display.
    ///
    /// A new code replaces any previous one.
    pub fn send_code(
        &mut self,
        email: &str,
        source: &mut dyn CodeSource,
    ) -> Result<String, VerificationError> {
        if !email.contains('@') {
            return Err(VerificationError::InvalidEmail);
        }

        let code = source.next_code();
        self.code = Some(code.clone());
        tracing::info!("Verification code issued");
        Ok(code)
    }

    /// Compare `input` with the last issued code. Exact match only.
    pub fn verify(&mut self, input: &str) -> Result<(), VerificationError> {
        let code = self.code.as_deref().ok_or(VerificationError::NoCodeSent)?;
        if input != code {
            tracing::warn!("Verification code mismatch");
            return Err(VerificationError::CodeMismatch);
        }

        self.verified = true;
        tracing::info!("Email verified");
        Ok(())
    }

    pub fn is_code_sent(&self) -> bool {
        self.code.is_some()
    }

    pub fn is_verified(&self) -> bool {
        self.verified
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out a fixed sequence of codes.
    struct ScriptedCodes(Vec<&'static str>);

    impl CodeSource for ScriptedCodes {
        fn next_code(&mut self) -> String {
            self.0.remove(0).to_string()
        }
    }

    #[test]
    fn test_random_codes_are_six_digits() {
        let mut source = RandomCodes;
        for _ in 0..200 {
            let code = source.next_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_send_requires_at_sign() {
        let mut v = Verification::new();
        let result = v.send_code("nobody.example.com", &mut RandomCodes);
        assert_eq!(result, Err(VerificationError::InvalidEmail));
        assert!(!v.is_code_sent());
    }

    #[test]
    fn test_exact_match_verifies() {
        let mut v = Verification::new();
        let code = v.send_code("a@b.c", &mut ScriptedCodes(vec!["004271"])).unwrap();
        assert_eq!(code, "004271");

        assert_eq!(v.verify("4271"), Err(VerificationError::CodeMismatch));
        assert_eq!(v.verify(" 004271"), Err(VerificationError::CodeMismatch));
        assert_eq!(v.verify("004271 "), Err(VerificationError::CodeMismatch));
        assert!(!v.is_verified());

        assert!(v.verify("004271").is_ok());
        assert!(v.is_verified());
    }

    #[test]
    fn test_verify_without_code() {
        let mut v = Verification::new();
        assert_eq!(v.verify("123456"), Err(VerificationError::NoCodeSent));
    }

    #[test]
    fn test_resend_replaces_code() {
        let mut v = Verification::new();
        let mut codes = ScriptedCodes(vec!["111111", "222222"]);
        v.send_code("a@b.c", &mut codes).unwrap();
        v.send_code("a@b.c", &mut codes).unwrap();

        assert_eq!(v.verify("111111"), Err(VerificationError::CodeMismatch));
        assert!(v.verify("222222").is_ok());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut v = Verification::new();
        v.send_code("a@b.c", &mut ScriptedCodes(vec!["123456"])).unwrap();
        v.verify("123456").unwrap();
        v.reset();
        assert!(!v.is_verified());
        assert!(!v.is_code_sent());
    }
}
