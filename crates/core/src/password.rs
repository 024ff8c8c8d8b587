//! Password strength rules for administrator credentials.

/// Minimum number of characters in a strong password.
pub const MIN_STRONG_PASSWORD_LENGTH: usize = 10;

/// Number of character classes a strong password must mix.
pub const REQUIRED_CHARACTER_CLASSES: usize = 3;

/// Which character classes appear in a password.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct CharacterClasses {
    /// Contains an ASCII lowercase letter.
    pub lowercase: bool,
    /// Contains an ASCII uppercase letter.
    pub uppercase: bool,
    /// Contains an ASCII digit.
    pub digit: bool,
    /// Contains a character that is neither a word character
    /// (`[A-Za-z0-9_]`) nor whitespace.
    pub symbol: bool,
}

impl CharacterClasses {
    /// Classify every character of `password`.
    #[must_use]
    pub fn of(password: &str) -> Self {
        password.chars().fold(Self::default(), |mut classes, c| {
            if c.is_ascii_lowercase() {
                classes.lowercase = true;
            } else if c.is_ascii_uppercase() {
                classes.uppercase = true;
            } else if c.is_ascii_digit() {
                classes.digit = true;
            } else if c != '_' && !c.is_whitespace() {
                classes.symbol = true;
            }
            classes
        })
    }

    /// Number of classes present.
    #[must_use]
    pub fn count(self) -> usize {
        [self.lowercase, self.uppercase, self.digit, self.symbol]
            .into_iter()
            .filter(|present| *present)
            .count()
    }
}

/// Returns `true` if `password` has at least [`MIN_STRONG_PASSWORD_LENGTH`]
/// characters and mixes at least [`REQUIRED_CHARACTER_CLASSES`] of
/// lowercase, uppercase, digit and symbol.
///
/// ```
/// use kori_core::password::is_strong_password;
///
/// assert!(is_strong_password("Correct-horse-42"));
/// assert!(!is_strong_password("short1A!"));
/// assert!(!is_strong_password("alllowercaseletters"));
/// ```
#[must_use]
pub fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= MIN_STRONG_PASSWORD_LENGTH
        && CharacterClasses::of(password).count() >= REQUIRED_CHARACTER_CLASSES
}
