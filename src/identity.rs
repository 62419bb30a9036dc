// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Synthetic mailbox identity generation.
//!
//! Usernames follow one of four shapes:
//! - `first.last<1-999>`
//! - `first<1950-2025>`
//! - `last[_|.|]<dev|test|qa|admin>`
//! - `<user|test|qa|demo>_<1000-9999>`
//!
//! Uniqueness is not guaranteed; collisions are possible and acceptable.

use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Serialize, Serializer};
use std::fmt;
use tracing::info;

const SEPARATORS: &[&str] = &["_", ".", ""];
const ROLES: &[&str] = &["dev", "test", "qa", "admin"];
const ACCOUNT_PREFIXES: &[&str] = &["user", "test", "qa", "demo"];

const DOMAIN_WORDS: &[&str] = &["testmail", "safetest", "verifytemp", "checkmail"];
const DOMAIN_TLDS: &[&str] = &[".com", ".net", ".org", ".io"];

/// Synthesize a throwaway test domain such as `safetest.io`.
pub fn synthesize_domain(rng: &mut impl Rng) -> String {
    format!("{}{}", pick(DOMAIN_WORDS, rng), pick(DOMAIN_TLDS, rng))
}

/// A lowercase name drawn from the English faker locale, letters only.
fn first_name(rng: &mut impl Rng) -> String {
    name_part(FirstName().fake_with_rng::<String, _>(rng))
}

fn last_name(rng: &mut impl Rng) -> String {
    name_part(LastName().fake_with_rng::<String, _>(rng))
}

// Faker surnames such as "O'Keefe" carry punctuation.
fn name_part(name: String) -> String {
    name.chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn pick<'a>(items: &[&'a str], rng: &mut impl Rng) -> &'a str {
    // Every table above is non-empty.
    items.choose(rng).copied().unwrap_or_default()
}

/// A generated `username@domain` string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    username: String,
    domain: String,
}

impl Identity {
    pub fn new(username: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            domain: domain.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// The full address.
    pub fn address(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.username, self.domain)
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Username shapes the generator draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsernamePattern {
    /// `first.last<1-999>`
    FullName,
    /// `first<year>`
    FirstNameYear,
    /// `last[sep]<role>`
    LastNameRole,
    /// `<prefix>_<4 digits>`
    Account,
}

impl UsernamePattern {
    pub const ALL: [UsernamePattern; 4] = [
        UsernamePattern::FullName,
        UsernamePattern::FirstNameYear,
        UsernamePattern::LastNameRole,
        UsernamePattern::Account,
    ];

    /// Render a username of this shape.
    pub fn render(self, rng: &mut impl Rng) -> String {
        match self {
            Self::FullName => format!(
                "{}.{}{}",
                first_name(rng),
                last_name(rng),
                rng.gen_range(1..=999)
            ),
            Self::FirstNameYear => {
                format!("{}{}", first_name(rng), rng.gen_range(1950..=2025))
            }
            Self::LastNameRole => format!(
                "{}{}{}",
                last_name(rng),
                pick(SEPARATORS, rng),
                pick(ROLES, rng)
            ),
            Self::Account => format!(
                "{}_{}",
                pick(ACCOUNT_PREFIXES, rng),
                rng.gen_range(1000..=9999)
            ),
        }
    }
}

/// Generates identities for one fixed domain.
#[derive(Debug, Clone)]
pub struct IdentityGenerator {
    domain: String,
}

impl IdentityGenerator {
    /// Create a generator for `domain`.
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }

    /// Create a generator for a synthesized test domain.
    pub fn with_random_domain(rng: &mut impl Rng) -> Self {
        Self::new(synthesize_domain(rng))
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Generate a single identity.
    pub fn generate_one(&self, rng: &mut impl Rng) -> Identity {
        let pattern = UsernamePattern::ALL[rng.gen_range(0..UsernamePattern::ALL.len())];
        Identity::new(pattern.render(rng), self.domain.clone())
    }

    /// Generate `count` identities in order, logging progress every ten.
    pub fn generate(&self, count: usize, rng: &mut impl Rng) -> Vec<Identity> {
        info!(count, domain = %self.domain, "Generating test email addresses");

        let mut identities = Vec::with_capacity(count);
        for i in 0..count {
            identities.push(self.generate_one(rng));
            if (i + 1) % 10 == 0 {
                info!(generated = i + 1, count, "Generated email addresses");
            }
        }

        info!(count, "Finished generating email addresses");
        identities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    #[test]
    fn test_generate_count_and_shape() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let generator = IdentityGenerator::new("testmail.com");

        for count in [1, 9, 10, 250] {
            let identities = generator.generate(count, &mut rng);
            assert_eq!(identities.len(), count);
            for identity in &identities {
                let address = identity.address();
                assert_eq!(address.matches('@').count(), 1, "{address}");
                assert!(address.ends_with("@testmail.com"), "{address}");
                assert!(!identity.username().is_empty());
            }
        }
    }

    #[test]
    fn test_same_seed_same_identities() {
        let generator = IdentityGenerator::new("checkmail.io");
        let a = generator.generate(20, &mut ChaCha8Rng::seed_from_u64(99));
        let b = generator.generate(20, &mut ChaCha8Rng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    fn is_lower_name(name: &str) -> bool {
        !name.is_empty() && name.chars().all(|c| c.is_ascii_lowercase())
    }

    #[test]
    fn test_pattern_shapes() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..50 {
            let full = UsernamePattern::FullName.render(&mut rng);
            let (first, rest) = full.split_once('.').unwrap();
            assert!(is_lower_name(first), "{full}");
            let last = rest.trim_end_matches(|c: char| c.is_ascii_digit());
            assert!(is_lower_name(last), "{full}");
            let number: u32 = rest[last.len()..].parse().unwrap();
            assert!((1..=999).contains(&number), "{full}");

            let with_year = UsernamePattern::FirstNameYear.render(&mut rng);
            let (name, year) = with_year.split_at(with_year.len() - 4);
            assert!(is_lower_name(name), "{with_year}");
            let year: u32 = year.parse().unwrap();
            assert!((1950..=2025).contains(&year));

            let with_role = UsernamePattern::LastNameRole.render(&mut rng);
            let role = ROLES.iter().find(|r| with_role.ends_with(*r)).unwrap();
            let name = with_role[..with_role.len() - role.len()].trim_end_matches(['_', '.']);
            assert!(is_lower_name(name), "{with_role}");

            let account = UsernamePattern::Account.render(&mut rng);
            let (prefix, number) = account.split_once('_').unwrap();
            assert!(ACCOUNT_PREFIXES.contains(&prefix));
            assert_eq!(number.len(), 4);
        }
    }

    #[test]
    fn test_names_come_from_a_wide_pool() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let usernames: HashSet<String> = (0..250)
            .map(|_| UsernamePattern::LastNameRole.render(&mut rng))
            .collect();
        assert!(usernames.len() > 220, "{} unique of 250", usernames.len());

        let generator = IdentityGenerator::new("testmail.com");
        let addresses: HashSet<Identity> = generator.generate(1000, &mut rng).into_iter().collect();
        assert!(addresses.len() > 980, "{} unique of 1000", addresses.len());
    }

    #[test]
    fn test_synthesized_domain() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..20 {
            let domain = synthesize_domain(&mut rng);
            assert!(DOMAIN_WORDS.iter().any(|w| domain.starts_with(w)));
            assert!(DOMAIN_TLDS.iter().any(|t| domain.ends_with(t)));
        }
    }

    #[test]
    fn test_identity_serializes_as_address() {
        let identity = Identity::new("qa_1234", "safetest.org");
        assert_eq!(
            serde_json::to_string(&identity).unwrap(),
            "\"qa_1234@safetest.org\""
        );
    }
}
