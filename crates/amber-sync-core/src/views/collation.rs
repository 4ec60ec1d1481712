use std::cmp::Ordering;
use std::fmt;

use anyhow::{anyhow, Result};
use icu_collator::{Collator, CollatorOptions};
use icu_locid::Locale;

/// Locale-aware string comparison.
///
/// Built once per view computation; the underlying collator is not `Send`
/// and is not meant to be stored in shared state.
pub struct Collation {
    locale: String,
    collator: Collator,
}

impl Collation {
    pub fn new(locale: &str) -> Result<Self> {
        let parsed: Locale = locale
            .parse()
            .map_err(|e| anyhow!("Invalid locale '{}': {}", locale, e))?;
        let collator = Collator::try_new(&(&parsed).into(), CollatorOptions::new())
            .map_err(|e| anyhow!("No collation data for locale '{}': {}", locale, e))?;
        Ok(Self {
            locale: locale.to_string(),
            collator,
        })
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        self.collator.compare(a, b)
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }
}

impl fmt::Debug for Collation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collation").field("locale", &self.locale).finish()
    }
}
