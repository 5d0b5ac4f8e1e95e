//! Historized account-to-symbol taxonomy.
//!
//! `AccountTaxonomy` is append-only: once `(version, account_id -> symbol)`
//! is recorded it is never modified or removed. `lookup` is a pure function
//! of `(account_id, version)` — the central determinism guarantee the rest
//! of the core leans on for warm-start pivot reuse.

use std::collections::{HashMap, HashSet};

use crate::error::TaxonomyError;

/// One account that needs a symbol as of a given `update` call.
///
/// `symbol = None` requests auto-assignment of the lowest unused ordinal in
/// the configured alphabet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountMapping {
    pub account_id: String,
    pub symbol: Option<char>,
}

impl AccountMapping {
    pub fn auto(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            symbol: None,
        }
    }

    pub fn explicit(account_id: impl Into<String>, symbol: char) -> Self {
        Self {
            account_id: account_id.into(),
            symbol: Some(symbol),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AccountTaxonomy {
    alphabet: Vec<char>,
    /// Per-account, version-ascending list of recorded symbols. Entries are
    /// only ever pushed, never mutated or removed.
    by_account: HashMap<String, Vec<(u64, char)>>,
    /// Every symbol ever assigned to any account, across all versions. A
    /// symbol is never reused once assigned, so this set only grows.
    active_symbols: HashSet<char>,
    current_version: u64,
    has_recorded_version: bool,
}

impl AccountTaxonomy {
    pub fn new(alphabet: Vec<char>) -> Self {
        Self {
            alphabet,
            by_account: HashMap::new(),
            active_symbols: HashSet::new(),
            current_version: 0,
            has_recorded_version: false,
        }
    }

    pub fn current_version(&self) -> u64 {
        self.current_version
    }

    /// The version an `update` call extending the taxonomy right now
    /// should use: the first update may use version 0, every subsequent
    /// one must move strictly forward.
    pub fn next_version(&self) -> u64 {
        if self.has_recorded_version {
            self.current_version + 1
        } else {
            0
        }
    }

    pub fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    /// Records, at `version`, symbols for every account in `mapping_delta`.
    ///
    /// The whole call is all-or-nothing: if any account in the batch cannot
    /// be assigned a symbol, no account in the batch is recorded.
    pub fn update(
        &mut self,
        mapping_delta: &[AccountMapping],
        version: u64,
    ) -> Result<(), TaxonomyError> {
        if mapping_delta.is_empty() {
            return Ok(());
        }
        if self.has_recorded_version && version < self.current_version {
            return Err(TaxonomyError::VersionRegression {
                requested: version,
                current: self.current_version,
            });
        }

        let mut taken_this_call: HashSet<char> = HashSet::new();
        let mut plan: Vec<(String, char)> = Vec::with_capacity(mapping_delta.len());

        for mapping in mapping_delta {
            let symbol = match mapping.symbol {
                Some(explicit) => {
                    if self.active_symbols.contains(&explicit) || taken_this_call.contains(&explicit)
                    {
                        return Err(TaxonomyError::TaxonomyConflict {
                            account_id: mapping.account_id.clone(),
                            version,
                        });
                    }
                    explicit
                }
                None => self
                    .next_unused_symbol(&taken_this_call)
                    .ok_or(TaxonomyError::AlphabetExhausted)?,
            };
            taken_this_call.insert(symbol);
            plan.push((mapping.account_id.clone(), symbol));
        }

        for (account_id, symbol) in plan {
            self.by_account
                .entry(account_id)
                .or_default()
                .push((version, symbol));
            self.active_symbols.insert(symbol);
        }
        self.current_version = version;
        self.has_recorded_version = true;
        Ok(())
    }

    fn next_unused_symbol(&self, taken_this_call: &HashSet<char>) -> Option<char> {
        self.alphabet
            .iter()
            .copied()
            .find(|symbol| !self.active_symbols.contains(symbol) && !taken_this_call.contains(symbol))
    }

    /// Returns the symbol recorded for `account_id` at the greatest version
    /// less than or equal to `version`.
    pub fn lookup(&self, account_id: &str, version: u64) -> Result<char, TaxonomyError> {
        let entries = self
            .by_account
            .get(account_id)
            .ok_or_else(|| TaxonomyError::UnmappedAccount(account_id.to_string()))?;

        entries
            .iter()
            .rev()
            .find(|(v, _)| *v <= version)
            .map(|(_, symbol)| *symbol)
            .ok_or_else(|| TaxonomyError::UnmappedAccount(account_id.to_string()))
    }

    pub fn is_known(&self, account_id: &str) -> bool {
        self.by_account.contains_key(account_id)
    }

    /// Concatenates `lookup(node_id, version)` over an ordered path of node
    /// ids, producing the word classified by the frozen NFA.
    pub fn path_to_string(&self, path: &[String], version: u64) -> Result<String, TaxonomyError> {
        let mut word = String::with_capacity(path.len());
        for node_id in path {
            word.push(self.lookup(node_id, version)?);
        }
        Ok(word)
    }
}
