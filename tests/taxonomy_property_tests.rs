//! Property-based checks for `AccountTaxonomy`'s determinism and
//! injectivity guarantees.

use std::collections::HashSet;

use flowgate_core::taxonomy::{AccountMapping, AccountTaxonomy};
use proptest::prelude::*;

fn alphabet() -> Vec<char> {
    ('a'..='z').chain('0'..='9').collect()
}

/// A handful of distinct lowercase account-id-shaped strings, each used at
/// most once per update batch so we can reason about which updates must
/// succeed.
fn distinct_account_ids(n: usize) -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec("[a-z]{3,8}", n).prop_map(|mut ids| {
        ids.sort();
        ids.dedup();
        ids
    })
}

proptest! {
    /// Repeated lookups with the same (account, version) are byte-for-byte
    /// identical.
    #[test]
    fn lookup_is_deterministic(ids in distinct_account_ids(8)) {
        let mut tax = AccountTaxonomy::new(alphabet());
        let mappings: Vec<AccountMapping> = ids.iter().cloned().map(AccountMapping::auto).collect();
        prop_assume!(tax.update(&mappings, 0).is_ok());

        for id in &ids {
            let first = tax.lookup(id, 0).unwrap();
            let second = tax.lookup(id, 0).unwrap();
            prop_assert_eq!(first, second);
        }
    }

    /// The effective mapping after any sequence of successful updates is
    /// injective on its domain.
    #[test]
    fn effective_mapping_stays_injective(
        batch_a in distinct_account_ids(5),
        batch_b in distinct_account_ids(5),
    ) {
        let mut tax = AccountTaxonomy::new(alphabet());
        let mappings_a: Vec<AccountMapping> = batch_a.iter().cloned().map(AccountMapping::auto).collect();
        let mappings_b: Vec<AccountMapping> = batch_b.iter().cloned().map(AccountMapping::auto).collect();

        prop_assume!(tax.update(&mappings_a, 0).is_ok());
        prop_assume!(tax.update(&mappings_b, 1).is_ok());

        let mut all_ids: Vec<String> = batch_a.into_iter().chain(batch_b).collect();
        all_ids.sort();
        all_ids.dedup();

        let symbols: Vec<char> = all_ids.iter().map(|id| tax.lookup(id, 1).unwrap()).collect();
        let distinct: HashSet<char> = symbols.iter().copied().collect();
        prop_assert_eq!(symbols.len(), distinct.len());
    }

    /// Round-trip law: `update(&[], v)` never changes `current_version`.
    #[test]
    fn empty_update_is_a_no_op(seed_version in 0u64..1000) {
        let mut tax = AccountTaxonomy::new(alphabet());
        tax.update(&[AccountMapping::auto("alice")], seed_version).unwrap();
        let before = tax.current_version();
        tax.update(&[], seed_version + 50).unwrap();
        prop_assert_eq!(tax.current_version(), before);
    }

    /// `path_to_string` is a pure function of (path, version): calling it
    /// twice with the same arguments gives the same word.
    #[test]
    fn path_to_string_is_deterministic(ids in distinct_account_ids(4)) {
        let mut tax = AccountTaxonomy::new(alphabet());
        let mappings: Vec<AccountMapping> = ids.iter().cloned().map(AccountMapping::auto).collect();
        prop_assume!(tax.update(&mappings, 0).is_ok());

        let first = tax.path_to_string(&ids, 0).unwrap();
        let second = tax.path_to_string(&ids, 0).unwrap();
        prop_assert_eq!(first, second);
    }
}
