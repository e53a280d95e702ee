//! Fuzz both filter-language parsers
//!
//! Any input must come back as a tree or an error, never a panic. Accepted
//! attribute queries must also survive a pretty-print and reparse.

#![no_main]

use libfuzzer_sys::fuzz_target;
use varql::convert::Identity;
use varql::dialect::Dialect;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(tree) = varql::compile(input, &Identity) {
            let printed = varql::pretty_print(&tree);
            let reparsed = varql::compile(&printed, &Identity);
            assert_eq!(reparsed.ok(), Some(tree), "reprinted as {printed:?}");
        }
        let _ = varql::inheritance_sql(input, "inheritance_in_members", &Dialect::default());
    }
});
