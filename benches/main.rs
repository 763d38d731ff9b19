//! Benchmarks comparing the skipdict against the Standard Library's
//! [`BTreeMap`](std::collections::BTreeMap).

#![allow(missing_docs, reason = "criterion macros")]

use criterion::{criterion_group, criterion_main};


criterion_group!(
    benches,
    crate::skipdict::insert,
    crate::skipdict::rand_access,
    crate::skipdict::remove,
    crate::skipdict::pop,
    crate::skipdict::iter,
    crate::btreemap::insert,
    crate::btreemap::rand_access,
    crate::btreemap::remove,
    crate::btreemap::iter,
);
criterion_main!(benches);
