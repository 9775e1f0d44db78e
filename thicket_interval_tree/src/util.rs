// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Comparison helpers over partially ordered scalars.
//!
//! Endpoints are only required to implement [`PartialOrd`], so every
//! comparison in this crate funnels through these helpers. An incomparable
//! pair (for example a NaN endpoint) compares as neither less nor greater,
//! which keeps the tree deterministic instead of panicking mid-rotation.

use core::cmp::Ordering;

pub(crate) fn lt<T: PartialOrd>(a: T, b: T) -> bool {
    matches!(a.partial_cmp(&b), Some(Ordering::Less))
}

pub(crate) fn le<T: PartialOrd>(a: T, b: T) -> bool {
    matches!(a.partial_cmp(&b), Some(Ordering::Less | Ordering::Equal))
}

pub(crate) fn ge<T: PartialOrd>(a: T, b: T) -> bool {
    matches!(a.partial_cmp(&b), Some(Ordering::Greater | Ordering::Equal))
}

pub(crate) fn max_of<T: PartialOrd>(a: T, b: T) -> T {
    if matches!(a.partial_cmp(&b), Some(Ordering::Greater)) {
        a
    } else {
        b
    }
}
