//! Uniform sampling without replacement.

use std::collections::HashMap;

use rand::Rng;

use crate::error::{DutyError, DutyResult};

/// Draws `k` distinct elements of `items`, every k-subset equally likely.
///
/// This is a partial Fisher-Yates shuffle: each draw picks a slot in the
/// shrinking live prefix and swaps the slot past its end. The swaps are kept
/// in a side table, so `items` itself is never touched and the extra memory is
/// proportional to `k` rather than to `items.len()`.
pub fn sample<T, R>(items: &[T], k: usize, rng: &mut R) -> DutyResult<Vec<T>>
where
    T: Clone,
    R: Rng + ?Sized,
{
    if k > items.len() {
        return Err(DutyError::InvalidArgument {
            requested: k,
            available: items.len(),
        });
    }

    let mut swapped: HashMap<usize, usize> = HashMap::with_capacity(k);
    let mut live = items.len();
    let mut picked = Vec::with_capacity(k);

    for _ in 0..k {
        let slot = rng.gen_range(0..live);
        let index = swapped.get(&slot).copied().unwrap_or(slot);
        picked.push(items[index].clone());

        live -= 1;
        let tail = swapped.get(&live).copied().unwrap_or(live);
        swapped.insert(slot, tail);
    }

    Ok(picked)
}
