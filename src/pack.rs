//! Greedy size-aware bin packing.

use crate::Error;

/// One output group, holding items in placement order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bin<T> {
    pub items: Vec<T>,
    /// Sum of the sizes of `items`
    pub size: u64,
}

impl<T> Default for Bin<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            size: 0,
        }
    }
}

impl<T> Bin<T> {
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Room left under `budget`, or `None` if the bin already exceeds it.
    #[inline]
    pub fn headroom(&self, budget: u64) -> Option<u64> {
        budget.checked_sub(self.size)
    }
}

/// The bin count and per-bin target chosen for a total size under a budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinPlan {
    pub total: u128,
    /// `ceil(total / budget)`, at least 1
    pub count: u128,
    /// `total / count`, rounded down
    pub target: u128,
}

impl BinPlan {
    /// # Errors
    ///
    /// * [`ZeroBudget`](Error::ZeroBudget) if `budget == 0`
    pub fn new(total: u128, budget: u64) -> Result<Self, Error> {
        if budget == 0 {
            return Err(Error::ZeroBudget);
        }
        let count = total.div_ceil(u128::from(budget)).max(1);
        Ok(Self {
            total,
            count,
            target: total / count,
        })
    }

    /// Whether an item of `size` exceeds the per-bin target.
    ///
    /// Compared exactly, as `size * count > total`.
    #[inline]
    pub fn is_oversized(&self, size: u64) -> bool {
        u128::from(size) * self.count > self.total
    }
}

/// Index of the bin with the least content, preferring lower indices.
fn least_loaded<T>(bins: &[Bin<T>]) -> usize {
    bins.iter()
        .enumerate()
        .min_by_key(|(i, b)| (b.size, *i))
        .map_or(0, |(i, _)| i)
}

/// Index of the bin whose headroom under `budget` is smallest while still fitting `size`,
/// preferring lower indices.
fn best_fit<T>(bins: &[Bin<T>], size: u64, budget: u64) -> Option<usize> {
    bins.iter()
        .enumerate()
        .filter_map(|(i, b)| Some((b.headroom(budget).filter(|&room| room >= size)?, i)))
        .min()
        .map(|(_, i)| i)
}

/// Distribute sized items into bins of roughly `budget` bytes each.
///
/// Items are placed largest first (ties kept in input order). An item larger than the per-bin
/// target goes alone into the least-loaded bin; any other item goes into the fullest bin that
/// can still take it without passing `budget`, or into the least-loaded bin if none can. Bins
/// left empty are dropped, so every returned bin holds at least one item.
///
/// `budget` is a soft limit: bins can exceed it when items do not fit anywhere.
///
/// # Errors
///
/// * [`ZeroBudget`](Error::ZeroBudget) if `budget == 0`
pub fn pack_by_budget<T>(
    items: impl IntoIterator<Item = (T, u64)>,
    budget: u64,
) -> Result<Vec<Bin<T>>, Error> {
    let mut items: Vec<(usize, T, u64)> = items
        .into_iter()
        .enumerate()
        .map(|(i, (item, size))| (i, item, size))
        .collect();
    let plan = BinPlan::new(items.iter().map(|(_, _, s)| u128::from(*s)).sum(), budget)?;
    if items.is_empty() {
        tracing::debug!("nothing to pack");
        return Ok(Vec::new());
    }

    items.sort_by(|(ia, _, sa), (ib, _, sb)| sb.cmp(sa).then(ia.cmp(ib)));

    // at most one bin per item can ever be filled; further empty bins change no placement
    let slots = usize::try_from(plan.count).map_or(items.len(), |c| c.min(items.len()));
    let mut bins: Vec<Bin<T>> = (0..slots).map(|_| Bin::default()).collect();

    for (index, item, size) in items {
        let slot = if plan.is_oversized(size) {
            let slot = least_loaded(&bins);
            tracing::trace!(index, size, slot, "placed oversized item");
            slot
        } else if let Some(slot) = best_fit(&bins, size, budget) {
            tracing::trace!(index, size, slot, "placed item");
            slot
        } else {
            let slot = least_loaded(&bins);
            tracing::warn!(
                index,
                size,
                slot,
                budget,
                "no bin has room for item; overflowing least-loaded bin"
            );
            slot
        };
        let bin = &mut bins[slot];
        bin.items.push(item);
        bin.size = bin.size.saturating_add(size);
    }

    bins.retain(|b| !b.is_empty());
    tracing::debug!(
        total = %plan.total,
        planned = %plan.count,
        target = %plan.target,
        bins = bins.len(),
        "packed items"
    );
    Ok(bins)
}
