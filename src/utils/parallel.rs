//! Order-preserving map that runs on rayon with the `parallel` feature.

/// Apply `f` to every item and collect results in input order.
#[cfg(feature = "parallel")]
pub fn ordered_map<T, R, F>(items: &[T], f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    use rayon::prelude::*;

    items.par_iter().map(f).collect()
}

/// Apply `f` to every item and collect results in input order.
#[cfg(not(feature = "parallel"))]
pub fn ordered_map<T, R, F>(items: &[T], f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    items.iter().map(f).collect()
}
