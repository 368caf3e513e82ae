use ndarray::{Array, ArrayBase, Axis, Data, Dimension};
use num_traits::Zero;
use std::ops::Add;

/// Adjust a per-period requirement so that it gives the commitment already incurred by the
/// start of each period.
///
/// Along `axis` the result is the cumulative sum shifted one period later, with the first period
/// forced to zero. A phase selected in period `m` then carries every requirement (labour already
/// worked, money already spent) of periods `0..m`, so selecting a phase late cannot avoid the
/// costs of operations that would already have happened.
///
/// ```rust
/// # use farm_rotations::allocation::increment_adjust;
/// # use ndarray::{arr1, Axis};
/// let cost = arr1(&[10.0, 20.0, 0.0, 5.0]);
/// assert_eq!(increment_adjust(&cost, Axis(0)), arr1(&[0.0, 10.0, 30.0, 30.0]));
/// ```
pub fn increment_adjust<T, S, D>(param: &ArrayBase<S, D>, axis: Axis) -> Array<T, D>
where
    T: Copy + Zero + Add<Output = T>,
    S: Data<Elem = T>,
    D: Dimension,
{
    let mut out = Array::<T, D>::zeros(param.raw_dim());
    for (mut lane_out, lane_in) in out.lanes_mut(axis).into_iter().zip(param.lanes(axis)) {
        let mut to_date = T::zero();
        for (o, v) in lane_out.iter_mut().zip(lane_in.iter()) {
            *o = to_date;
            to_date = to_date + *v;
        }
    }
    out
}

/// [`increment_adjust`] for a plain slice.
pub fn cumulative_commitment(values: &[f64]) -> Vec<f64> {
    let mut to_date = 0.0;
    values
        .iter()
        .map(|v| {
            let c = to_date;
            to_date += v;
            c
        })
        .collect()
}
