//! Common small functions used throughout the crate
//!
//! These are left public for the convenience of the user. For example
//! prettier formatting for scientific numbers in summaries.

use std::fmt::LowerExp;

// Alias for the format! macro out of laziness
pub use std::format as f;

/// Extends primitives with more specific formatting options
pub trait NumberFmt {
    /// Better scientific number formatting
    ///
    /// The default is not very consistent for scientific in particular, so this
    /// allows easy definition.
    ///
    /// ```rust
    /// # use uxgrid::utils::NumberFmt;
    /// let number = -1.0;
    /// assert_eq!(number.sci(5, 2), "-1.00000e+00".to_string());
    /// assert_eq!((1.0).sci(5, 2), "1.00000e+00".to_string());
    /// ```
    fn sci(&self, precision: usize, exp_pad: usize) -> String;
}

impl<T: LowerExp> NumberFmt for T {
    fn sci(&self, precision: usize, exp_pad: usize) -> String {
        let mut num = f!("{:.precision$e}", &self, precision = precision);
        // always contains 'e' with LowerExp, but avoid panicking on odd impls
        let split = num.find('e').unwrap_or(num.len());
        let exp = num.split_off(split);
        // Make sure the exponent is signed
        let (sign, exp) = match exp.strip_prefix("e-") {
            Some(exp) => ('-', exp),
            None => ('+', exp.get(1..).unwrap_or("0")),
        };
        // Pad the exponent with zeros if needed and put it back on the number
        num.push_str(&f!("e{}{:0>pad$}", sign, exp, pad = exp_pad));
        num
    }
}

/// Minimum and maximum of a set of floats, if there are any
///
/// Floating-point types do not implement Ord because of NaN, so `total_cmp`
/// is used to keep the ordering well defined.
///
/// ```rust
/// # use uxgrid::utils::f64_extent;
/// let values = [2.0, -1.0, 3.0];
/// assert_eq!(f64_extent(values), Some((-1.0, 3.0)));
/// assert_eq!(f64_extent(Vec::new()), None);
/// ```
pub fn f64_extent<I: IntoIterator<Item = f64>>(values: I) -> Option<(f64, f64)> {
    values.into_iter().fold(None, |extent, v| match extent {
        None => Some((v, v)),
        Some((lo, hi)) => Some((
            if v.total_cmp(&lo).is_lt() { v } else { lo },
            if v.total_cmp(&hi).is_gt() { v } else { hi },
        )),
    })
}
