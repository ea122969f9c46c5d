// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.


/// Helper for converting a floating number with at most `figures` decimal
/// places to an integer scaled by `10^figures`, or a suitable error.
///
/// The result must be below `max`.
pub fn num_to_int<T>(inp: f64, figures: i32, max: u32, err: impl FnOnce(f64) -> T) -> Result<u32, T> {
    let v = inp * 10f64.powi(figures);
    if (v.round() - v).abs() < 0.0001 && v.round() >= 0. && v.round() < max as f64 {
        Ok(v.round() as u32)
    } else {
        Err(err(inp))
    }
}
