use std::ops::{Add, Div, Sub};

/// Incremental mean of a stream of values.
///
/// Updated as `mean += (x - mean) / n`, which avoids summing large numbers of
/// values before dividing.
#[derive(Debug, Clone, PartialEq)]
pub struct RunningAverage<T> {
    mean: Option<T>,
    count: usize,
}

impl<T> Default for RunningAverage<T> {
    fn default() -> Self { RunningAverage { mean: None, count: 0 } }
}

impl<T> RunningAverage<T>
where T: Copy + Add<Output=T> + Sub<Output=T> + Div<f64, Output=T>,
{
    pub fn new() -> Self { Default::default() }

    pub fn add_value(&mut self, value: T) {
        self.count += 1;
        self.mean = Some(match self.mean {
            None => value,
            Some(mean) => mean + (value - mean) / self.count as f64,
        });
    }

    /// `None` until a value has been added.
    pub fn mean(&self) -> Option<T> { self.mean }

    pub fn count(&self) -> usize { self.count }
}
