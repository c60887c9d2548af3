//! Hyperslab selection over N-dimensional data.
//!
//! A selection is a start offset, count and stride per axis plus up to three
//! display axes. The first display axis is the row axis of a 2-D view, the
//! second the column axis, the third the page axis.

use crate::error::{ObjectError, Result};
use ndarray::{ArrayD, ArrayViewD, ArrayViewMutD, IxDyn, Slice};

/// Number of display axis slots.
pub const DISPLAY_SLOTS: usize = 3;

/// Rectangular subset of an N-dimensional array.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    start: Vec<usize>,
    count: Vec<usize>,
    stride: Vec<usize>,
    display: [usize; DISPLAY_SLOTS],
}

impl Selection {
    /// Default selection over `dims`.
    pub fn new(dims: &[usize]) -> Self {
        let mut selection = Self::default();
        selection.reset(dims);
        selection
    }

    /// Restore the default selection for `dims`.
    ///
    /// Offsets start at zero with unit strides. The first three axes are
    /// displayed in natural order and selected in full; the remaining axes
    /// select a single element.
    pub fn reset(&mut self, dims: &[usize]) {
        let rank = dims.len();
        self.start = vec![0; rank];
        self.stride = vec![1; rank];
        self.count = vec![1; rank];
        self.display = [0, 1, 2];
        for (axis, &len) in dims.iter().enumerate().take(DISPLAY_SLOTS) {
            self.count[axis] = len;
        }
    }

    /// Number of axes.
    pub fn rank(&self) -> usize {
        self.start.len()
    }

    /// Start offset per axis.
    pub fn start(&self) -> &[usize] {
        &self.start
    }

    /// Mutable start offsets.
    pub fn start_mut(&mut self) -> &mut [usize] {
        &mut self.start
    }

    /// Selected element count per axis.
    pub fn count(&self) -> &[usize] {
        &self.count
    }

    /// Mutable counts.
    pub fn count_mut(&mut self) -> &mut [usize] {
        &mut self.count
    }

    /// Stride per axis.
    pub fn stride(&self) -> &[usize] {
        &self.stride
    }

    /// Mutable strides.
    pub fn stride_mut(&mut self) -> &mut [usize] {
        &mut self.stride
    }

    /// Display axes in use: the first `min(rank, 3)` slots.
    pub fn display_axes(&self) -> &[usize] {
        &self.display[..self.rank().min(DISPLAY_SLOTS)]
    }

    /// All display slots, including ones beyond the rank.
    pub fn display_slots_mut(&mut self) -> &mut [usize; DISPLAY_SLOTS] {
        &mut self.display
    }

    /// Total number of selected points.
    pub fn selected_points(&self) -> usize {
        self.count.iter().product()
    }

    /// Rows of the current 2-D view.
    pub fn height(&self) -> usize {
        match self.rank() {
            0 => 0,
            _ => self.count.get(self.display[0]).copied().unwrap_or(0),
        }
    }

    /// Columns of the current 2-D view; 1 below rank 2.
    pub fn width(&self) -> usize {
        if self.rank() < 2 {
            1
        } else {
            self.count.get(self.display[1]).copied().unwrap_or(0)
        }
    }

    /// The same selection with an extra fully selected trailing axis of `len`.
    pub fn with_trailing_axis(&self, len: usize) -> Self {
        let mut extended = self.clone();
        extended.start.push(0);
        extended.count.push(len);
        extended.stride.push(1);
        extended
    }

    /// Check the selection against `dims`.
    pub fn validate(&self, dims: &[usize]) -> Result<()> {
        if dims.len() != self.rank() || self.count.len() != self.rank() || self.stride.len() != self.rank() {
            return Err(ObjectError::InvalidSelection(format!(
                "selection has rank {} but the dataspace has rank {}",
                self.rank(),
                dims.len()
            )));
        }
        for (axis, &len) in dims.iter().enumerate() {
            let (start, count, stride) = (self.start[axis], self.count[axis], self.stride[axis]);
            if stride == 0 {
                return Err(ObjectError::InvalidSelection(format!("axis {}: stride is zero", axis)));
            }
            if count == 0 {
                if len == 0 {
                    continue;
                }
                return Err(ObjectError::InvalidSelection(format!("axis {}: count is zero", axis)));
            }
            let last = (count - 1)
                .checked_mul(stride)
                .and_then(|span| span.checked_add(start));
            match last {
                Some(last) if last < len => {}
                _ => {
                    return Err(ObjectError::InvalidSelection(format!(
                        "axis {}: start {} count {} stride {} exceeds length {}",
                        axis, start, count, stride, len
                    )))
                }
            }
        }
        let axes = self.display_axes();
        for (i, &axis) in axes.iter().enumerate() {
            if axis >= dims.len() {
                return Err(ObjectError::InvalidSelection(format!("display axis {} out of range", axis)));
            }
            if axes[..i].contains(&axis) {
                return Err(ObjectError::InvalidSelection(format!("display axis {} repeated", axis)));
            }
        }
        Ok(())
    }

    fn axis_slice(&self, axis: usize) -> Slice {
        let start = self.start[axis];
        let count = self.count[axis];
        let stride = self.stride[axis];
        let end = if count == 0 { start } else { start + (count - 1) * stride + 1 };
        Slice::new(start as isize, Some(end as isize), stride as isize)
    }

    /// Copy the selected hyperslab out of `data`.
    pub fn apply<T: Clone>(&self, data: ArrayViewD<'_, T>) -> Result<ArrayD<T>> {
        self.validate(data.shape())?;
        let view = data.slice_each_axis(|ax| self.axis_slice(ax.axis.index()));
        Ok(view.to_owned())
    }

    /// Write `values`, in row-major order, into the selected hyperslab of `target`.
    pub fn assign<T: Clone>(&self, mut target: ArrayViewMutD<'_, T>, values: &[T]) -> Result<()> {
        self.validate(target.shape())?;
        let mut view = target.slice_each_axis_mut(|ax| self.axis_slice(ax.axis.index()));
        let shape = view.shape().to_vec();
        if values.len() != view.len() {
            return Err(ObjectError::InvalidSelection(format!(
                "{} values for a selection of {} points",
                values.len(),
                view.len()
            )));
        }
        let source = ArrayViewD::from_shape(IxDyn(&shape), values)?;
        view.assign(&source);
        Ok(())
    }
}
