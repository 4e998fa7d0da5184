use crate::error::DbResult;

use super::{Operator, Register, Tuple};

/// Re-emits each input tuple restricted to a fixed set of attribute
/// positions, in the requested order. Duplicate positions are allowed.
pub struct Projection {
    input: Box<dyn Operator>,
    attr_indexes: Vec<usize>,
    current: Tuple,
}

impl Projection {
    pub fn new(input: Box<dyn Operator>, attr_indexes: Vec<usize>) -> Self {
        Projection { input, attr_indexes, current: Vec::new() }
    }
}

impl Operator for Projection {
    fn open(&mut self) -> DbResult<()> {
        self.input.open()
    }

    fn next(&mut self) -> DbResult<bool> {
        if !self.input.next()? {
            return Ok(false);
        }
        let row = self.input.get_output();
        self.current = self.attr_indexes.iter().map(|&i| row[i]).collect();
        Ok(true)
    }

    fn close(&mut self) -> DbResult<()> {
        self.input.close()
    }

    fn get_output(&self) -> &[Register] {
        &self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::tests::{int_row, RowSource};

    #[test]
    fn projects_and_reorders_attributes() {
        let rows = vec![int_row(&[10, 20, 30])];
        let mut proj = Projection::new(Box::new(RowSource::new(rows)), vec![2, 0]);
        proj.open().unwrap();
        assert!(proj.next().unwrap());
        assert_eq!(proj.get_output(), &int_row(&[30, 10])[..]);
        assert!(!proj.next().unwrap());
    }
}
