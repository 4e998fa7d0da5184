use std::collections::HashMap;

use crate::error::DbResult;

use super::{Operator, Register, Tuple};

/// A blocking equi-join: materializes both inputs, builds a hash index
/// over the left side's join attribute, then probes it with every right
/// row. Output tuples are the left row's attributes followed by the
/// right row's.
pub struct HashJoin {
    left: Box<dyn Operator>,
    right: Box<dyn Operator>,
    left_attr: usize,
    right_attr: usize,
    matches: Vec<Tuple>,
    pos: usize,
}

impl HashJoin {
    pub fn new(left: Box<dyn Operator>, right: Box<dyn Operator>, left_attr: usize, right_attr: usize) -> Self {
        HashJoin { left, right, left_attr, right_attr, matches: Vec::new(), pos: 0 }
    }
}

impl Operator for HashJoin {
    fn open(&mut self) -> DbResult<()> {
        self.left.open()?;
        self.right.open()?;

        let mut left_rows = Vec::new();
        while self.left.next()? {
            left_rows.push(self.left.get_output().to_vec());
        }

        let mut index: HashMap<Register, Vec<usize>> = HashMap::new();
        for (i, row) in left_rows.iter().enumerate() {
            index.entry(row[self.left_attr]).or_default().push(i);
        }

        self.matches.clear();
        while self.right.next()? {
            let right_row = self.right.get_output();
            if let Some(idxs) = index.get(&right_row[self.right_attr]) {
                for &li in idxs {
                    let mut combined = left_rows[li].clone();
                    combined.extend(right_row.iter().copied());
                    self.matches.push(combined);
                }
            }
        }
        self.pos = 0;
        Ok(())
    }

    fn next(&mut self) -> DbResult<bool> {
        if self.pos < self.matches.len() {
            self.pos += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn close(&mut self) -> DbResult<()> {
        self.left.close()?;
        self.right.close()
    }

    fn get_output(&self) -> &[Register] {
        &self.matches[self.pos - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::tests::{int_row, RowSource};

    #[test]
    fn joins_matching_rows_from_both_sides() {
        let left = vec![int_row(&[1, 100]), int_row(&[2, 200]), int_row(&[3, 300])];
        let right = vec![int_row(&[2, -1]), int_row(&[3, -2]), int_row(&[4, -3])];
        let mut join = HashJoin::new(Box::new(RowSource::new(left)), Box::new(RowSource::new(right)), 0, 0);
        join.open().unwrap();
        let mut seen = Vec::new();
        while join.next().unwrap() {
            let row = join.get_output();
            seen.push((row[0].as_int(), row[1].as_int(), row[2].as_int(), row[3].as_int()));
        }
        seen.sort();
        assert_eq!(seen, vec![(2, 200, 2, -1), (3, 300, 3, -2)]);
    }

    #[test]
    fn duplicate_join_keys_produce_cross_product_of_matches() {
        let left = vec![int_row(&[1, 10]), int_row(&[1, 20])];
        let right = vec![int_row(&[1, -1])];
        let mut join = HashJoin::new(Box::new(RowSource::new(left)), Box::new(RowSource::new(right)), 0, 0);
        join.open().unwrap();
        let mut count = 0;
        while join.next().unwrap() {
            count += 1;
        }
        assert_eq!(count, 2);
    }
}
