use std::cmp::Ordering;

use crate::error::DbResult;

use super::register::Char16;
use super::{Operator, Register, Tuple};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl PredicateOp {
    fn holds(self, ord: Ordering) -> bool {
        match self {
            PredicateOp::Eq => ord == Ordering::Equal,
            PredicateOp::Ne => ord != Ordering::Equal,
            PredicateOp::Lt => ord == Ordering::Less,
            PredicateOp::Le => ord != Ordering::Greater,
            PredicateOp::Gt => ord == Ordering::Greater,
            PredicateOp::Ge => ord != Ordering::Less,
        }
    }
}

/// A single select predicate, in one of the three shapes this crate
/// supports. String comparisons against a constant support equality
/// only.
pub enum Predicate {
    AttrConstInt { attr_index: usize, op: PredicateOp, constant: i64 },
    AttrConstStr { attr_index: usize, constant: Char16 },
    AttrAttr { left_index: usize, op: PredicateOp, right_index: usize },
}

impl Predicate {
    fn matches(&self, row: &[Register]) -> bool {
        match self {
            Predicate::AttrConstInt { attr_index, op, constant } => {
                op.holds(row[*attr_index].as_int().cmp(constant))
            }
            Predicate::AttrConstStr { attr_index, constant } => {
                row[*attr_index] == Register::Char16(*constant)
            }
            Predicate::AttrAttr { left_index, op, right_index } => {
                op.holds(row[*left_index].compare(&row[*right_index]))
            }
        }
    }
}

/// Filters its input by a single predicate, passing through matching
/// tuples unchanged.
pub struct Select {
    input: Box<dyn Operator>,
    predicate: Predicate,
    current: Tuple,
}

impl Select {
    pub fn new(input: Box<dyn Operator>, predicate: Predicate) -> Self {
        Select { input, predicate, current: Vec::new() }
    }
}

impl Operator for Select {
    fn open(&mut self) -> DbResult<()> {
        self.input.open()
    }

    fn next(&mut self) -> DbResult<bool> {
        while self.input.next()? {
            if self.predicate.matches(self.input.get_output()) {
                self.current = self.input.get_output().to_vec();
                return Ok(true);
            }
        }
        Ok(false)
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
    use crate::operators::tests::{int_row, str_row, RowSource};

    #[test]
    fn attr_const_int_filters_rows() {
        let rows = vec![int_row(&[1]), int_row(&[5]), int_row(&[10])];
        let pred = Predicate::AttrConstInt { attr_index: 0, op: PredicateOp::Gt, constant: 4 };
        let mut sel = Select::new(Box::new(RowSource::new(rows)), pred);
        sel.open().unwrap();
        let mut seen = Vec::new();
        while sel.next().unwrap() {
            seen.push(sel.get_output()[0].as_int());
        }
        assert_eq!(seen, vec![5, 10]);
    }

    #[test]
    fn attr_const_str_equality() {
        let rows = vec![str_row(&["alice"]), str_row(&["bob"])];
        let pred = Predicate::AttrConstStr { attr_index: 0, constant: Char16::from_str("bob") };
        let mut sel = Select::new(Box::new(RowSource::new(rows)), pred);
        sel.open().unwrap();
        assert!(sel.next().unwrap());
        assert_eq!(sel.get_output()[0].as_str().trim_end_matches('\0'), "bob");
        assert!(!sel.next().unwrap());
    }

    #[test]
    fn attr_attr_comparison() {
        let rows = vec![int_row(&[1, 1]), int_row(&[2, 3])];
        let pred = Predicate::AttrAttr { left_index: 0, op: PredicateOp::Eq, right_index: 1 };
        let mut sel = Select::new(Box::new(RowSource::new(rows)), pred);
        sel.open().unwrap();
        assert!(sel.next().unwrap());
        assert_eq!(sel.get_output(), &int_row(&[1, 1])[..]);
        assert!(!sel.next().unwrap());
    }
}
