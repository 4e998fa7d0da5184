use std::collections::HashMap;

use crate::error::DbResult;

use super::{Operator, Register, Tuple};

/// A single aggregation function over one attribute. `Count` ignores
/// its input attribute.
#[derive(Debug, Clone, Copy)]
pub enum AggrFunc {
    Min(usize),
    Max(usize),
    Sum(usize),
    Count,
}

fn compute(rows: &[&Tuple], func: AggrFunc) -> Register {
    match func {
        AggrFunc::Min(i) => rows.iter().map(|r| r[i]).min_by(|a, b| a.compare(b)).expect("non-empty group"),
        AggrFunc::Max(i) => rows.iter().map(|r| r[i]).max_by(|a, b| a.compare(b)).expect("non-empty group"),
        AggrFunc::Sum(i) => Register::from_int(rows.iter().map(|r| r[i].as_int()).sum()),
        AggrFunc::Count => Register::from_int(rows.len() as i64),
    }
}

/// A blocking group-by aggregation. With no grouping attributes it
/// emits a single output row (the aggregates over the whole input, or
/// nothing at all if the input was empty); with grouping attributes it
/// emits one row per distinct group, the group key followed by the
/// requested aggregates, in the order requested.
pub struct HashAggregation {
    input: Box<dyn Operator>,
    group_by: Vec<usize>,
    aggrs: Vec<AggrFunc>,
    rows: Vec<Tuple>,
    pos: usize,
}

impl HashAggregation {
    pub fn new(input: Box<dyn Operator>, group_by: Vec<usize>, aggrs: Vec<AggrFunc>) -> Self {
        HashAggregation { input, group_by, aggrs, rows: Vec::new(), pos: 0 }
    }

    fn group_key(&self, row: &[Register]) -> Vec<Register> {
        self.group_by.iter().map(|&i| row[i]).collect()
    }
}

impl Operator for HashAggregation {
    fn open(&mut self) -> DbResult<()> {
        self.input.open()?;
        let mut all = Vec::new();
        while self.input.next()? {
            all.push(self.input.get_output().to_vec());
        }

        self.rows.clear();
        if self.group_by.is_empty() {
            if !all.is_empty() {
                let refs: Vec<&Tuple> = all.iter().collect();
                self.rows.push(self.aggrs.iter().map(|&f| compute(&refs, f)).collect());
            }
        } else {
            let mut groups: HashMap<Vec<Register>, Vec<Tuple>> = HashMap::new();
            for row in all {
                let key = self.group_key(&row);
                groups.entry(key).or_default().push(row);
            }
            let mut keys: Vec<Vec<Register>> = groups.keys().cloned().collect();
            keys.sort_by(|a, b| {
                a.iter()
                    .zip(b.iter())
                    .map(|(x, y)| x.compare(y))
                    .find(|o| *o != std::cmp::Ordering::Equal)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            for key in keys {
                let members = &groups[&key];
                let refs: Vec<&Tuple> = members.iter().collect();
                let mut out = key.clone();
                out.extend(self.aggrs.iter().map(|&f| compute(&refs, f)));
                self.rows.push(out);
            }
        }
        self.pos = 0;
        Ok(())
    }

    fn next(&mut self) -> DbResult<bool> {
        if self.pos < self.rows.len() {
            self.pos += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn close(&mut self) -> DbResult<()> {
        self.input.close()
    }

    fn get_output(&self) -> &[Register] {
        &self.rows[self.pos - 1]
    }
}
