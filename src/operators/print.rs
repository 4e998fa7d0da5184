use std::io::Write;

use crate::error::{DbError, DbResult};

use super::Operator;

/// Pulls every tuple from its input and writes it out, comma-separated,
/// one line per tuple. A sink: it produces no tuples of its own.
pub struct Print<W: Write> {
    input: Box<dyn Operator>,
    writer: W,
}

impl<W: Write> Print<W> {
    pub fn new(input: Box<dyn Operator>, writer: W) -> Self {
        Print { input, writer }
    }
}

impl<W: Write> Operator for Print<W> {
    fn open(&mut self) -> DbResult<()> {
        self.input.open()
    }

    fn next(&mut self) -> DbResult<bool> {
        if !self.input.next()? {
            return Ok(false);
        }
        let line = self
            .input
            .get_output()
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.writer
            .write_all(line.as_bytes())
            .and_then(|_| self.writer.write_all(b"\n"))
            .map_err(DbError::Io)?;
        Ok(true)
    }

    fn close(&mut self) -> DbResult<()> {
        self.input.close()
    }

    fn get_output(&self) -> &[super::Register] {
        &[]
    }
}
