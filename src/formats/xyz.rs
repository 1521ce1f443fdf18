use crate::atom::Atom;
use crate::error::TrajError;
use crate::format::{FileFormat, FrameRecord};
use crate::unit_cell::UnitCell;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek};

#[derive(Debug, Default, Clone, Copy)]
pub struct XYZFormat;

impl XYZFormat {
    fn read_atom_count(line: &str) -> Result<usize, TrajError> {
        line.trim().parse::<usize>().map_err(|e| {
            TrajError::GenericError(format!(
                "expected number of atoms, got '{}': {e}",
                line.trim()
            ))
        })
    }

    /// Extract the `Lattice="..."` value of an extended XYZ comment line
    fn lattice_from_comment(line: &str) -> Option<&str> {
        let start = line.find("Lattice=\"")? + "Lattice=\"".len();
        let length = line[start..].find('"')?;
        Some(&line[start..start + length])
    }
}

impl FileFormat for XYZFormat {
    fn read_next(&self, reader: &mut BufReader<File>) -> Result<FrameRecord, TrajError> {
        let mut line = String::new();
        let _ = reader.read_line(&mut line)?;
        let n_atoms = XYZFormat::read_atom_count(&line)?;

        line.clear();
        let _ = reader.read_line(&mut line)?;
        let mut record = FrameRecord::default();
        if let Some(lattice) = XYZFormat::lattice_from_comment(&line) {
            record.frame.unit_cell = UnitCell::parse(lattice)?;
        }

        for i in 0..n_atoms {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Err(TrajError::UnexpectedEof {
                    format: "XYZ".to_string(),
                    step: i,
                    expected: n_atoms,
                    got: i,
                });
            }
            let mut tokens = line.split_whitespace();

            let name = tokens.next().ok_or(TrajError::MissingToken)?.to_string();

            let x: f64 = tokens.next().ok_or(TrajError::MissingToken)?.parse()?;
            let y: f64 = tokens.next().ok_or(TrajError::MissingToken)?.parse()?;
            let z: f64 = tokens.next().ok_or(TrajError::MissingToken)?.parse()?;

            record.topology.add_atom(Atom::new(name));
            record.frame.add_atom([x, y, z]);
        }

        Ok(record)
    }

    fn forward(&self, reader: &mut BufReader<File>) -> Result<Option<u64>, TrajError> {
        let mut line = String::new();

        let bytes = reader.read_line(&mut line)?;
        if bytes == 0 || line.trim().is_empty() {
            return Ok(None);
        }
        let n_atoms = XYZFormat::read_atom_count(&line)?;

        for i in 0..=n_atoms {
            line.clear();
            let bytes = reader.read_line(&mut line)?;
            if bytes == 0 {
                return Err(TrajError::UnexpectedEof {
                    format: "XYZ".to_string(),
                    step: i,
                    expected: n_atoms + 2, // count line + comment line + n_atoms atom lines
                    got: i + 1,            // how many we actually read
                });
            }
        }
        Ok(Some(reader.stream_position()?))
    }
}
