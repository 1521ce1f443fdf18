use crate::atom::Atom;
use crate::error::TrajError;
use crate::format::{FileFormat, FrameRecord};
use crate::residue::{FullResidueId, Residue};
use crate::unit_cell::UnitCell;
use log::warn;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek};
use std::ops::Range;

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, PartialEq, Eq)]
pub enum Record {
    CRYST1,
    ATOM,
    HETATM,
    // Beginning of model
    MODEL,
    // End of model
    ENDMDL,
    // End of file
    END,
    // Everything else (REMARK, CONECT, TER, secondary structure...)
    IGNORED,
}

pub fn get_record(line: &str) -> Record {
    // compared as bytes, free-text records may hold any UTF-8
    let rec = line.as_bytes();

    if rec.starts_with(b"ENDMDL") {
        Record::ENDMDL
    } else if rec.starts_with(b"END") {
        Record::END
    } else if rec.starts_with(b"CRYST1") {
        Record::CRYST1
    } else if rec.starts_with(b"ATOM  ") {
        Record::ATOM
    } else if rec.starts_with(b"HETATM") {
        Record::HETATM
    } else if rec.starts_with(b"MODEL") {
        Record::MODEL
    } else {
        Record::IGNORED
    }
}

fn decode_pure(s: &str) -> Result<i64, TrajError> {
    s.chars().try_fold(0_i64, |result, c| {
        let digit = c.to_digit(36).ok_or_else(|| {
            TrajError::GenericError(format!("the value '{s}' is not a valid hybrid 36 number"))
        })?;
        Ok(result * 36 + i64::from(digit))
    })
}

fn pow_int(base: i64, power: usize) -> i64 {
    base.pow(power as u32)
}

/// Decode a hybrid-36 number of the given `width`, as used by the serial
/// and residue number fields once they overflow their decimal range.
pub(crate) fn decode_hybrid36(width: usize, field: &str) -> Result<i64, TrajError> {
    if field.len() > width {
        return Err(TrajError::GenericError(format!(
            "length of '{field}' is greater than the width '{width}'. this is a bug"
        )));
    }

    let trimmed = field.trim();
    let Some(first) = trimmed.chars().next() else {
        return Ok(0);
    };

    if first == '-' || first.is_ascii_digit() {
        return trimmed.parse::<i64>().map_err(|_| {
            TrajError::GenericError(format!("the value '{field}' is not a valid number"))
        });
    }

    let is_valid = |upper: bool| {
        trimmed.len() == width
            && trimmed.chars().all(|c| {
                c.is_ascii_digit() || (upper && c.is_ascii_uppercase())
                    || (!upper && c.is_ascii_lowercase())
            })
    };

    if first.is_ascii_uppercase() && is_valid(true) {
        return Ok(decode_pure(trimmed)? - 10 * pow_int(36, width - 1) + pow_int(10, width));
    }
    if first.is_ascii_lowercase() && is_valid(false) {
        return Ok(decode_pure(trimmed)? + 16 * pow_int(36, width - 1) + pow_int(10, width));
    }

    Err(TrajError::GenericError(format!(
        "the value '{field}' is not a valid hybrid 36 number"
    )))
}

/// Columns of `line` in `range`, or an empty string past the end of the line
fn field(line: &str, range: Range<usize>) -> &str {
    let end = range.end.min(line.len());
    line.get(range.start.min(end)..end).unwrap_or("")
}

fn parse_float(line: &str, range: Range<usize>) -> Result<f64, TrajError> {
    field(line, range)
        .trim()
        .parse::<f64>()
        .map_err(|e| TrajError::GenericError(format!("could not parse float: {e}")))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PDBFormat;

/// Residues of the model being read, keyed by their full id and kept in
/// order of first appearance.
#[derive(Default)]
struct ResidueTable {
    ids: BTreeMap<FullResidueId, usize>,
    residues: Vec<Residue>,
}

impl PDBFormat {
    const ATOM_MIN_LENGTH: usize = 54;

    fn parse_atom(
        record: &mut FrameRecord,
        residues: &mut ResidueTable,
        line: &str,
    ) -> Result<(), TrajError> {
        debug_assert!(matches!(get_record(line), Record::ATOM | Record::HETATM));
        let line = line.trim_end_matches(['\n', '\r']);
        if line.len() < Self::ATOM_MIN_LENGTH {
            return Err(TrajError::InvalidRecord {
                expected_record_type: "ATOM".to_string(),
                actual_record_type: line.to_string(),
                reason: "line too short".to_string(),
            });
        }

        let name = field(line, 12..16).trim().to_string();
        let symbol = match field(line, 76..78).trim() {
            "" => name
                .chars()
                .filter(|c| c.is_ascii_alphabetic())
                .take(1)
                .collect(),
            symbol => symbol.to_string(),
        };

        let x = parse_float(line, 30..38)?;
        let y = parse_float(line, 38..46)?;
        let z = parse_float(line, 46..54)?;
        record.topology.add_atom(Atom::with_symbol(name, symbol));
        record.frame.add_atom([x, y, z]);

        let atom_id = record.frame.size() - 1;
        let resid = match decode_hybrid36(4, field(line, 22..26)) {
            Ok(resid) => resid,
            // No residue information so return early
            Err(_) => return Ok(()),
        };

        let full_residue_id = FullResidueId {
            chain: field(line, 21..22).chars().next().unwrap_or(' '),
            resid,
            resname: field(line, 17..20).trim().to_string(),
            insertion_code: field(line, 26..27).chars().next().unwrap_or(' '),
        };

        let index = match residues.ids.get(&full_residue_id) {
            Some(&index) => index,
            None => {
                residues.residues.push(Residue::new(
                    full_residue_id.resname.clone(),
                    Some(full_residue_id.resid),
                ));
                residues
                    .ids
                    .insert(full_residue_id, residues.residues.len() - 1);
                residues.residues.len() - 1
            }
        };
        residues.residues[index].add_atom(atom_id);

        Ok(())
    }

    fn parse_cryst1(line: &str) -> Result<UnitCell, TrajError> {
        let line = line.trim_end_matches(['\n', '\r']);
        if line.len() < 54 {
            return Err(TrajError::InvalidRecord {
                expected_record_type: "CRYST1".to_string(),
                actual_record_type: line.to_string(),
                reason: "line too short".to_string(),
            });
        }

        let a = parse_float(line, 6..15)?;
        let b = parse_float(line, 15..24)?;
        let c = parse_float(line, 24..33)?;
        let alpha = parse_float(line, 33..40)?;
        let beta = parse_float(line, 40..47)?;
        let gamma = parse_float(line, 47..54)?;

        let cell = UnitCell::from_lengths_angles([a, b, c], [alpha, beta, gamma])?;

        let space_group = field(line, 55..66).trim();
        if !space_group.is_empty() && space_group != "P 1" && space_group != "P1" {
            warn!("ignoring custom space group ({space_group}), using P1 instead");
        }

        Ok(cell)
    }
}

impl FileFormat for PDBFormat {
    fn read_next(&self, reader: &mut BufReader<File>) -> Result<FrameRecord, TrajError> {
        let mut line = String::new();
        let mut record = FrameRecord::default();
        let mut residues = ResidueTable::default();

        while reader.read_line(&mut line)? > 0 {
            match get_record(&line) {
                Record::CRYST1 => record.frame.unit_cell = PDBFormat::parse_cryst1(&line)?,
                Record::ATOM | Record::HETATM => {
                    PDBFormat::parse_atom(&mut record, &mut residues, &line)?
                }
                // A trailing END after ENDMDL belongs to the previous model
                Record::ENDMDL | Record::END if record.frame.size() > 0 => break,
                _ => {}
            }
            line.clear();
        }

        for residue in residues.residues {
            record.topology.add_residue(residue)?;
        }
        Ok(record)
    }

    fn forward(&self, reader: &mut BufReader<File>) -> Result<Option<u64>, TrajError> {
        let mut line = String::new();
        let mut has_atoms = false;

        while reader.read_line(&mut line)? > 0 {
            match get_record(&line) {
                Record::ATOM | Record::HETATM => has_atoms = true,
                Record::ENDMDL | Record::END if has_atoms => {
                    return Ok(Some(reader.stream_position()?));
                }
                _ => {}
            }
            line.clear();
        }

        if has_atoms {
            // last model without a terminating record
            return Ok(Some(reader.stream_position()?));
        }
        Ok(None)
    }

    fn header_cell(&self, reader: &mut BufReader<File>) -> Result<Option<UnitCell>, TrajError> {
        let mut line = String::new();
        let mut cell = None;

        while reader.read_line(&mut line)? > 0 {
            match get_record(&line) {
                Record::CRYST1 => cell = Some(PDBFormat::parse_cryst1(&line)?),
                Record::MODEL | Record::ATOM | Record::HETATM => break,
                _ => {}
            }
            line.clear();
        }
        Ok(cell)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use assert_approx_eq::assert_approx_eq;
    use tempfile::NamedTempFile;

    use super::*;

    const TWO_MODELS: &str = "\
CRYST1   15.000   15.000   15.000  90.00  90.00  90.00 P 1           1
MODEL        1
ATOM      1  N   ALA A   1       0.417   8.303  11.737  1.00  0.00           N
ATOM      2  CA  ALA A   1       1.417   8.303  11.737  1.00  0.00           C
ATOM      3  N   GLY A   2       2.417   8.303  11.737  1.00  0.00           N
HETATM    4  O   HOH B   3       3.417   8.303  11.737  1.00  0.00           O
ENDMDL
MODEL        2
ATOM      1  N   ALA A   1       0.517   8.303  11.737  1.00  0.00           N
ATOM      2  CA  ALA A   1       1.517   8.303  11.737  1.00  0.00           C
ATOM      3  N   GLY A   2       2.517   8.303  11.737  1.00  0.00           N
HETATM    4  O   HOH B   3       3.517   8.303  11.737  1.00  0.00           O
ENDMDL
END
";

    fn reader_for(content: &str) -> (NamedTempFile, BufReader<File>) {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        let reader = BufReader::new(file.reopen().unwrap());
        (file, reader)
    }

    #[test]
    fn check_nsteps() {
        let (_file, mut reader) = reader_for(TWO_MODELS);
        assert!(PDBFormat.forward(&mut reader).unwrap().is_some());
        assert!(PDBFormat.forward(&mut reader).unwrap().is_some());
        assert!(PDBFormat.forward(&mut reader).unwrap().is_none());
    }

    #[test]
    fn sanity_check() {
        let (_file, mut reader) = reader_for(TWO_MODELS);
        let record = PDBFormat.read_next(&mut reader).unwrap();
        assert_eq!(record.frame.size(), 4);

        let positions = record.frame.positions();
        assert_approx_eq!(positions[0][0], 0.417, 1e-5);
        assert_approx_eq!(positions[0][1], 8.303, 1e-5);
        assert_approx_eq!(positions[0][2], 11.737, 1e-5);

        let cell = record.frame.unit_cell.cell_matrix;
        assert_approx_eq!(cell[(0, 0)], 15.0);
        assert_approx_eq!(cell[(1, 1)], 15.0);
        assert_approx_eq!(cell[(2, 2)], 15.0);

        let topology = &record.topology;
        assert_eq!(topology[1].name, "CA");
        assert_eq!(topology[1].symbol, "C");
        assert_eq!(topology.residues.len(), 3);
        assert_eq!(topology.residues[0].name, "ALA");
        assert_eq!(topology.residues[0].size(), 2);
        assert_eq!(topology.residue_for_atom(3).unwrap().name, "HOH");
        assert_eq!(topology.residue_for_atom(3).unwrap().id, Some(3));

        let record = PDBFormat.read_next(&mut reader).unwrap();
        assert_eq!(record.frame.size(), 4);
        assert_approx_eq!(record.frame[0][0], 0.517, 1e-5);
    }

    #[test]
    fn single_model_without_terminator() {
        let content = "ATOM      1  N   ALA A   1       0.417   8.303  11.737\n";
        let (_file, mut reader) = reader_for(content);
        assert!(PDBFormat.forward(&mut reader).unwrap().is_some());
        assert!(PDBFormat.forward(&mut reader).unwrap().is_none());

        let (_file, mut reader) = reader_for(content);
        let record = PDBFormat.read_next(&mut reader).unwrap();
        assert_eq!(record.topology[0].symbol, "N");
    }

    #[test]
    fn short_atom_record() {
        let (_file, mut reader) = reader_for("ATOM      1  N   ALA A   1       0.417\n");
        assert!(matches!(
            PDBFormat.read_next(&mut reader),
            Err(TrajError::InvalidRecord { .. })
        ));
    }

    #[test]
    fn non_ascii_free_text() {
        let content = format!("REM\u{c4}\u{c4}RK x\nTITLE     caf\u{e9}\n{}", TWO_MODELS);
        let (_file, mut reader) = reader_for(&content);
        assert!(PDBFormat.forward(&mut reader).unwrap().is_some());
        assert!(PDBFormat.forward(&mut reader).unwrap().is_some());
        assert!(PDBFormat.forward(&mut reader).unwrap().is_none());

        let (_file, mut reader) = reader_for(&content);
        let record = PDBFormat.read_next(&mut reader).unwrap();
        assert_eq!(record.frame.size(), 4);
        assert_eq!(get_record("REM\u{c4}\u{c4}RK x"), Record::IGNORED);
        assert_eq!(get_record("END"), Record::END);
        assert_eq!(get_record("MODEL"), Record::MODEL);
    }

    #[test]
    fn cell_from_header() {
        let (_file, mut reader) = reader_for(TWO_MODELS);
        let cell = PDBFormat.header_cell(&mut reader).unwrap().unwrap();
        assert_approx_eq!(cell.cell_matrix[(0, 0)], 15.0);
        assert_approx_eq!(cell.cell_matrix[(2, 2)], 15.0);

        let content = "ATOM      1  N   ALA A   1       0.417   8.303  11.737\n";
        let (_file, mut reader) = reader_for(content);
        assert!(PDBFormat.header_cell(&mut reader).unwrap().is_none());
    }

    #[test]
    fn hybrid_decode() {
        assert_eq!(decode_hybrid36(4, "    ").unwrap(), 0);
        assert_eq!(decode_hybrid36(4, "  -0").unwrap(), 0);
        assert_eq!(decode_hybrid36(4, "  12").unwrap(), 12);
        assert_eq!(decode_hybrid36(5, "99999").unwrap(), 99999);
        assert_eq!(decode_hybrid36(5, "A0000").unwrap(), 100000);
        assert_eq!(decode_hybrid36(4, "A000").unwrap(), 10000);
        assert_eq!(decode_hybrid36(5, "a0000").unwrap(), 100000 + 26 * 36_i64.pow(4));
        assert!(decode_hybrid36(4, "A0a0").is_err());
        assert!(decode_hybrid36(3, "1234").is_err());
    }
}
