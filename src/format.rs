// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2025 William Bro-Jørgensen
// Copyright (c) 2020 Guillaume Fraux and contributors
//
// See LICENSE at the project root for full text.

use crate::error::TrajError;
use crate::formats::pdb::PDBFormat;
use crate::formats::xyz::XYZFormat;
use crate::frame::Frame;
use crate::topology::Topology;
use crate::unit_cell::UnitCell;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Supported text-based trajectory file formats for reading.
///
/// - `XYZ`: plain-text XYZ coordinate format.
/// - `PDB`: Protein Data Bank format, one `MODEL` per frame.
/// - `Guess`: autodetect format from file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    /// XYZ file format.
    XYZ,
    /// PDB file format.
    PDB,
    /// Automatically detect format from file extension.
    Guess,
}

/// A frame together with the topology found in the same record.
///
/// Formats without residue information (XYZ) return a topology holding only
/// atom names.
#[derive(Debug, Default)]
pub struct FrameRecord {
    pub frame: Frame,
    pub topology: Topology,
}

/// Concrete file format strategy for reading trajectory data.
#[derive(Debug, Clone, Copy)]
pub enum Format {
    /// Handler for the XYZ format.
    XYZ(XYZFormat),
    /// Handler for the PDB format.
    PDB(PDBFormat),
}

impl Format {
    /// Creates a new [`Format`] by inferring the format from the provided file `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file extension is unrecognized.
    pub fn new(path: &Path) -> Result<Self, TrajError> {
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");

        match ext.to_lowercase().as_str() {
            "xyz" => Ok(Format::XYZ(XYZFormat)),
            "pdb" => Ok(Format::PDB(PDBFormat)),
            _ => Err(TrajError::UnsupportedFileFormat(ext.to_string())),
        }
    }

    /// Creates a new `Format` using the specified `TextFormat` and file `path`.
    ///
    /// `TextFormat::Guess` delegates to [`Format::new`].
    ///
    /// # Errors
    ///
    /// Returns an error if guessing cannot detect the format.
    pub fn new_from_format(fmt: TextFormat, path: &Path) -> Result<Self, TrajError> {
        match fmt {
            TextFormat::XYZ => Ok(Format::XYZ(XYZFormat)),
            TextFormat::PDB => Ok(Format::PDB(PDBFormat)),
            TextFormat::Guess => Self::new(path),
        }
    }
}

/// Common interface for reading trajectory file formats.
pub trait FileFormat {
    /// Reads the [`FrameRecord`] starting at the current position of `reader`.
    ///
    /// # Errors
    /// Returns an error if reading or parsing the frame fails.
    fn read_next(&self, reader: &mut BufReader<File>) -> Result<FrameRecord, TrajError>;

    /// Advances past the next frame in `reader`, returning the byte offset
    /// where it ends, or `None` at end-of-file.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O or parsing error occurs.
    fn forward(&self, reader: &mut BufReader<File>) -> Result<Option<u64>, TrajError>;

    /// Reads the unit cell declared in the file header, before the first
    /// frame, leaving `reader` somewhere past it.
    ///
    /// Frames of such files only carry a cell of their own when it changes,
    /// so the header cell applies to every frame without one. Formats with
    /// no file header return `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O or parsing error occurs.
    fn header_cell(&self, _reader: &mut BufReader<File>) -> Result<Option<UnitCell>, TrajError> {
        Ok(None)
    }
}

impl FileFormat for Format {
    fn read_next(&self, reader: &mut BufReader<File>) -> Result<FrameRecord, TrajError> {
        match self {
            Format::XYZ(format) => format.read_next(reader),
            Format::PDB(format) => format.read_next(reader),
        }
    }

    fn forward(&self, reader: &mut BufReader<File>) -> Result<Option<u64>, TrajError> {
        match self {
            Format::XYZ(format) => format.forward(reader),
            Format::PDB(format) => format.forward(reader),
        }
    }

    fn header_cell(&self, reader: &mut BufReader<File>) -> Result<Option<UnitCell>, TrajError> {
        match self {
            Format::XYZ(format) => format.header_cell(reader),
            Format::PDB(format) => format.header_cell(reader),
        }
    }
}
