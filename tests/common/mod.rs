#![allow(dead_code)]

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub const N_FRAMES: usize = 10;
pub const N_ATOMS: usize = 20;

const RESIDUES: [&str; 4] = ["ALA", "GLY", "SER", "LYS"];
const NAMES: [&str; 5] = ["N", "CA", "C", "O", "CB"];

/// Generated trajectory files, removed when dropped
pub struct Fixture {
    pub dir: TempDir,
    /// `N_FRAMES` frames of `N_ATOMS` atoms, XYZ
    pub traj: PathBuf,
    /// First frame as PDB, with residues
    pub top: PathBuf,
    /// Same frames as `traj`, one PDB model each
    pub models: PathBuf,
}

/// Position of `atom` in `frame`; every value is exact in binary and in
/// three decimals
pub fn position(frame: usize, atom: usize) -> [f64; 3] {
    [
        atom as f64 * 1.5,
        frame as f64,
        0.25 * (atom % 3) as f64 - 0.5 * frame as f64,
    ]
}

pub fn atom_name(atom: usize) -> &'static str {
    NAMES[atom % NAMES.len()]
}

pub fn write_xyz(path: &Path, n_frames: usize, n_atoms: usize) {
    let mut content = String::new();
    for frame in 0..n_frames {
        writeln!(content, "{n_atoms}").unwrap();
        writeln!(content, "frame {frame}").unwrap();
        for atom in 0..n_atoms {
            let [x, y, z] = position(frame, atom);
            writeln!(content, "{} {x:.6} {y:.6} {z:.6}", atom_name(atom)).unwrap();
        }
    }
    fs::write(path, content).unwrap();
}

fn pdb_model(content: &mut String, frame: usize) {
    for atom in 0..N_ATOMS {
        let residue = atom / NAMES.len();
        let [x, y, z] = position(frame, atom);
        let name = atom_name(atom);
        writeln!(
            content,
            "ATOM  {:>5} {:<4} {:>3} A{:>4}    {x:>8.3}{y:>8.3}{z:>8.3}  1.00  0.00          {:>2}",
            atom + 1,
            format!(" {name}"),
            RESIDUES[residue],
            residue + 1,
            &name[..1],
        )
        .unwrap();
    }
}

pub fn write_pdb(path: &Path, n_frames: usize) {
    let mut content = String::from(
        "CRYST1   30.000   30.000   30.000  90.00  90.00  90.00 P 1           1\n",
    );
    for frame in 0..n_frames {
        writeln!(content, "MODEL     {:>4}", frame + 1).unwrap();
        pdb_model(&mut content, frame);
        content.push_str("ENDMDL\n");
    }
    content.push_str("END\n");
    fs::write(path, content).unwrap();
}

pub fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let traj = dir.path().join("md.xyz");
    let top = dir.path().join("top.pdb");
    let models = dir.path().join("models.pdb");

    write_xyz(&traj, N_FRAMES, N_ATOMS);
    write_pdb(&top, 1);
    write_pdb(&models, N_FRAMES);

    Fixture {
        dir,
        traj,
        top,
        models,
    }
}
