use super::format::StructureError;
use crate::core::models::structure::{AtomSite, Structure};
use flate2::read::MultiGzDecoder;
use pdbtbx::{Format, PDB, ReadOptions, StrictnessLevel};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Defines the interface for reading coordinate file formats.
///
/// Parsing is delegated to `pdbtbx`; implementors only name the format. Only
/// the first model is kept. Reading from a path transparently decompresses
/// `.gz` files, which is how the AlphaFold database distributes its models.
pub trait StructureFile {
    /// The format `pdbtbx` parses this file type as.
    const FORMAT: Format;

    /// Reads the first model of a structure from a buffered reader.
    ///
    /// `origin` only labels errors and log lines.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::Parse`] if `pdbtbx` rejects the input or the
    /// first model holds no atoms.
    fn read_from<R: Read>(reader: BufReader<R>, origin: &Path) -> Result<PDB, StructureError> {
        let (pdb, warnings) = ReadOptions::default()
            .set_format(Self::FORMAT)
            .set_level(StrictnessLevel::Loose)
            .set_only_first_model(true)
            .read_raw(reader)
            .map_err(|errors| StructureError::parse(origin, &errors))?;
        for warning in &warnings {
            debug!("{:?}: {}", origin, warning.short_description());
        }
        if pdb.atom_count() == 0 {
            return Err(StructureError::Parse {
                path: origin.to_path_buf(),
                details: "no atoms in the first model".to_string(),
            });
        }
        Ok(pdb)
    }

    /// Reads a structure from a file path, gunzipping when the name ends in `.gz`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, decompressed, or parsed.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<PDB, StructureError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| StructureError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        if is_gzipped(path) {
            Self::read_from(BufReader::new(MultiGzDecoder::new(file)), path)
        } else {
            Self::read_from(BufReader::new(file), path)
        }
    }
}

/// Flattens the first model of `pdb` into atoms in file order.
///
/// Where a residue has alternate locations, each atom name is taken from the
/// first conformer that carries it.
pub fn to_structure(pdb: &PDB) -> Structure {
    let mut atoms = Vec::new();
    let Some(model) = pdb.models().next() else {
        return Structure::default();
    };
    for chain in model.chains() {
        for residue in chain.residues() {
            let residue_number = i32::try_from(residue.serial_number()).unwrap_or(i32::MAX);
            let insertion_code = residue.insertion_code().map(str::to_string);
            let mut seen: HashSet<&str> = HashSet::new();
            for conformer in residue.conformers() {
                for atom in conformer.atoms() {
                    if !seen.insert(atom.name()) {
                        continue;
                    }
                    atoms.push(AtomSite {
                        name: atom.name().to_string(),
                        residue_name: conformer.name().to_string(),
                        chain_id: chain.id().to_string(),
                        residue_number,
                        insertion_code: insertion_code.clone(),
                        b_factor: atom.b_factor(),
                    });
                }
            }
        }
    }
    Structure::new(atoms)
}

pub(crate) fn is_gzipped(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}
