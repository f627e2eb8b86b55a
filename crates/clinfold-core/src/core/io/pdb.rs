use super::format::StructureError;
use crate::core::io::traits::StructureFile;
use pdbtbx::{Format, PDB, StrictnessLevel};
use std::path::Path;

/// Legacy PDB coordinate files (`.pdb`, `.ent`).
pub struct PdbFile;

impl StructureFile for PdbFile {
    const FORMAT: Format = Format::Pdb;
}

impl PdbFile {
    /// Writes only chain `chain_id` of `pdb` to `path` as a PDB file.
    ///
    /// Returns the number of atoms written; nothing is written when the chain
    /// is absent.
    pub fn write_chain(mut pdb: PDB, chain_id: &str, path: &Path) -> Result<usize, StructureError> {
        pdb.remove_chains_by(|chain| chain.id() != chain_id);
        pdb.remove_empty();
        let atoms = pdb.atom_count();
        if atoms == 0 {
            return Ok(0);
        }
        let target = path.to_str().ok_or_else(|| StructureError::Write {
            path: path.to_path_buf(),
            details: "path is not valid UTF-8".to_string(),
        })?;
        pdbtbx::save_pdb(&pdb, target, StrictnessLevel::Loose)
            .map_err(|errors| StructureError::write(path, &errors))?;
        Ok(atoms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::traits::to_structure;
    use crate::core::models::structure::Structure;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::fs::{self, File};
    use std::io::{BufReader, Write};

    const ALPHAFOLD_SNIPPET: &str = "\
ATOM      1  N   MET A   1      -1.234   2.345   3.456  1.00 45.12           N
ATOM      2  CA  MET A   1      -0.234   2.845   3.956  1.00 48.50           C
ATOM      3  C   MET A   1       0.766   1.845   4.456  1.00 47.00           C
ATOM      4  N   GLU A   2       1.766   1.345   5.456  1.00 88.20           N
ATOM      5  CA  GLU A   2       2.766   0.845   5.956  1.00 91.75           C
ATOM      6  N   LYS B   1       9.000   9.000   9.000  1.00 70.00           N
END
";

    fn parse(text: &str) -> Result<PDB, StructureError> {
        PdbFile::read_from(BufReader::new(text.as_bytes()), Path::new("inline.pdb"))
    }

    fn structure(text: &str) -> Structure {
        to_structure(&parse(text).unwrap())
    }

    #[test]
    fn reads_atoms_and_b_factors() {
        let s = structure(ALPHAFOLD_SNIPPET);
        assert_eq!(s.atoms().len(), 6);
        let ca = &s.atoms()[1];
        assert_eq!(ca.name, "CA");
        assert_eq!(ca.residue_name, "MET");
        assert_eq!(ca.chain_id, "A");
        assert_eq!(ca.residue_number, 1);
        assert_eq!(ca.insertion_code, None);
        assert_eq!(ca.b_factor, 48.50);
        assert_eq!(s.chain_ids(), vec!["A", "B"]);
        assert_eq!(s.residue_confidence(2), Some(91.75));
    }

    #[test]
    fn stops_after_first_model() {
        let text = "\
MODEL        1
ATOM      1  CA  ALA A   1       0.000   0.000   0.000  1.00 90.00           C
ENDMDL
MODEL        2
ATOM      1  CA  ALA A   1       0.000   0.000   0.000  1.00 10.00           C
ENDMDL
END
";
        let s = structure(text);
        assert_eq!(s.atoms().len(), 1);
        assert_eq!(s.residue_confidence(1), Some(90.0));
    }

    #[test]
    fn takes_each_atom_from_the_first_alternate_location() {
        let text = "\
ATOM      1  CA AALA A   1       0.000   0.000   0.000  0.50 90.00           C
ATOM      2  CA BALA A   1       0.100   0.000   0.000  0.50 20.00           C
END
";
        let s = structure(text);
        assert_eq!(s.atoms().len(), 1);
        assert_eq!(s.residue_confidence(1), Some(90.0));
    }

    #[test]
    fn file_without_atoms_is_rejected() {
        assert!(matches!(
            parse("HEADER    NOTHING HERE\nEND\n"),
            Err(StructureError::Parse { .. })
        ));
    }

    #[test]
    fn written_chain_keeps_only_that_chain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("P1.pdb");
        let written = PdbFile::write_chain(parse(ALPHAFOLD_SNIPPET).unwrap(), "A", &path).unwrap();
        assert_eq!(written, 5);

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.lines().any(|l| l.starts_with("ATOM") && l.contains("MET A   1")));
        assert!(!text.contains("LYS B"));

        let s = to_structure(&PdbFile::read_from_path(&path).unwrap());
        assert_eq!(s.chain_ids(), vec!["A"]);
        assert_eq!(s.residue_confidence(1), Some(48.50));
        assert_eq!(s.residue_confidence(2), Some(91.75));
    }

    #[test]
    fn absent_chain_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("P1.pdb");
        let written = PdbFile::write_chain(parse(ALPHAFOLD_SNIPPET).unwrap(), "Z", &path).unwrap();
        assert_eq!(written, 0);
        assert!(!path.exists());
    }

    #[test]
    fn read_from_path_decompresses_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("AF-P12345-F1-model_v4.pdb.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(ALPHAFOLD_SNIPPET.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let s = to_structure(&PdbFile::read_from_path(&path).unwrap());
        assert_eq!(s.atoms().len(), 6);
        assert_eq!(s.residue_confidence(1), Some(48.50));
    }
}
