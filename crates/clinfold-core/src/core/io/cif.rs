use crate::core::io::traits::StructureFile;
use pdbtbx::Format;

/// PDBx/mmCIF coordinate files (`.cif`, `.mmcif`), the AlphaFold database's
/// primary distribution format.
pub struct CifFile;

impl StructureFile for CifFile {
    const FORMAT: Format = Format::Mmcif;
}
