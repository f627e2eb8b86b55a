use std::collections::HashMap;

/// One atom of the first model of a structure file.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomSite {
    pub name: String,                   // Atom name (e.g., "CA")
    pub residue_name: String,           // Residue name (e.g., "GLU")
    pub chain_id: String,               // Author chain identifier
    pub residue_number: i32,            // Author residue sequence number
    pub insertion_code: Option<String>, // Insertion code, if any
    pub b_factor: f64,                  // B-factor; AlphaFold stores pLDDT here
}

/// The first model of a structure file, atoms in file order.
///
/// Per-residue confidence for the first chain is tallied once on construction,
/// so scoring many variants against one model does not rescan its atoms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Structure {
    atoms: Vec<AtomSite>,
    confidence: HashMap<i32, f64>,
}

impl Structure {
    pub fn new(atoms: Vec<AtomSite>) -> Self {
        let confidence = first_chain_confidence(&atoms);
        Self { atoms, confidence }
    }

    pub fn atoms(&self) -> &[AtomSite] {
        &self.atoms
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Chain identifiers in order of first appearance.
    pub fn chain_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for atom in &self.atoms {
            if !ids.contains(&atom.chain_id.as_str()) {
                ids.push(&atom.chain_id);
            }
        }
        ids
    }

    /// Per-residue confidence for `residue_number` in the first chain.
    ///
    /// The score is the B-factor of the residue's `CA` atom, or the mean over
    /// all of its atoms when no `CA` is present. Residues carrying an insertion
    /// code are not matched. Returns `None` when the residue does not exist.
    pub fn residue_confidence(&self, residue_number: i32) -> Option<f64> {
        self.confidence.get(&residue_number).copied()
    }
}

#[derive(Default)]
struct Tally {
    alpha_carbon: Option<f64>,
    sum: f64,
    count: usize,
}

fn first_chain_confidence(atoms: &[AtomSite]) -> HashMap<i32, f64> {
    let Some(chain) = atoms.first().map(|a| a.chain_id.as_str()) else {
        return HashMap::new();
    };

    let mut tallies: HashMap<i32, Tally> = HashMap::new();
    for atom in atoms
        .iter()
        .filter(|a| a.chain_id == chain && a.insertion_code.is_none())
    {
        let tally = tallies.entry(atom.residue_number).or_default();
        if atom.name == "CA" && tally.alpha_carbon.is_none() {
            tally.alpha_carbon = Some(atom.b_factor);
        }
        tally.sum += atom.b_factor;
        tally.count += 1;
    }

    tallies
        .into_iter()
        .map(|(residue, t)| {
            let score = t.alpha_carbon.unwrap_or(t.sum / t.count as f64);
            (residue, score)
        })
        .collect()
}
