use phf::{Map, phf_map};

/// Mass of the water molecule released by each peptide bond (Da).
pub const WATER_MASS_DA: f64 = 18.0153;

/// Average masses of the free amino acids (Da).
///
/// Ambiguity codes take the mean of the residues they stand for; `X` is the mean of the
/// twenty canonical residues.
pub static RESIDUE_MASSES: Map<char, f64> = phf_map! {
    'A' => 89.0932,
    'C' => 121.1582,
    'D' => 133.1027,
    'E' => 147.1293,
    'F' => 165.1891,
    'G' => 75.0666,
    'H' => 155.1546,
    'I' => 131.1729,
    'K' => 146.1876,
    'L' => 131.1729,
    'M' => 149.2113,
    'N' => 132.1179,
    'O' => 255.3134, // Pyrrolysine
    'P' => 115.1305,
    'Q' => 146.1445,
    'R' => 174.2010,
    'S' => 105.0926,
    'T' => 119.1192,
    'U' => 168.0532, // Selenocysteine
    'V' => 117.1463,
    'W' => 204.2252,
    'Y' => 181.1885,
    // --- IUPAC ambiguity codes ---
    'B' => 132.6103, // D or N
    'Z' => 146.6369, // E or Q
    'J' => 131.1729, // I or L
    'X' => 136.9002, // any
};

/// Kyte-Doolittle (1982) hydropathy index.
pub static KYTE_DOOLITTLE: Map<char, f64> = phf_map! {
    'A' => 1.8,
    'C' => 2.5,
    'D' => -3.5,
    'E' => -3.5,
    'F' => 2.8,
    'G' => -0.4,
    'H' => -3.2,
    'I' => 4.5,
    'K' => -3.9,
    'L' => 3.8,
    'M' => 1.9,
    'N' => -3.5,
    'O' => -3.9, // scored as lysine
    'P' => -1.6,
    'Q' => -3.5,
    'R' => -4.5,
    'S' => -0.8,
    'T' => -0.7,
    'U' => 2.5, // scored as cysteine
    'V' => 4.2,
    'W' => -0.9,
    'Y' => -1.3,
    'B' => -3.5,
    'Z' => -3.5,
    'J' => 4.15,
    'X' => -0.49,
};

// --- pKa values (EMBOSS) ---
pub const PKA_N_TERMINUS: f64 = 9.69;
pub const PKA_C_TERMINUS: f64 = 2.34;

/// Ionizable side chains: `(pKa, charge sign)`. Positive residues carry `+1` when
/// protonated, acidic residues carry `-1` when deprotonated.
pub static IONIZABLE_SIDE_CHAINS: Map<char, (f64, f64)> = phf_map! {
    'D' => (3.65, -1.0),
    'E' => (4.25, -1.0),
    'C' => (8.18, -1.0),
    'U' => (5.20, -1.0),
    'Y' => (10.07, -1.0),
    'H' => (6.00, 1.0),
    'K' => (10.53, 1.0),
    'R' => (12.48, 1.0),
};
