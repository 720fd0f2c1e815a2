/* ************************************************************************ **
** This file is part of xtal, and is licensed under EITHER the MIT license  **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use std::collections::HashMap;
use std::fmt;
use std::str;
use failure::Backtrace;

/// A chemical element, or deuterium.
///
/// Deuterium gets its own value because crystal structures routinely
/// distinguish it from hydrogen, and because both are treated specially
/// when matching structures.  It still reports atomic number 1.
#[derive(Copy, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct Element(u16);

// outside the range of atomic numbers so that it sorts after everything real
const DEUTERIUM_CODE: u16 = 1002;

#[derive(Debug, Fail)]
#[fail(display = "Unable to parse {}: {:?}", kind, text)]
pub struct ElementParseError {
    text: String,
    kind: &'static str, // "element", "element symbol"
    backtrace: Backtrace,
}

impl ElementParseError {
    fn new(kind: &'static str, s: &str) -> Self
    { ElementParseError {
        text: s.to_string(),
        kind,
        backtrace: Backtrace::new(),
    }}
}

struct ElementData {
    symbol: &'static str,
    name: &'static str,
    weight: f64,
}

impl Element {
    pub fn from_atomic_number(n: u32) -> Option<Self>
    {
        if n <= u32::from(u16::max_value()) && DATA.contains_key(&(n as u16)) && n != u32::from(DEUTERIUM_CODE) {
            Some(Element(n as u16))
        } else { None }
    }

    /// Exact (case-sensitive) lookup of a symbol.  "D" is deuterium.
    pub fn from_symbol(s: &str) -> Result<Self, ElementParseError>
    {
        let &n = SYMBOL_TO_CODE.get(s).ok_or_else(|| ElementParseError::new("element symbol", s))?;
        Ok(Element(n))
    }

    pub fn atomic_number(&self) -> u32
    {
        match self.0 {
            DEUTERIUM_CODE => 1,
            n => n.into(),
        }
    }

    pub fn symbol(&self) -> &'static str
    { self.data().symbol }

    pub fn name(&self) -> &'static str
    { self.data().name }

    /// Standard atomic weight in g/mol.
    pub fn atomic_weight(&self) -> f64
    { self.data().weight }

    pub fn is_deuterium(&self) -> bool
    { self.0 == DEUTERIUM_CODE }

    /// Hydrogen and deuterium are excluded from uniqueness checks when matching.
    pub fn is_hydrogen_or_deuterium(&self) -> bool
    { self.atomic_number() == 1 }

    fn data(&self) -> &'static ElementData
    { &DATA[&self.0] }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    { fmt::Display::fmt(self.symbol(), f) }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match f.alternate() {
            false => fmt::Debug::fmt(self.symbol(), f),
            true  => fmt::Debug::fmt(self.name(), f),
        }
    }
}

/// Accepts a symbol or a name, in any case.
impl str::FromStr for Element {
    type Err = ElementParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        let key = s.trim().to_ascii_lowercase();
        let &n = LOOSE_TO_CODE.get(&key).ok_or_else(|| ElementParseError::new("element", s))?;
        Ok(Element(n))
    }
}

#[cfg(feature = "serde")]
mod serde_impls {
    use super::*;
    use serde::{Serialize, Deserialize, ser, de};

    impl Serialize for Element {
        fn serialize<S: ser::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            self.symbol().serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for Element {
        fn deserialize<D: de::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let raw = String::deserialize(deserializer)?;
            raw.parse().map_err(|_| {
                de::Error::invalid_value(de::Unexpected::Str(&raw), &"an element name or symbol")
            })
        }
    }
}

// (atomic number, symbol, name, standard atomic weight)
const TABLE: &[(u16, &str, &str, f64)] = &[
    (  1,  "H", "Hydrogen",      1.008),
    (  2, "He", "Helium",        4.0026),
    (  3, "Li", "Lithium",       6.94),
    (  4, "Be", "Beryllium",     9.0122),
    (  5,  "B", "Boron",         10.81),
    (  6,  "C", "Carbon",        12.011),
    (  7,  "N", "Nitrogen",      14.007),
    (  8,  "O", "Oxygen",        15.999),
    (  9,  "F", "Fluorine",      18.998),
    ( 10, "Ne", "Neon",          20.180),
    ( 11, "Na", "Sodium",        22.990),
    ( 12, "Mg", "Magnesium",     24.305),
    ( 13, "Al", "Aluminum",      26.982),
    ( 14, "Si", "Silicon",       28.085),
    ( 15,  "P", "Phosphorus",    30.974),
    ( 16,  "S", "Sulfur",        32.06),
    ( 17, "Cl", "Chlorine",      35.45),
    ( 18, "Ar", "Argon",         39.948),
    ( 19,  "K", "Potassium",     39.098),
    ( 20, "Ca", "Calcium",       40.078),
    ( 21, "Sc", "Scandium",      44.956),
    ( 22, "Ti", "Titanium",      47.867),
    ( 23,  "V", "Vanadium",      50.942),
    ( 24, "Cr", "Chromium",      51.996),
    ( 25, "Mn", "Manganese",     54.938),
    ( 26, "Fe", "Iron",          55.845),
    ( 27, "Co", "Cobalt",        58.933),
    ( 28, "Ni", "Nickel",        58.693),
    ( 29, "Cu", "Copper",        63.546),
    ( 30, "Zn", "Zinc",          65.38),
    ( 31, "Ga", "Gallium",       69.723),
    ( 32, "Ge", "Germanium",     72.630),
    ( 33, "As", "Arsenic",       74.922),
    ( 34, "Se", "Selenium",      78.971),
    ( 35, "Br", "Bromine",       79.904),
    ( 36, "Kr", "Krypton",       83.798),
    ( 37, "Rb", "Rubidium",      85.468),
    ( 38, "Sr", "Strontium",     87.62),
    ( 39,  "Y", "Yttrium",       88.906),
    ( 40, "Zr", "Zirconium",     91.224),
    ( 41, "Nb", "Niobium",       92.906),
    ( 42, "Mo", "Molybdenum",    95.95),
    ( 43, "Tc", "Technetium",    98.0),
    ( 44, "Ru", "Ruthenium",     101.07),
    ( 45, "Rh", "Rhodium",       102.91),
    ( 46, "Pd", "Palladium",     106.42),
    ( 47, "Ag", "Silver",        107.87),
    ( 48, "Cd", "Cadmium",       112.41),
    ( 49, "In", "Indium",        114.82),
    ( 50, "Sn", "Tin",           118.71),
    ( 51, "Sb", "Antimony",      121.76),
    ( 52, "Te", "Tellurium",     127.60),
    ( 53,  "I", "Iodine",        126.90),
    ( 54, "Xe", "Xenon",         131.29),
    ( 55, "Cs", "Caesium",       132.91),
    ( 56, "Ba", "Barium",        137.33),
    ( 57, "La", "Lanthanum",     138.91),
    ( 58, "Ce", "Cerium",        140.12),
    ( 59, "Pr", "Praseodymium",  140.91),
    ( 60, "Nd", "Neodymium",     144.24),
    ( 61, "Pm", "Promethium",    145.0),
    ( 62, "Sm", "Samarium",      150.36),
    ( 63, "Eu", "Europium",      151.96),
    ( 64, "Gd", "Gadolinium",    157.25),
    ( 65, "Tb", "Terbium",       158.93),
    ( 66, "Dy", "Dysprosium",    162.50),
    ( 67, "Ho", "Holmium",       164.93),
    ( 68, "Er", "Erbium",        167.26),
    ( 69, "Tm", "Thulium",       168.93),
    ( 70, "Yb", "Ytterbium",     173.05),
    ( 71, "Lu", "Lutetium",      174.97),
    ( 72, "Hf", "Hafnium",       178.49),
    ( 73, "Ta", "Tantalum",      180.95),
    ( 74,  "W", "Tungsten",      183.84),
    ( 75, "Re", "Rhenium",       186.21),
    ( 76, "Os", "Osmium",        190.23),
    ( 77, "Ir", "Iridium",       192.22),
    ( 78, "Pt", "Platinum",      195.08),
    ( 79, "Au", "Gold",          196.97),
    ( 80, "Hg", "Mercury",       200.59),
    ( 81, "Tl", "Thallium",      204.38),
    ( 82, "Pb", "Lead",          207.2),
    ( 83, "Bi", "Bismuth",       208.98),
    ( 84, "Po", "Polonium",      209.0),
    ( 85, "At", "Astatine",      210.0),
    ( 86, "Rn", "Radon",         222.0),
    ( 87, "Fr", "Francium",      223.0),
    ( 88, "Ra", "Radium",        226.0),
    ( 89, "Ac", "Actinium",      227.0),
    ( 90, "Th", "Thorium",       232.04),
    ( 91, "Pa", "Protactinium",  231.04),
    ( 92,  "U", "Uranium",       238.03),
    ( 93, "Np", "Neptunium",     237.0),
    ( 94, "Pu", "Plutonium",     244.0),
    ( 95, "Am", "Americium",     243.0),
    ( 96, "Cm", "Curium",        247.0),
    (DEUTERIUM_CODE, "D", "Deuterium", 2.0141),
];

lazy_static!{
    static ref DATA: HashMap<u16, ElementData> = {
        TABLE.iter()
            .map(|&(num, symbol, name, weight)| (num, ElementData { symbol, name, weight }))
            .collect()
    };

    static ref SYMBOL_TO_CODE: HashMap<&'static str, u16> = {
        TABLE.iter()
            .map(|&(num, sym, _, _)| (sym, num))
            .collect()
    };

    static ref LOOSE_TO_CODE: HashMap<String, u16> = {
        let mut map = HashMap::new();
        for &(num, sym, name, _) in TABLE {
            map.insert(sym.to_ascii_lowercase(), num);
            map.insert(name.to_ascii_lowercase(), num);
        }
        map
    };
}

macro_rules! define_consts {
    (
        pub mod $consts:ident {
            $( pub const $NAME:ident: Element = Element($num:expr); )+
        }
    ) => {
        impl Element {
            $( pub const $NAME: Element = Element($num); )+
        }

        pub mod $consts {
            use super::*;

            $( pub const $NAME: Element = Element::$NAME; )+
        }
    };
}

define_consts! {
    pub mod consts {
        pub const HYDROGEN: Element = Element(1);
        pub const DEUTERIUM: Element = Element(DEUTERIUM_CODE);
        pub const CARBON: Element = Element(6);
        pub const NITROGEN: Element = Element(7);
        pub const OXYGEN: Element = Element(8);
        pub const FLUORINE: Element = Element(9);
        pub const SODIUM: Element = Element(11);
        pub const SILICON: Element = Element(14);
        pub const PHOSPHORUS: Element = Element(15);
        pub const SULFUR: Element = Element(16);
        pub const CHLORINE: Element = Element(17);
        pub const BROMINE: Element = Element(35);
        pub const IODINE: Element = Element(53);
    }
}
