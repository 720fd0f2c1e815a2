#[cfg(feature = "serde")]
use serde::{Serialize, Deserialize};

use crate::{M33, V3, Element, Lattice, SymmetryOperator};

/// Atomic displacement parameters.
///
/// Anisotropic parameters are stored as the Cartesian tensor `U_cart`, which
/// transforms under a Cartesian rotation `Q` as `Q U Q^T`.  Use [`u_cif`] for
/// the crystallographic `U_ij` convention.
///
/// [`u_cif`]: #method.u_cif
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Adps {
    Isotropic(f64),
    Anisotropic(M33),
}

impl Adps {
    /// From `U_ij` as written in a CIF, relative to the given lattice.
    pub fn from_u_cif(u_cif: &M33, lattice: &Lattice) -> Adps {
        let a = lattice.fractional_to_orthogonal_matrix();
        let n = reciprocal_length_matrix(lattice);
        Adps::Anisotropic(a * n * u_cif * n * a.transpose())
    }

    /// The `U_ij` tensor in the CIF convention, or `None` for isotropic parameters.
    ///
    /// `U_cif = N^-1 A^-1 U_cart A^-T N^-1`, with `N = diag(a*, b*, c*)`.
    pub fn u_cif(&self, lattice: &Lattice) -> Option<M33> {
        match *self {
            Adps::Isotropic(_) => None,
            Adps::Anisotropic(u) => {
                let a_inv = lattice.orthogonal_to_fractional_matrix();
                let r = lattice.reciprocal_lengths();
                let n_inv = M33::from_diagonal(&V3::new(1.0 / r[0], 1.0 / r[1], 1.0 / r[2]));
                Some(n_inv * a_inv * u * a_inv.transpose() * n_inv)
            },
        }
    }

    /// `U_iso`, or a third of the trace of `U_cart`.
    pub fn u_iso(&self) -> f64 {
        match *self {
            Adps::Isotropic(u) => u,
            Adps::Anisotropic(u) => u.trace() / 3.0,
        }
    }

    /// Apply a Cartesian linear map `Q` as `Q U Q^T`.  Isotropic values are unchanged.
    pub fn transformed(&self, q: &M33) -> Adps {
        match *self {
            Adps::Isotropic(u) => Adps::Isotropic(u),
            Adps::Anisotropic(u) => Adps::Anisotropic(q * u * q.transpose()),
        }
    }

    /// Parameters of the image of an atom under a symmetry operator.
    pub fn rotated(&self, op: &SymmetryOperator, lattice: &Lattice) -> Adps {
        let cart_rotation = {
            lattice.fractional_to_orthogonal_matrix()
                * op.rotation()
                * lattice.orthogonal_to_fractional_matrix()
        };
        self.transformed(&cart_rotation)
    }
}

fn reciprocal_length_matrix(lattice: &Lattice) -> M33 {
    let r = lattice.reciprocal_lengths();
    M33::from_diagonal(&V3::new(r[0], r[1], r[2]))
}

/// An atom in a crystal, at a fractional position.
///
/// The `active` flag marks atoms that should be left out of output and of
/// calculations that respect it (see `Structure::active_atoms`).  It is not
/// serialized; deserialized atoms are active.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub struct Atom {
    label: String,
    element: Element,
    position: V3,
    #[cfg_attr(feature = "serde", serde(default = "default_occupancy"))]
    occupancy: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    charge: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    adps: Option<Adps>,
    #[cfg_attr(feature = "serde", serde(skip, default = "default_active"))]
    active: bool,
}

#[cfg(feature = "serde")]
fn default_occupancy() -> f64 { 1.0 }
#[cfg(feature = "serde")]
fn default_active() -> bool { true }

impl Atom {
    /// Fully occupied, uncharged, active, and without ADPs.
    pub fn new(element: Element, position: V3, label: impl Into<String>) -> Atom {
        Atom {
            label: label.into(),
            element,
            position,
            occupancy: 1.0,
            charge: 0.0,
            adps: None,
            active: true,
        }
    }

    pub fn with_charge(mut self, charge: f64) -> Self { self.charge = charge; self }
    pub fn with_occupancy(mut self, occupancy: f64) -> Self { self.occupancy = occupancy; self }
    pub fn with_adps(mut self, adps: Adps) -> Self { self.adps = Some(adps); self }
    pub fn with_position(mut self, position: V3) -> Self { self.position = position; self }
    pub fn with_label(mut self, label: impl Into<String>) -> Self { self.label = label.into(); self }
}

impl Atom {
    pub fn label(&self) -> &str { &self.label }
    pub fn element(&self) -> Element { self.element }
    /// Fractional coordinates.
    pub fn position(&self) -> V3 { self.position }
    pub fn occupancy(&self) -> f64 { self.occupancy }
    pub fn charge(&self) -> f64 { self.charge }
    pub fn adps(&self) -> Option<&Adps> { self.adps.as_ref() }
    pub fn is_active(&self) -> bool { self.active }

    pub fn set_label(&mut self, label: impl Into<String>) { self.label = label.into(); }
    pub fn set_element(&mut self, element: Element) { self.element = element; }
    pub fn set_position(&mut self, position: V3) { self.position = position; }
    pub fn set_occupancy(&mut self, occupancy: f64) { self.occupancy = occupancy; }
    pub fn set_charge(&mut self, charge: f64) { self.charge = charge; }
    pub fn set_adps(&mut self, adps: Option<Adps>) { self.adps = adps; }
    pub fn set_active(&mut self, active: bool) { self.active = active; }
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;
    use crate::consts::CARBON;

    #[test]
    fn u_cif_round_trip() {
        let lattice = Lattice::new(5.0, 7.0, 9.0, 80.0, 100.0, 110.0).unwrap();
        let u_cif = M33::new(
            0.020, 0.003, -0.001,
            0.003, 0.030, 0.002,
            -0.001, 0.002, 0.025,
        );
        let adps = Adps::from_u_cif(&u_cif, &lattice);
        assert_close!(abs=1e-12, adps.u_cif(&lattice).unwrap(), u_cif);

        // an orthogonal cell makes U_cif and U_cart the same tensor
        let ortho = Lattice::orthorhombic(4.0, 5.0, 6.0);
        let adps = Adps::from_u_cif(&u_cif, &ortho);
        assert_eq!(Adps::Isotropic(0.01).u_cif(&ortho), None);
        match adps {
            Adps::Anisotropic(u) => assert_close!(abs=1e-12, u, u_cif),
            Adps::Isotropic(_) => panic!("expected anisotropic parameters"),
        }
    }

    #[test]
    fn rotation_preserves_trace() {
        let lattice = Lattice::new(5.0, 5.0, 8.0, 90.0, 90.0, 120.0).unwrap();
        let sixfold: SymmetryOperator = "x-y,x,z".parse().unwrap();
        let u = Adps::Anisotropic(M33::new(
            0.02, 0.00, 0.00,
            0.00, 0.05, 0.01,
            0.00, 0.01, 0.03,
        ));
        let image = u.rotated(&sixfold, &lattice);
        assert_close!(abs=1e-12, image.u_iso(), u.u_iso());
        assert_eq!(Adps::Isotropic(0.1).rotated(&sixfold, &lattice), Adps::Isotropic(0.1));
    }

    #[test]
    fn builders() {
        let atom = Atom::new(CARBON, V3::new(0.1, 0.2, 0.3), "C1").with_charge(-0.5).with_occupancy(0.5);
        assert_eq!(atom.label(), "C1");
        assert_eq!(atom.charge(), -0.5);
        assert_eq!(atom.occupancy(), 0.5);
        assert!(atom.is_active());
        assert!(atom.adps().is_none());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_with_defaults() {
        let atom: Atom = serde_json::from_str(r#"{
            "label": "O1",
            "element": "O",
            "position": [0.5, 0.25, 0.0],
            "adps": {"isotropic": 0.02}
        }"#).unwrap();
        assert_eq!(atom.element(), crate::consts::OXYGEN);
        assert_eq!(atom.occupancy(), 1.0);
        assert_eq!(atom.charge(), 0.0);
        assert_eq!(atom.adps(), Some(&Adps::Isotropic(0.02)));
        assert!(atom.is_active());
    }
}
