use thiserror::Error;

use crate::support::constraint::{Constrained, ConstraintError, UnitInterval};

use super::{FieldError, SurfaceField, VolField};

/// Interpolates cell-centred scalar fields onto faces.
///
/// Meshes live outside this crate; this is the narrow hook the mixture flux
/// computation needs from them.
pub trait FaceInterpolation {
    /// Number of cells fields passed to [`interpolate`](Self::interpolate) must have.
    fn n_cells(&self) -> usize;

    /// Number of faces in returned fields.
    fn n_faces(&self) -> usize;

    /// Returns the face values of `field`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::SizeMismatch`] if `field` does not have
    /// [`n_cells`](Self::n_cells) values.
    fn interpolate(&self, field: &VolField<f64>) -> Result<SurfaceField<f64>, FieldError>;
}

/// Errors from building a [`FaceAddressing`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FaceAddressingError {
    #[error("face {face} references cell {cell}, but the mesh has {n_cells} cells")]
    CellOutOfRange {
        face: usize,
        cell: usize,
        n_cells: usize,
    },

    #[error("face addressing arrays have mismatched lengths")]
    LengthMismatch,

    #[error("face {face} has an invalid owner weight")]
    Weight {
        face: usize,
        #[source]
        source: ConstraintError,
    },
}

/// Owner/neighbour face addressing with linear weights.
///
/// The face value is `w·φ_owner + (1 − w)·φ_neighbour` for internal faces and
/// `φ_owner` for boundary faces (no neighbour).
#[derive(Debug, Clone, PartialEq)]
pub struct FaceAddressing {
    n_cells: usize,
    owner: Vec<usize>,
    neighbour: Vec<Option<usize>>,
    weights: Vec<Constrained<f64, UnitInterval>>,
}

impl FaceAddressing {
    /// Creates face addressing for a mesh with `n_cells` cells.
    ///
    /// # Errors
    ///
    /// Returns [`FaceAddressingError`] if the arrays differ in length, a face
    /// references a cell outside the mesh, or a weight lies outside `[0, 1]`.
    pub fn new(
        n_cells: usize,
        owner: Vec<usize>,
        neighbour: Vec<Option<usize>>,
        weights: Vec<f64>,
    ) -> Result<Self, FaceAddressingError> {
        if owner.len() != neighbour.len() || owner.len() != weights.len() {
            return Err(FaceAddressingError::LengthMismatch);
        }

        for (face, (&own, nei)) in owner.iter().zip(neighbour.iter()).enumerate() {
            for cell in std::iter::once(own).chain(nei.iter().copied()) {
                if cell >= n_cells {
                    return Err(FaceAddressingError::CellOutOfRange {
                        face,
                        cell,
                        n_cells,
                    });
                }
            }
        }

        let weights = weights
            .into_iter()
            .enumerate()
            .map(|(face, w)| {
                UnitInterval::new(w).map_err(|source| FaceAddressingError::Weight { face, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            n_cells,
            owner,
            neighbour,
            weights,
        })
    }
}

impl FaceInterpolation for FaceAddressing {
    fn n_cells(&self) -> usize {
        self.n_cells
    }

    fn n_faces(&self) -> usize {
        self.owner.len()
    }

    fn interpolate(&self, field: &VolField<f64>) -> Result<SurfaceField<f64>, FieldError> {
        field.check_len(self.n_cells)?;

        Ok(self
            .owner
            .iter()
            .zip(&self.neighbour)
            .zip(&self.weights)
            .map(|((&own, nei), weight)| match nei {
                Some(nei) => {
                    let w = weight.get();
                    w * field[own] + (1.0 - w) * field[*nei]
                }
                None => field[own],
            })
            .collect())
    }
}
