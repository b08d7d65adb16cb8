//! Spike-mark artifact table.
//!
//! Each of the three spike marks on the field starts with three artifacts in
//! a fixed colour order.  The table below is that layout; matching it against
//! the obelisk [`Motif`] tells autonomous which mark to collect from.

use ftc_types::{ArtifactColor, Motif};

use ArtifactColor::{Green as G, Purple as P};

const SPIKE_MARKS: [(u8, [ArtifactColor; 3]); 3] = [
    (1, [P, P, G]),
    (2, [P, G, P]),
    (3, [G, P, P]),
];

/// Read-only view of the spike-mark layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct Transfer;

impl Transfer {
    pub fn new() -> Self {
        Self
    }

    /// Colour order on spike mark `mark` (1–3), or `None` for other marks.
    pub fn spike_mark(&self, mark: u8) -> Option<[ArtifactColor; 3]> {
        SPIKE_MARKS
            .iter()
            .find(|(id, _)| *id == mark)
            .map(|(_, colours)| *colours)
    }

    /// The spike mark whose colour order matches `motif`.
    pub fn spike_mark_for_motif(&self, motif: Motif) -> Option<u8> {
        let wanted = motif.sequence()?;
        SPIKE_MARKS
            .iter()
            .find(|(_, colours)| *colours == wanted)
            .map(|(id, _)| *id)
    }

    /// All marks in order.
    pub fn spike_marks(&self) -> impl Iterator<Item = (u8, [ArtifactColor; 3])> {
        SPIKE_MARKS.into_iter()
    }
}
