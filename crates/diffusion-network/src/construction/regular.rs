//! Degree-regular ring lattice.

use diffusion_types::NodeId;
use rand::RngCore;

use super::{BuildContext, ConstructionAlgorithm, EdgeDraft, debug_assert_clean};
use crate::error::NetworkError;

const NAME: &str = "degree_regular";

/// Node `i` points at nodes `i+1 ..= i+z` (mod `n`), so every node has
/// in-degree and out-degree exactly `z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DegreeRegular {
    degree: usize,
}

impl DegreeRegular {
    /// Create the lattice rule.
    pub const fn new(degree: usize) -> Self {
        Self { degree }
    }

    /// Target in/out-degree.
    pub const fn degree(&self) -> usize {
        self.degree
    }
}

/// Check that `n` nodes can carry a ring of degree `z`.
///
/// `z == n` is only possible when every node also points at itself.
pub(crate) fn check_ring(
    strategy: &'static str,
    n: usize,
    z: usize,
    allow_self_loops: bool,
) -> Result<(), NetworkError> {
    if z == 0 || z < n || (z == n && allow_self_loops) {
        return Ok(());
    }
    let limit = if allow_self_loops { "n" } else { "n - 1" };
    Err(NetworkError::InvalidParameter {
        strategy,
        parameter: "degree".to_owned(),
        reason: format!("degree {z} exceeds {limit} for {n} nodes"),
    })
}

/// Ring edges of degree `z` over `nodes`, in insertion order.
///
/// Offsets run `1..=z`; offset `n` wraps onto the node itself.
pub(crate) fn ring_edges(nodes: &[NodeId], z: usize) -> Vec<EdgeDraft> {
    let n = nodes.len();
    let mut drafts = Vec::with_capacity(n.saturating_mul(z));
    for (i, &source) in nodes.iter().enumerate() {
        for offset in 1..=z {
            let target = i
                .checked_add(offset)
                .and_then(|j| j.checked_rem(n))
                .and_then(|j| nodes.get(j));
            if let Some(&target) = target {
                drafts.push(EdgeDraft::new(source, target));
            }
        }
    }
    drafts
}

impl ConstructionAlgorithm for DegreeRegular {
    fn name(&self) -> &'static str {
        NAME
    }

    fn create_edges(
        &self,
        ctx: &BuildContext<'_>,
        _rng: &mut dyn RngCore,
    ) -> Result<Vec<EdgeDraft>, NetworkError> {
        let ids = ctx.node_ids();
        check_ring(NAME, ids.len(), self.degree, ctx.allow_self_loops)?;
        let drafts = ring_edges(&ids, self.degree);
        debug_assert_clean(&drafts, ctx.allow_self_loops);
        Ok(drafts)
    }
}
