//! The per-channel filter chain: low-cut, peak and high-cut in series.
//!
//! A chain always holds nine stages in a fixed order. Cut sections beyond
//! the selected slope are bypassed rather than removed, so the audio path
//! never changes shape.

pub mod coefficients;
pub mod filter_chain;
pub mod settings;
pub mod stage;

pub use coefficients::ChainCoefficients;
pub use filter_chain::{filter_chain, ChainWriter, FilterChain};
pub use settings::{ChainSettings, Slope};
pub use stage::{filter_stage, FilterStage, StageCoefficients, StageWriter};

use crate::constants::MAX_CUT_SECTIONS;

/// Total number of stages in one chain.
pub const STAGE_COUNT: usize = MAX_CUT_SECTIONS * 2 + 1;

const PEAK_INDEX: usize = MAX_CUT_SECTIONS;

/// The two cut filters, each made of up to four sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CutGroup {
    LowCut,
    HighCut,
}

impl CutGroup {
    /// Position of section `section` within this group.
    pub fn position(self, section: usize) -> ChainPosition {
        match self {
            CutGroup::LowCut => ChainPosition::LowCut(section),
            CutGroup::HighCut => ChainPosition::HighCut(section),
        }
    }

    pub fn positions(self) -> impl Iterator<Item = ChainPosition> {
        (0..MAX_CUT_SECTIONS).map(move |section| self.position(section))
    }
}

/// Address of one stage in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainPosition {
    LowCut(usize),
    Peak,
    HighCut(usize),
}

impl ChainPosition {
    /// Processing order of every stage.
    pub const ALL: [ChainPosition; STAGE_COUNT] = [
        ChainPosition::LowCut(0),
        ChainPosition::LowCut(1),
        ChainPosition::LowCut(2),
        ChainPosition::LowCut(3),
        ChainPosition::Peak,
        ChainPosition::HighCut(0),
        ChainPosition::HighCut(1),
        ChainPosition::HighCut(2),
        ChainPosition::HighCut(3),
    ];

    /// Array index of this stage. Section numbers past the last section
    /// saturate to it.
    pub fn index(self) -> usize {
        match self {
            ChainPosition::LowCut(section) => section.min(MAX_CUT_SECTIONS - 1),
            ChainPosition::Peak => PEAK_INDEX,
            ChainPosition::HighCut(section) => {
                PEAK_INDEX + 1 + section.min(MAX_CUT_SECTIONS - 1)
            }
        }
    }

    pub fn group(self) -> Option<CutGroup> {
        match self {
            ChainPosition::LowCut(_) => Some(CutGroup::LowCut),
            ChainPosition::Peak => None,
            ChainPosition::HighCut(_) => Some(CutGroup::HighCut),
        }
    }
}
