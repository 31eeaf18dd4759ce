//! Size-budgeted partitioning of 3D scene documents.
//!
//! The meshes of a [DataSet](hedron::DataSet) are sized by their vertex attribute bytes,
//! packed greedily into bins of roughly a given byte budget, and each bin is then copied out
//! into a document of its own. Meshes too large for any bin can be split in two along a
//! coordinate axis.

pub mod error;
mod materialize;
mod pack;
mod partition;
mod size;
pub mod spatial;
mod split;

pub use error::*;
pub use materialize::*;
pub use pack::*;
pub use partition::*;
pub use size::*;
pub use spatial::*;
pub use split::*;

pub use hedron;
