//! Labels higher-order taxa in a phylogenetic tree using a reference
//! taxonomy. See the `phylolabel` binary for the command-line interface.

pub mod formats;
pub mod labeling;
pub mod model;
pub mod utils;
