//! Combinatorial test-matrix builder.
//!
//! [`ParamsBuilder`] expands an ordered list of axes into the sequence of
//! parameter records that survive every pruning predicate. Records are flat
//! tuples that grow by one element per axis, so a predicate can only name axes
//! that are already bound: referring to a later axis is a type error, not a
//! runtime failure.
//!
//! ```
//! use zeroinit_params::ParamsBuilder;
//!
//! let params = ParamsBuilder::new()
//!     .combine("mips", [1u32, 5])
//!     .combine("samples", [1u32, 4])
//!     .unless(|&(mips, samples)| samples > 1 && mips > 1)
//!     .begin_subcases()
//!     .expand("layers", |&(_, samples)| if samples > 1 { vec![1u32] } else { vec![1, 7] });
//!
//! let all: Vec<_> = params.iter().collect();
//! assert_eq!(all, vec![(1, 1, 1), (1, 1, 7), (1, 4, 1), (5, 1, 1), (5, 1, 7)]);
//! assert_eq!(params.case_key(&all[1]), "mips=1;samples=1");
//! assert_eq!(params.subcase_key(&all[1]), "layers=7");
//! ```

pub mod builder;
pub mod tuple;

pub use builder::{Cases, ParamsBuilder, Subcases};
pub use tuple::{Append, ParamValues};
