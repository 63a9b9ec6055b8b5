//! Numerical routines shared by the analysis engines.

pub mod ols;
