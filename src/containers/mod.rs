//! Persisted containers
//!
//! Each container owns an in-memory storage and a persister obtained from
//! its policy. Mutations are persisted first and applied only on success.
//! Reads never touch the persister.

mod bound;
mod dictionary;
mod errors;
mod matrix;
mod vector;

pub use dictionary::{Dictionary, DictionaryMutation, DictionaryStorage, OneToOne};
pub use errors::{StorageError, StorageResult};
pub use matrix::{
    Axis, AxisView, ByCol, ByRow, Cols, Line, ManyToMany, Matrix, MatrixMutation, MatrixStorage,
    Rows,
};
pub use vector::{Vector, VectorMutation, VectorStorage};
