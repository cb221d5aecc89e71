//! Doctor display-name resolution

mod resolver;

pub use resolver::{DoctorName, DoctorResolver, LOADING_PLACEHOLDER};
